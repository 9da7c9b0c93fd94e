use crate::utils::error::{PcbLibError, Result};
use regex::Regex;
use std::path::Path;

/// 例外清單：每行一個正規表示式，只從名稱開頭比對
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    pub fn parse(source_name: &str, text: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let regex = Regex::new(&format!("^(?:{})", line)).map_err(|source| {
                PcbLibError::PatternError {
                    file: source_name.to_string(),
                    source,
                }
            })?;
            patterns.push(regex);
        }
        Ok(Self { patterns })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| PcbLibError::filesystem(path, e))?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// Load `path` if given, otherwise an empty list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
