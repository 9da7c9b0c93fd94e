use crate::utils::error::{PcbLibError, Result};

/// 逐行讀取 FreePCB 的 `key: value` 文字格式
///
/// The reader keeps the remaining lines on a stack so that `peek_key` and
/// `indent_level` can look at the next line without consuming it. Line numbers
/// are 1-based and refer to the line most recently returned by `next_entry`.
pub struct FreePcbReader {
    source_name: String,
    lines: Vec<(usize, String)>,
    last_line: usize,
}

impl FreePcbReader {
    pub fn new(source_name: impl Into<String>, text: &str) -> Self {
        let mut lines: Vec<(usize, String)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end().to_string()))
            .collect();
        lines.reverse();
        Self {
            source_name: source_name.into(),
            lines,
            last_line: 0,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Line number of the entry most recently consumed.
    pub fn line(&self) -> usize {
        self.last_line
    }

    fn skip_blank(&mut self) {
        while matches!(self.lines.last(), Some((_, l)) if l.trim().is_empty()) {
            self.lines.pop();
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_blank();
        self.lines.is_empty()
    }

    /// 兩個空白或一個 tab 的一半算一層
    pub fn indent_level(&mut self) -> usize {
        self.skip_blank();
        let Some((_, line)) = self.lines.last() else {
            return 0;
        };
        let mut half_indents = 0;
        for c in line.chars() {
            match c {
                '\t' => half_indents += 2,
                ' ' => half_indents += 1,
                _ => break,
            }
        }
        half_indents / 2
    }

    pub fn peek_key(&mut self) -> Option<&str> {
        self.skip_blank();
        self.lines.last().map(|(_, line)| match line.split_once(':') {
            Some((key, _)) => key.trim(),
            None => line.trim(),
        })
    }

    /// Consume the next `key: value` line.
    pub fn next_entry(&mut self, allow_blank: bool) -> Result<(String, String)> {
        self.skip_blank();
        let Some((lineno, line)) = self.lines.pop() else {
            return Err(self.error("unexpected end of file"));
        };
        self.last_line = lineno;

        let (key, value) = line.split_once(':').unwrap_or((line.as_str(), ""));
        let key = key.trim().to_string();
        let mut value = value.trim().to_string();
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            value = parse_string(&value).0;
        }
        if value.is_empty() && !allow_blank {
            return Err(self.error("expected value"));
        }

        Ok((key, value))
    }

    pub fn error(&self, message: impl Into<String>) -> PcbLibError {
        PcbLibError::ParseError {
            source_name: self.source_name.clone(),
            line: self.last_line,
            message: message.into(),
        }
    }
}

/// Split a leading, possibly quoted, string off `s`.
///
/// Returns the string and the number of bytes consumed, including the
/// separator (unquoted) or the closing quote and trailing whitespace (quoted).
pub fn parse_string(s: &str) -> (String, usize) {
    let Some(rest) = s.strip_prefix('"') else {
        let token = s.split(' ').next().unwrap_or("");
        return (token.trim().to_string(), token.len() + 1);
    };

    match rest.find('"') {
        None => (rest.to_string(), s.len()),
        Some(end) => {
            let beyond = &rest[end + 1..];
            let garbage = beyond.len() - beyond.trim_start().len();
            (rest[..end].to_string(), end + 2 + garbage)
        }
    }
}
