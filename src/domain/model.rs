use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// IPC7351 密度等級
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Least,
    Most,
    Nominal,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Least, Variant::Most, Variant::Nominal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Least => "least",
            Variant::Most => "most",
            Variant::Nominal => "nominal",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Variant::Least => "Least",
            Variant::Most => "Most",
            Variant::Nominal => "Nominal",
        }
    }

    pub fn default_url(&self) -> String {
        format!("http://www.freepcb.com/downloads/ipc7351_{}.zip", self.as_str())
    }

    pub fn default_archive(&self) -> PathBuf {
        PathBuf::from(format!("ipc7351_{}.zip", self.as_str()))
    }

    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(format!("IPC7351-{}.pretty", self.title()))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "least" | "l" => Ok(Variant::Least),
            "most" | "m" => Ok(Variant::Most),
            "nominal" | "n" => Ok(Variant::Nominal),
            other => Err(format!("unknown variant '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    #[default]
    None,
    All,
    #[serde(rename = "all-but-1")]
    AllButPin1,
}

/// 一個變體的下載來源與輸出位置
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSource {
    pub variant: Variant,
    pub url: String,
    pub archive: PathBuf,
    pub output: PathBuf,
}

impl VariantSource {
    pub fn with_defaults(variant: Variant) -> Self {
        Self {
            variant,
            url: variant.default_url(),
            archive: variant.default_archive(),
            output: variant.default_output(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionOptions {
    pub threedmap: Option<PathBuf>,
    pub rounded_pad_exceptions: Option<PathBuf>,
    pub rounded_center_exceptions: Option<PathBuf>,
    pub courtyard_mm: Option<f64>,
    pub rounding: RoundingMode,
    pub hash_time: bool,
    pub strip_lmn: bool,
    pub confirm_license: bool,
}

#[derive(Debug, Clone)]
pub struct TargetReport {
    pub name: String,
    pub output: PathBuf,
    pub items: usize,
    pub duration: Duration,
}
