use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcbLibError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Download of {url} failed with HTTP status {status}")]
    HttpStatusError { url: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Filesystem error on {}: {source}", path.display())]
    FilesystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter `{command}` exited with {status}")]
    ConverterExitError { command: String, status: String },

    #[error("Conversion error: {message}")]
    ConversionError { message: String },

    #[error("{source_name}: line {line}: {message}")]
    ParseError {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("3D map (line {line}): {message}")]
    ThreeDMapError { line: usize, message: String },

    #[error("Invalid pattern in {file}: {source}")]
    PatternError {
        file: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("License not accepted")]
    LicenseDeclined,

    #[error("Could not read the license answer: {message}")]
    LicensePromptError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Filesystem,
    Conversion,
    Input,
    Configuration,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PcbLibError {
    pub fn filesystem(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        PcbLibError::FilesystemError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn conversion<S: Into<String>>(message: S) -> Self {
        PcbLibError::ConversionError {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        PcbLibError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PcbLibError::NetworkError(_) | PcbLibError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            PcbLibError::IoError(_) | PcbLibError::FilesystemError { .. } => {
                ErrorCategory::Filesystem
            }
            PcbLibError::ConverterExitError { .. } | PcbLibError::ConversionError { .. } => {
                ErrorCategory::Conversion
            }
            PcbLibError::ZipError(_)
            | PcbLibError::ParseError { .. }
            | PcbLibError::ThreeDMapError { .. }
            | PcbLibError::PatternError { .. } => ErrorCategory::Input,
            PcbLibError::ConfigError { .. } | PcbLibError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            PcbLibError::LicenseDeclined | PcbLibError::LicensePromptError { .. } => {
                ErrorCategory::User
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::User => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Conversion | ErrorCategory::Input | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Filesystem => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check the archive URL and your connection, then run the target again"
            }
            ErrorCategory::Filesystem => {
                "Check permissions on the output directory and free disk space"
            }
            ErrorCategory::Conversion => {
                "Run the converter by hand with --verbose to see its output"
            }
            ErrorCategory::Input => {
                "Delete the cached archive so it is downloaded again, or fix the input file"
            }
            ErrorCategory::Configuration => "Fix the value in pcblib.toml and try again",
            ErrorCategory::User => {
                "Answer y to the FreePCB license prompt (it may be piped on stdin) or set converter.confirm_license = false"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PcbLibError::HttpStatusError { url, status } => {
                format!("Could not download {} (HTTP {})", url, status)
            }
            PcbLibError::NetworkError(e) => format!("Network problem: {}", e),
            PcbLibError::LicenseDeclined => {
                "The FreePCB license was not accepted; nothing was downloaded".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PcbLibError>;
