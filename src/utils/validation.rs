use crate::utils::error::{PcbLibError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(PcbLibError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PcbLibError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(PcbLibError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PcbLibError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PcbLibError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_clearance(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PcbLibError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Clearance must be a finite, non-negative number of millimetres".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PcbLibError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("ipc.least.url", "https://example.com/a.zip").is_ok());
        assert!(validate_url("ipc.least.url", "http://example.com/a.zip").is_ok());
        assert!(validate_url("ipc.least.url", "").is_err());
        assert!(validate_url("ipc.least.url", "invalid-url").is_err());
        assert!(validate_url("ipc.least.url", "ftp://example.com/a.zip").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("models3d.output", "3d").is_ok());
        assert!(validate_path("models3d.output", "").is_err());
        assert!(validate_path("models3d.output", "3d\0").is_err());
    }

    #[test]
    fn test_validate_clearance() {
        assert!(validate_clearance("converter.courtyard_mm", 0.25).is_ok());
        assert!(validate_clearance("converter.courtyard_mm", 0.0).is_ok());
        assert!(validate_clearance("converter.courtyard_mm", -0.1).is_err());
        assert!(validate_clearance("converter.courtyard_mm", f64::NAN).is_err());
    }
}
