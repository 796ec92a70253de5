use url::Url;
use crate::error::{Result, LyriqError};

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an http(s) URL string
    pub fn validate_url(url: &str, field_name: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| {
            LyriqError::Validation(format!("Invalid {} URL '{}': {}", field_name, url, e))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LyriqError::Validation(format!(
                "{} URL must use http or https, got: {}",
                field_name, url
            )));
        }
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(LyriqError::Validation(format!(
                "{} must be between {} and {}, got {}",
                field_name, min, max, value
            )));
        }
        Ok(())
    }

    /// The empty-line placeholder must print as something.
    pub fn validate_none_char(none_char: &str) -> Result<()> {
        if none_char.is_empty() {
            return Err(LyriqError::Validation(
                "none_char must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
