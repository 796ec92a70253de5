use std::env;
use std::path::PathBuf;
use crate::error::{Result, LyriqError};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const API_URL: &'static str = "LYRIQ_API_URL";
    pub const DUMPS_URL: &'static str = "LYRIQ_DUMPS_URL";
    pub const DUMPS_DOWNLOAD_URL: &'static str = "LYRIQ_DUMPS_DOWNLOAD_URL";
    pub const CACHE_DIR: &'static str = "LYRIQ_CACHE_DIR";
    pub const NONE_CHAR: &'static str = "LYRIQ_NONE_CHAR";
    pub const REQUEST_TIMEOUT_SECONDS: &'static str = "LYRIQ_REQUEST_TIMEOUT_SECONDS";
    pub const DUMPS_CACHE_TTL_SECONDS: &'static str = "LYRIQ_DUMPS_CACHE_TTL_SECONDS";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as string with validation
    pub fn parse_string(var_name: &str, validator: Option<fn(&str) -> Result<()>>) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(LyriqError::Validation(format!(
                    "Environment variable {} contains invalid UTF-8",
                    var_name
                )))
            }
        }
    }

    /// Raw value, untrimmed. Used where surrounding whitespace is meaningful.
    pub fn parse_raw(var_name: &str) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(LyriqError::Validation(format!(
                "Environment variable {} contains invalid UTF-8",
                var_name
            ))),
        }
    }

    pub fn parse_path(var_name: &str) -> Result<Option<PathBuf>> {
        Ok(Self::parse_string(var_name, None)?.map(PathBuf::from))
    }

    /// Parse environment variable as u64 with range validation
    pub fn parse_u64(var_name: &str, min: u64, max: u64) -> Result<Option<u64>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            let value = value_str.parse::<u64>().map_err(|_| {
                LyriqError::Validation(format!(
                    "Invalid number in {}: '{}'. Must be a positive integer",
                    var_name, value_str
                ))
            })?;

            if value < min || value > max {
                return Err(LyriqError::Validation(format!(
                    "Value in {} must be between {} and {}, got {}",
                    var_name, min, max, value
                )));
            }

            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Get all LYRIQ environment variables for debugging
    pub fn get_all_lyriq_vars() -> Vec<(String, String)> {
        env::vars()
            .filter(|(key, _)| key.starts_with("LYRIQ_"))
            .collect()
    }
}
