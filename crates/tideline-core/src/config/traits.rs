//! Core configuration traits for the Tideline configuration system

use crate::TidelineError;
use std::path::Path;

/// Core trait for Tideline configuration types
pub trait TidelineConfig: Clone + Default + 'static {
    /// Error type for configuration operations
    type Error: Into<TidelineError> + From<TidelineError>;

    /// Get default configuration values
    fn defaults() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> Result<Self, Self::Error>;

    /// Merge with environment variables
    fn merge_with_env(&mut self) -> Result<(), Self::Error>;

    /// Merge with another configuration
    fn merge_with(&mut self, other: &Self) -> Result<(), Self::Error>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), Self::Error>;

    /// Set a configuration value from a dotted key (for CLI parsing)
    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<(), TidelineError>;
}

/// Parse a raw config value, naming the key on failure.
pub(crate) fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, TidelineError> {
    value
        .trim()
        .parse()
        .map_err(|_| TidelineError::config(format!("Invalid value for {key}: {value:?}")))
}

/// Require a strictly positive numeric setting.
pub(crate) fn require_positive(key: &str, value: u64) -> Result<(), TidelineError> {
    if value == 0 {
        return Err(TidelineError::config(format!("{key} must be positive")));
    }
    Ok(())
}
