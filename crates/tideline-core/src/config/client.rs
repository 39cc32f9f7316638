//! Client engine configuration
//!
//! ```toml
//! [paging]
//! page_span_secs = 86400
//! max_page_scan = 30
//! load_more_batch = 10
//!
//! [display]
//! max_display_name_len = 25
//! default_avatar = "default-avatar.png"
//!
//! [cache]
//! max_idle_cells = 256
//!
//! [list]
//! overscan = 5
//! ```

use super::traits::{parse_value, require_positive, ConfigValidation, TidelineConfig};
use crate::TidelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables recognised by [`ClientConfig::merge_with_env`].
pub const ENV_PREFIX: &str = "TIDELINE_";

/// Dotted keys accepted by `set_from_string`.
const KEYS: &[&str] = &[
    "paging.page_span_secs",
    "paging.max_page_scan",
    "paging.load_more_batch",
    "display.max_display_name_len",
    "display.default_avatar",
    "cache.max_idle_cells",
    "list.overscan",
];

/// Timeline paging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Width of one page of the message timeline, in seconds
    pub page_span_secs: u64,
    /// Maximum number of empty pages skipped when searching for the next page
    pub max_page_scan: u32,
    /// Rows requested by one `load_more_rows` call
    pub load_more_batch: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_span_secs: 86_400,
            max_page_scan: 30,
            load_more_batch: 10,
        }
    }
}

impl ConfigValidation for PagingConfig {
    fn validate(&self) -> Result<(), TidelineError> {
        require_positive("paging.page_span_secs", self.page_span_secs)?;
        require_positive("paging.max_page_scan", u64::from(self.max_page_scan))?;
        require_positive("paging.load_more_batch", self.load_more_batch as u64)
    }
}

/// Presentation settings applied by view-models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Display names of this many characters or more are cut here and marked with `...`
    pub max_display_name_len: usize,
    /// Image shown until a user's profile resolves
    pub default_avatar: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_display_name_len: 25,
            default_avatar: "default-avatar.png".to_string(),
        }
    }
}

impl ConfigValidation for DisplayConfig {
    fn validate(&self) -> Result<(), TidelineError> {
        require_positive("display.max_display_name_len", self.max_display_name_len as u64)?;
        if self.default_avatar.trim().is_empty() {
            return Err(TidelineError::config("display.default_avatar cannot be empty"));
        }
        Ok(())
    }
}

/// Live cell cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Idle cells tolerated per registry before a sweep runs
    pub max_idle_cells: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_idle_cells: 256 }
    }
}

impl ConfigValidation for CacheConfig {
    fn validate(&self) -> Result<(), TidelineError> {
        require_positive("cache.max_idle_cells", self.max_idle_cells as u64)
    }
}

/// List synchronization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Rows kept alive on each side of the visible window
    pub overscan: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self { overscan: 5 }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeline paging
    pub paging: PagingConfig,
    /// Presentation
    pub display: DisplayConfig,
    /// Live cell cache
    pub cache: CacheConfig,
    /// List synchronization
    pub list: ListConfig,
}

impl ClientConfig {
    /// Parse a TOML document; missing sections and keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, TidelineError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `TIDELINE_<SECTION>_<KEY>` pairs from an arbitrary source.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<(), TidelineError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            let Some(rest) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let rest = rest.to_ascii_lowercase();
            if let Some(key) = KEYS
                .iter()
                .find(|key| key.replacen('.', "_", 1) == rest)
            {
                self.set_from_string(key, value.as_ref())?;
            } else {
                tracing::debug!(variable = name.as_ref(), "ignoring unknown config variable");
            }
        }
        Ok(())
    }
}

impl TidelineConfig for ClientConfig {
    type Error = TidelineError;

    fn load_from_file(path: &Path) -> Result<Self, Self::Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TidelineError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| TidelineError::config(format!("Invalid JSON: {e}"))),
            _ => Err(TidelineError::config("Unsupported file format")),
        }
    }

    fn merge_with_env(&mut self) -> Result<(), Self::Error> {
        self.merge_with_vars(std::env::vars())
    }

    fn merge_with(&mut self, other: &Self) -> Result<(), Self::Error> {
        let defaults = Self::default();
        if other.paging.page_span_secs != defaults.paging.page_span_secs {
            self.paging.page_span_secs = other.paging.page_span_secs;
        }
        if other.paging.max_page_scan != defaults.paging.max_page_scan {
            self.paging.max_page_scan = other.paging.max_page_scan;
        }
        if other.paging.load_more_batch != defaults.paging.load_more_batch {
            self.paging.load_more_batch = other.paging.load_more_batch;
        }
        if other.display.max_display_name_len != defaults.display.max_display_name_len {
            self.display.max_display_name_len = other.display.max_display_name_len;
        }
        if other.display.default_avatar != defaults.display.default_avatar {
            self.display.default_avatar = other.display.default_avatar.clone();
        }
        if other.cache.max_idle_cells != defaults.cache.max_idle_cells {
            self.cache.max_idle_cells = other.cache.max_idle_cells;
        }
        if other.list.overscan != defaults.list.overscan {
            self.list.overscan = other.list.overscan;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), Self::Error> {
        self.paging.validate()?;
        self.display.validate()?;
        self.cache.validate()
    }

    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        match key {
            "paging.page_span_secs" => self.paging.page_span_secs = parse_value(key, value)?,
            "paging.max_page_scan" => self.paging.max_page_scan = parse_value(key, value)?,
            "paging.load_more_batch" => self.paging.load_more_batch = parse_value(key, value)?,
            "display.max_display_name_len" => {
                self.display.max_display_name_len = parse_value(key, value)?;
            }
            "display.default_avatar" => self.display.default_avatar = value.to_string(),
            "cache.max_idle_cells" => self.cache.max_idle_cells = parse_value(key, value)?,
            "list.overscan" => self.list.overscan = parse_value(key, value)?,
            _ => {
                return Err(TidelineError::config(format!(
                    "Unknown configuration key: {key}"
                )))
            }
        }
        Ok(())
    }
}
