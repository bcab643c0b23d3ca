//! Runtime configuration sourced from the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::inpaint::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Fallback variable for the API key.
pub const API_KEY_FALLBACK_VAR: &str = "API_KEY";

/// Settings for the inpainting client and local storage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the generation API. `None` makes every processing attempt fail.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// API root URL.
    pub base_url: String,
    /// Optional request timeout; requests wait indefinitely when unset.
    pub timeout: Option<Duration>,
    /// Directory holding persisted history.
    pub data_dir: PathBuf,
    /// Directory downloads are written to.
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            data_dir: default_data_dir(),
            download_dir: default_download_dir(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout = get("MARK_VANISH_TIMEOUT_SECS").and_then(|v| match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => {
                tracing::warn!("ignoring invalid MARK_VANISH_TIMEOUT_SECS={v:?}");
                None
            }
        });

        Self {
            api_key: get(API_KEY_VAR).or_else(|| get(API_KEY_FALLBACK_VAR)),
            model: get("MARK_VANISH_MODEL").unwrap_or(defaults.model),
            base_url: get("MARK_VANISH_BASE_URL").unwrap_or(defaults.base_url),
            timeout,
            data_dir: get("MARK_VANISH_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            download_dir: get("MARK_VANISH_DOWNLOAD_DIR")
                .map_or(defaults.download_dir, PathBuf::from),
        }
    }

    /// Whether a credential is available.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mark-vanish")
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(!config.has_api_key());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.timeout.is_none());
        assert!(config.data_dir.ends_with("mark-vanish"));
    }

    #[test]
    fn gemini_key_takes_precedence_over_fallback() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g"), ("API_KEY", "a")]));
        assert_eq!(config.api_key.as_deref(), Some("g"));

        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", " "), ("API_KEY", "a")]));
        assert_eq!(config.api_key.as_deref(), Some("a"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("MARK_VANISH_MODEL", "other-model"),
            ("MARK_VANISH_BASE_URL", "http://localhost:1234"),
            ("MARK_VANISH_DATA_DIR", "/tmp/mv-data"),
            ("MARK_VANISH_DOWNLOAD_DIR", "/tmp/mv-out"),
            ("MARK_VANISH_TIMEOUT_SECS", "90"),
        ]));
        assert_eq!(config.model, "other-model");
        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mv-data"));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/mv-out"));
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn invalid_timeout_is_ignored() {
        let config = Config::from_lookup(lookup(&[("MARK_VANISH_TIMEOUT_SECS", "soon")]));
        assert!(config.timeout.is_none());
        let config = Config::from_lookup(lookup(&[("MARK_VANISH_TIMEOUT_SECS", "0")]));
        assert!(config.timeout.is_none());
    }
}
