// Process-wide settings, passed explicitly to the store, pass and loop

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HIDE_LIST_KEY: &str = "jsa-hide-list";
pub const DEFAULT_THROTTLE_MS: u64 = 300;
pub const DEFAULT_CLEAR_CONFIRMATION: &str = "Yes, clear the list";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the single persisted value holding the hide list
    pub hide_list_key: String,

    /// Mutation throttle window in milliseconds
    pub throttle_ms: u64,

    /// Log every append with the full persisted value, and every pass result
    pub debug: bool,

    /// SQLite file backing the value store
    pub database: PathBuf,

    /// Phrase the user must type to clear the hide list
    pub clear_confirmation: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hide_list_key: DEFAULT_HIDE_LIST_KEY.to_string(),
            throttle_ms: DEFAULT_THROTTLE_MS,
            debug: false,
            database: PathBuf::from("jsa.db"),
            clear_confirmation: DEFAULT_CLEAR_CONFIRMATION.to_string(),
        }
    }
}

impl Config {
    /// Load settings from an optional JSON file, then apply `JSA_*` env overrides.
    ///
    /// Missing fields in the file keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text)?
            }
            None => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process env in `load`)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("JSA_DATABASE") {
            self.database = PathBuf::from(db);
        }
        if let Some(key) = lookup("JSA_HIDE_LIST_KEY") {
            if key.is_empty() {
                return Err(Error::Config("JSA_HIDE_LIST_KEY must not be empty".into()));
            }
            self.hide_list_key = key;
        }
        if let Some(ms) = lookup("JSA_THROTTLE_MS") {
            self.throttle_ms = ms
                .parse()
                .map_err(|_| Error::Config(format!("JSA_THROTTLE_MS is not a number: {ms}")))?;
        }
        if let Some(flag) = lookup("JSA_DEBUG") {
            self.debug = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_userscript_constants() {
        let config = Config::default();
        assert_eq!(config.hide_list_key, "jsa-hide-list");
        assert_eq!(config.throttle(), Duration::from_millis(300));
        assert_eq!(config.clear_confirmation, "Yes, clear the list");
        assert!(!config.debug);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"debug": true}"#).unwrap();
        assert!(config.debug);
        assert_eq!(config.throttle_ms, 300);
        assert_eq!(config.hide_list_key, "jsa-hide-list");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JSA_DATABASE", "/tmp/other.db"),
            ("JSA_THROTTLE_MS", "50"),
            ("JSA_DEBUG", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.throttle_ms, 50);
        assert!(config.debug);
    }

    #[test]
    fn test_bad_throttle_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|name| {
            (name == "JSA_THROTTLE_MS").then(|| "fast".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jsa.json");
        std::fs::write(&path, r#"{"hide_list_key": "custom-key", "throttle_ms": 120}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.hide_list_key, "custom-key");
        assert_eq!(config.throttle_ms, 120);
    }
}
