use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::DriverError;

/// Key under which file-backed drivers expect their database path.
pub const PATH_KEY: &str = "path";

/// Opaque backend configuration consumed once by `Driver::init`.
/// Each backend documents the keys it reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriverConfig {
    values: BTreeMap<String, String>,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for an embedded database living at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new().with(PATH_KEY, path.as_ref().to_string_lossy())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, DriverError> {
        self.get(key)
            .ok_or_else(|| DriverError::Config(format!("missing key: {key}")))
    }

    /// Parse an optional value, failing if it is present but malformed.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, DriverError> {
        self.get(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| DriverError::Config(format!("invalid value for {key}: {raw}")))
            })
            .transpose()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DriverConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_sets_path_key() {
        let config = DriverConfig::from_path("/var/lib/app.db");
        assert_eq!(config.get(PATH_KEY), Some("/var/lib/app.db"));
    }

    #[test]
    fn require_missing_key_is_config_error() {
        let config = DriverConfig::new();
        assert!(config.is_empty());
        assert!(matches!(config.require("path"), Err(DriverError::Config(_))));
    }

    #[test]
    fn parsed_values() {
        let config: DriverConfig = [("busy_timeout_ms", "250"), ("bad", "x")].into_iter().collect();
        assert_eq!(config.get_parsed::<u64>("busy_timeout_ms").unwrap(), Some(250));
        assert_eq!(config.get_parsed::<u64>("absent").unwrap(), None);
        assert!(config.get_parsed::<u64>("bad").is_err());
    }

    #[test]
    fn later_values_override() {
        let config = DriverConfig::new().with("k", "a").with("k", "b");
        assert_eq!(config.get("k"), Some("b"));
    }
}
