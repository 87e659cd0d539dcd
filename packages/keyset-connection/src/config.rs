use crate::defaults;
use serde::Deserialize;

/// Per-field tunables for the connection engine.
///
/// List fields that need larger windows (e.g. event feeds spanning wide
/// date ranges) construct their own config instead of mutating the
/// defaults.
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Page size applied when the caller supplies neither `first` nor `last`.
    #[serde(default = "ConnectionConfig::default_page_size")]
    pub default_page_size: i32,
    /// Maximum accepted value for `first` and `last`.
    #[serde(default = "ConnectionConfig::max_page_size")]
    pub max_page_size: i32,
}

impl ConnectionConfig {
    fn default_page_size() -> i32 {
        defaults::DEFAULT_PAGE_SIZE
    }

    fn max_page_size() -> i32 {
        defaults::MAX_PAGE_SIZE
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_page_size: defaults::DEFAULT_PAGE_SIZE,
            max_page_size: defaults::MAX_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ConnectionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_page_size, defaults::DEFAULT_PAGE_SIZE);
        assert_eq!(config.max_page_size, defaults::MAX_PAGE_SIZE);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"default_page_size": 25, "max_page_size": 1000}"#)
                .unwrap();
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 1000);
    }
}
