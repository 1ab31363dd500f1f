//! Admin configuration

use groom_client::ClientConfig;
use shared::{AppError, AppResult};

/// Admin engine configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | GROOM_API_URL | (required) | Backend project URL |
/// | GROOM_API_KEY | - | Public API key |
/// | GROOM_ACCESS_TOKEN | - | Operator access token |
/// | REQUEST_TIMEOUT_SECS | 30 | HTTP timeout |
/// | ROWS_PER_PAGE | 25 | Breeds per matrix page |
/// | STATION_WINDOW | 6 | Station columns shown at once |
/// | LOG_LEVEL | info | Log filter |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | - | Directory for rolling log files |
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub rows_per_page: u32,
    pub station_window: usize,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl AdminConfig {
    /// Load from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let api_url = lookup("GROOM_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::config("GROOM_API_URL is not set"))?;

        Ok(Self {
            api_url,
            api_key: lookup("GROOM_API_KEY"),
            access_token: lookup("GROOM_ACCESS_TOKEN"),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            rows_per_page: lookup("ROWS_PER_PAGE")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(25),
            station_window: lookup("STATION_WINDOW")
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: lookup("LOG_DIR").filter(|v| !v.is_empty()),
        })
    }

    /// Client settings for the persistence backend
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.api_url).with_timeout(self.request_timeout_secs);
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(token) = &self.access_token {
            config = config.with_access_token(token);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup(&[("GROOM_API_URL", "http://localhost:54321")])).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.rows_per_page, 25);
        assert_eq!(config.station_window, 6);
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("GROOM_API_URL", "https://groom.example.co"),
            ("GROOM_API_KEY", "anon"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("ROWS_PER_PAGE", "0"),
            ("LOG_JSON", "true"),
            ("LOG_DIR", "/tmp/groom"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.rows_per_page, 25);
        assert!(config.log_json);

        let client = config.client_config();
        assert_eq!(client.timeout, 5);
        assert_eq!(client.bearer(), Some("anon"));
    }

    #[test]
    fn test_missing_url() {
        let err = AdminConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
