//! Client configuration

use crate::{ClientResult, RestClient};

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL (e.g., "https://project.example.co")
    pub base_url: String,

    /// Public API key, sent as the `apikey` header
    pub api_key: Option<String>,

    /// Access token of the signed-in operator; falls back to the API key
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Path prefix of the table endpoints
    pub rest_path: String,

    /// Path prefix of the remote functions
    pub functions_path: String,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            access_token: None,
            timeout: 30,
            rest_path: "rest/v1".to_string(),
            functions_path: "functions/v1".to_string(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Override the table and function path prefixes
    pub fn with_paths(mut self, rest: impl Into<String>, functions: impl Into<String>) -> Self {
        self.rest_path = rest.into();
        self.functions_path = functions.into();
        self
    }

    /// Token sent in the `Authorization` header
    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().or(self.api_key.as_deref())
    }

    /// URL of a table endpoint
    pub fn table_url(&self, table: &str) -> String {
        join_url(&self.base_url, &self.rest_path, table)
    }

    /// URL of a remote function
    pub fn function_url(&self, name: &str) -> String {
        join_url(&self.base_url, &self.functions_path, name)
    }

    /// Create a REST client from this configuration
    pub fn build_rest_client(&self) -> ClientResult<RestClient> {
        RestClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321")
    }
}

fn join_url(base: &str, prefix: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", base, name)
    } else {
        format!("{}/{}/{}", base, prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = ClientConfig::new("https://groom.example.co/");
        assert_eq!(
            config.table_url("breeds"),
            "https://groom.example.co/rest/v1/breeds"
        );
        assert_eq!(
            config.function_url("send-templated-message"),
            "https://groom.example.co/functions/v1/send-templated-message"
        );

        let config = config.with_paths("", "/fn/");
        assert_eq!(config.table_url("stations"), "https://groom.example.co/stations");
        assert_eq!(config.function_url("x"), "https://groom.example.co/fn/x");
    }

    #[test]
    fn test_bearer_prefers_access_token() {
        let config = ClientConfig::default().with_api_key("anon");
        assert_eq!(config.bearer(), Some("anon"));
        let config = config.with_access_token("jwt");
        assert_eq!(config.bearer(), Some("jwt"));
        assert_eq!(ClientConfig::default().bearer(), None);
    }
}
