// groom-client/src/rest.rs
// HTTP backend speaking PostgREST conventions

use crate::persistence::Persistence;
use crate::query::{Filter, Select, filter_pairs};
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;

const PREFER_RETURN: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

/// REST client for the hosted table API and remote functions
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    config: ClientConfig,
}

impl RestClient {
    /// Create a new REST client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Get the configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.config.api_key {
            request = request.header("apikey", key);
        }
        if let Some(token) = self.config.bearer() {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        request
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &self.config.table_url(table))
    }

    /// Send a request and read the body as JSON (`null` when empty)
    async fn send(request: RequestBuilder) -> ClientResult<Value> {
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_status(status, text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_rows(request: RequestBuilder) -> ClientResult<Vec<Value>> {
        into_rows(Self::send(request).await?)
    }
}

/// Table endpoints answer with an array; an object is a single row
fn into_rows(value: Value) -> ClientResult<Vec<Value>> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row @ Value::Object(_) => Ok(vec![row]),
        other => Err(ClientError::InvalidResponse(format!(
            "Expected rows, got {}",
            other
        ))),
    }
}

#[async_trait]
impl Persistence for RestClient {
    async fn select(&self, query: &Select) -> ClientResult<Vec<Value>> {
        tracing::debug!(table = %query.table, filters = query.filters.len(), "select");
        let request = self
            .table(Method::GET, &query.table)
            .query(&query.to_query_pairs());
        Self::send_rows(request).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> ClientResult<Vec<Value>> {
        tracing::debug!(table, rows = rows.len(), "insert");
        let request = self
            .table(Method::POST, table)
            .header("Prefer", PREFER_RETURN)
            .json(&rows);
        Self::send_rows(request).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> ClientResult<Vec<Value>> {
        tracing::debug!(table, filters = filters.len(), "update");
        let request = self
            .table(Method::PATCH, table)
            .query(&filter_pairs(filters))
            .header("Prefer", PREFER_RETURN)
            .json(&patch);
        Self::send_rows(request).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_keys: &[&str],
    ) -> ClientResult<Vec<Value>> {
        tracing::debug!(table, rows = rows.len(), "upsert");
        let mut request = self.table(Method::POST, table).header("Prefer", PREFER_UPSERT);
        if !conflict_keys.is_empty() {
            request = request.query(&[("on_conflict", conflict_keys.join(","))]);
        }
        Self::send_rows(request.json(&rows)).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> ClientResult<u64> {
        tracing::debug!(table, filters = filters.len(), "delete");
        let request = self
            .table(Method::DELETE, table)
            .query(&filter_pairs(filters))
            .header("Prefer", PREFER_RETURN);
        let rows = Self::send_rows(request).await?;
        Ok(rows.len() as u64)
    }

    async fn invoke(&self, function: &str, payload: Value) -> ClientResult<Value> {
        tracing::debug!(function, "invoke");
        let request = self
            .request(Method::POST, &self.config.function_url(function))
            .json(&payload);
        Self::send(request).await.map_err(|e| match e {
            ClientError::Http(_) | ClientError::Serialization(_) => e,
            other => ClientError::Function {
                function: function.to_string(),
                message: other.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_rows() {
        assert_eq!(into_rows(Value::Null).unwrap(), Vec::<Value>::new());
        assert_eq!(into_rows(json!({"id": 1})).unwrap().len(), 1);
        assert_eq!(into_rows(json!([{"id": 1}, {"id": 2}])).unwrap().len(), 2);
        assert!(into_rows(json!(5)).is_err());
    }

    #[test]
    fn test_new_client() {
        let config = ClientConfig::new("http://localhost:54321").with_timeout(5);
        let client = RestClient::new(&config).unwrap();
        assert_eq!(client.config().timeout, 5);
    }
}
