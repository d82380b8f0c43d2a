use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, Envelope, MessageApi};
use crate::messages::MessageEntry;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the portfolio backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>, ApiError> {
        let resp = request.send().await.map_err(transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;

        if !status.is_success() {
            // error responses may still carry an envelope with a better message
            if let Ok(env) = serde_json::from_str::<Envelope<Value>>(&body) {
                if !env.ok {
                    return env.into_result();
                }
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        let env: Envelope<Value> = serde_json::from_str(&body)?;
        env.into_result()
    }
}

fn transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Request(e)
    }
}

/// Keeps well-formed entries and drops the rest; a non-array payload is an empty catalog.
fn parse_catalog(data: Option<Value>) -> Vec<MessageEntry> {
    let items = match data {
        Some(Value::Array(items)) => items,
        other => {
            warn!("Malformed catalog response (expected array, got {}), treating as empty", describe(&other));
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MessageEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed catalog entry: {}", e);
                None
            }
        })
        .collect()
}

fn describe(value: &Option<Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[async_trait]
impl MessageApi for ApiClient {
    async fn health(&self) -> Result<(), ApiError> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }

    async fn fetch_messages(&self) -> Result<Vec<MessageEntry>, ApiError> {
        let data = self.send(self.client.get(self.url("/api/messages"))).await?;
        let entries = parse_catalog(data);
        debug!("Fetched {} catalog entries", entries.len());
        Ok(entries)
    }

    async fn put_message(&self, entry: &MessageEntry) -> Result<MessageEntry, ApiError> {
        let url = self.url(&format!("/api/messages/{}", entry.code));
        let data = self.send(self.client.put(url).json(entry)).await?;
        match data {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => {
                debug!("PUT {} returned no entry, keeping submitted value", entry.code);
                Ok(entry.clone())
            }
        }
    }

    async fn delete_message(&self, code: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/messages/{}", code));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}
