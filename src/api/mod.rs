pub mod client;

pub use client::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::MessageEntry;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("API error{}: {message}", .code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default())]
    Rejected { message: String, code: Option<String> },
    #[error("Deserialization failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Response wrapper used by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
            error_code: code,
        }
    }

    /// Unwraps the payload, turning `ok: false` into [`ApiError::Rejected`].
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.ok {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected {
                message: self.error.unwrap_or_else(|| "unknown error".to_string()),
                code: self.error_code,
            })
        }
    }
}

/// Remote message catalog and connectivity probe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// `GET /health`; any 2xx is healthy.
    async fn health(&self) -> Result<(), ApiError>;
    /// `GET /api/messages`. A payload that is not an array yields an empty catalog.
    async fn fetch_messages(&self) -> Result<Vec<MessageEntry>, ApiError>;
    /// `PUT /api/messages/{code}`; returns the stored entry.
    async fn put_message(&self, entry: &MessageEntry) -> Result<MessageEntry, ApiError>;
    /// `DELETE /api/messages/{code}`.
    async fn delete_message(&self, code: &str) -> Result<(), ApiError>;
}
