use std::fmt;

use serde::{Deserialize, Serialize};

/// Rendering surface for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Transient, auto-dismissing notification.
    Toast,
    /// Modal, user-dismissed notification.
    Alert,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Toast => "toast",
            MessageKind::Alert => "alert",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Toast severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A backend catalog record. Identity is `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub code: String,
    pub kind: MessageKind,
    pub text: String,
}

impl MessageEntry {
    pub fn new(code: impl Into<String>, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind,
            text: text.into(),
        }
    }

    pub fn toast(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(code, MessageKind::Toast, text)
    }

    pub fn alert(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(code, MessageKind::Alert, text)
    }
}

/// Codes are uppercase ASCII letters, digits and underscores, e.g. `ORDER_SAVED_2`.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastMessage {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Catalog text carries no severity; only local defaults and the
    /// unknown-code fallback set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl ToastMessage {
    /// Splits catalog text on the first newline into title and description.
    pub fn from_catalog_text(text: &str) -> Self {
        let (title, description) = match text.split_once('\n') {
            Some((title, rest)) if !rest.is_empty() => (title, Some(rest.to_string())),
            Some((title, _)) => (title, None),
            None => (text, None),
        };

        Self {
            title: title.strip_suffix('\r').unwrap_or(title).to_string(),
            description,
            severity: None,
        }
    }
}

/// Output of resolution. Recomputed on every call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedMessage {
    Toast(ToastMessage),
    Alert { body_text: String },
}

impl ResolvedMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ResolvedMessage::Toast(_) => MessageKind::Toast,
            ResolvedMessage::Alert { .. } => MessageKind::Alert,
        }
    }

    /// Title for toasts, body for alerts.
    pub fn headline(&self) -> &str {
        match self {
            ResolvedMessage::Toast(toast) => &toast.title,
            ResolvedMessage::Alert { body_text } => body_text,
        }
    }
}
