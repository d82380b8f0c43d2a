use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::cache::MessageCatalogCache;
use super::types::{is_valid_code, MessageEntry};
use crate::api::{ApiError, MessageApi};
use crate::mode::{Mode, ModeFlag};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Invalid message code {0:?}: use uppercase letters, digits and underscores")]
    InvalidCode(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Backend accepted the change and the cache reflects it.
    Applied(Option<MessageEntry>),
    /// MOCK mode: nothing was sent and the cache is untouched.
    Simulated,
}

impl EditOutcome {
    /// Toast code the presentation layer should show for a successful save.
    pub fn saved_notice(&self) -> &'static str {
        match self {
            EditOutcome::Applied(_) => "MESSAGE_SAVED",
            EditOutcome::Simulated => "MOCK_MODE_WARNING",
        }
    }

    /// Toast code the presentation layer should show for a successful delete.
    pub fn deleted_notice(&self) -> &'static str {
        match self {
            EditOutcome::Applied(_) => "MESSAGE_DELETED",
            EditOutcome::Simulated => "MOCK_MODE_WARNING",
        }
    }
}

/// Edits the remote catalog and patches the local cache once the backend confirms.
///
/// Has no UI awareness: callers decide what to show from the returned outcome.
pub struct MessageEditor {
    mode: Arc<ModeFlag>,
    api: Arc<dyn MessageApi>,
    cache: Arc<MessageCatalogCache>,
}

impl MessageEditor {
    pub fn new(mode: Arc<ModeFlag>, api: Arc<dyn MessageApi>, cache: Arc<MessageCatalogCache>) -> Self {
        Self { mode, api, cache }
    }

    pub async fn save(&self, entry: MessageEntry) -> Result<EditOutcome, EditorError> {
        if !is_valid_code(&entry.code) {
            return Err(EditorError::InvalidCode(entry.code));
        }
        if self.mode.get_mode() == Mode::Mock {
            info!("MOCK mode: edit of {} not sent to backend", entry.code);
            return Ok(EditOutcome::Simulated);
        }

        let stored = self.api.put_message(&entry).await?;
        self.cache.upsert(stored.clone());
        info!("Message {} saved ({})", stored.code, stored.kind);
        Ok(EditOutcome::Applied(Some(stored)))
    }

    pub async fn delete(&self, code: &str) -> Result<EditOutcome, EditorError> {
        if !is_valid_code(code) {
            return Err(EditorError::InvalidCode(code.to_string()));
        }
        if self.mode.get_mode() == Mode::Mock {
            info!("MOCK mode: delete of {} not sent to backend", code);
            return Ok(EditOutcome::Simulated);
        }

        self.api.delete_message(code).await?;
        self.cache.remove(code);
        info!("Message {} deleted", code);
        Ok(EditOutcome::Applied(None))
    }
}
