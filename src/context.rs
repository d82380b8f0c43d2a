use std::sync::Arc;

use tracing::info;

use crate::api::{ApiClient, ApiError, MessageApi};
use crate::config::Settings;
use crate::messages::{
    LoadOutcome, MessageCatalogCache, MessageEditor, MessageKind, MessageResolver, ResolvedMessage,
};
use crate::mode::{self, Mode, ModeFlag};
use crate::storage::{SledStorage, Storage, StorageError};

/// Everything the message subsystem needs, wired once and passed around.
///
/// Independent instances share nothing, so each test (or tenant) can build its own.
#[derive(Clone)]
pub struct MessageCenter {
    pub mode: Arc<ModeFlag>,
    pub cache: Arc<MessageCatalogCache>,
    pub resolver: MessageResolver,
    pub editor: Arc<MessageEditor>,
    api: Arc<dyn MessageApi>,
}

impl MessageCenter {
    pub fn new(storage: Arc<dyn Storage>, api: Arc<dyn MessageApi>, settings: &Settings) -> Self {
        let mode = Arc::new(ModeFlag::new(Arc::clone(&storage)));
        let cache = Arc::new(
            MessageCatalogCache::new(Arc::clone(&mode), Arc::clone(&api), storage)
                .with_ttl(settings.catalog_ttl())
                .with_fetch_timeout(settings.api_timeout()),
        );
        let resolver = MessageResolver::new(Arc::clone(&mode), Arc::clone(&cache));
        let editor = Arc::new(MessageEditor::new(
            Arc::clone(&mode),
            Arc::clone(&api),
            Arc::clone(&cache),
        ));

        Self {
            mode,
            cache,
            resolver,
            editor,
            api,
        }
    }

    /// Opens the on-disk store and HTTP client described by `settings`.
    pub fn open(settings: &Settings) -> Result<Self, OpenError> {
        let storage: Arc<dyn Storage> = Arc::new(SledStorage::open(&settings.storage.path)?);
        let api: Arc<dyn MessageApi> =
            Arc::new(ApiClient::new(settings.api.base_url.clone(), settings.api_timeout())?);
        Ok(Self::new(storage, api, settings))
    }

    pub fn api(&self) -> &Arc<dyn MessageApi> {
        &self.api
    }

    /// Switches modes, probing the backend before API mode is trusted.
    ///
    /// Returns the toast code describing the result, ready for [`resolve`](Self::resolve).
    pub async fn switch_mode(&self, next: Mode) -> &'static str {
        match next {
            Mode::Mock => {
                self.mode.set_mode(Mode::Mock);
                self.cache.load().await;
                "MOCK_MODE_ENABLED"
            }
            Mode::Api => match mode::activate_api(&self.mode, self.api.as_ref()).await {
                Ok(()) => {
                    let outcome = self.cache.load().await;
                    info!("API mode active, catalog: {:?}", outcome);
                    "API_CONNECTED"
                }
                Err(_) => "API_UNAVAILABLE",
            },
        }
    }

    /// Startup hook: brings the catalog in line with the persisted mode.
    pub async fn start(&self) -> LoadOutcome {
        self.cache.load().await
    }

    pub fn resolve(&self, code: &str, kind: MessageKind) -> ResolvedMessage {
        self.resolver.resolve(code, kind)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
