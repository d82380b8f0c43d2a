use std::sync::Arc;

use super::cache::MessageCatalogCache;
use super::defaults::{alert_default, toast_default};
use super::types::{MessageEntry, MessageKind, ResolvedMessage, Severity, ToastMessage};
use crate::mode::{Mode, ModeFlag};

const UNKNOWN_PREFIX: &str = "Unknown message: ";

/// Maps a message code to display text.
///
/// Lookup order:
/// 1. backend catalog entry of the requested kind (API mode only);
/// 2. compiled-in default for the requested kind;
/// 3. `Unknown message: <code>`.
///
/// Total over any code and kind: never fails, never awaits.
#[derive(Clone)]
pub struct MessageResolver {
    mode: Arc<ModeFlag>,
    cache: Arc<MessageCatalogCache>,
}

impl MessageResolver {
    pub fn new(mode: Arc<ModeFlag>, cache: Arc<MessageCatalogCache>) -> Self {
        Self { mode, cache }
    }

    pub fn resolve(&self, code: &str, kind: MessageKind) -> ResolvedMessage {
        match kind {
            MessageKind::Toast => ResolvedMessage::Toast(self.resolve_toast(code)),
            MessageKind::Alert => ResolvedMessage::Alert {
                body_text: self.resolve_alert(code),
            },
        }
    }

    pub fn resolve_toast(&self, code: &str) -> ToastMessage {
        if let Some(entry) = self.catalog_entry(code, MessageKind::Toast) {
            return ToastMessage::from_catalog_text(&entry.text);
        }

        toast_default(code).unwrap_or_else(|| ToastMessage {
            title: format!("{}{}", UNKNOWN_PREFIX, code),
            description: None,
            severity: Some(Severity::Error),
        })
    }

    pub fn resolve_alert(&self, code: &str) -> String {
        if let Some(entry) = self.catalog_entry(code, MessageKind::Alert) {
            return entry.text;
        }

        match alert_default(code) {
            Some(body) => body.to_string(),
            None => format!("{}{}", UNKNOWN_PREFIX, code),
        }
    }

    /// Catalog entries count only in API mode and only when the kind matches.
    fn catalog_entry(&self, code: &str, kind: MessageKind) -> Option<MessageEntry> {
        if self.mode.get_mode() != Mode::Api {
            return None;
        }
        self.cache.get(code).filter(|entry| entry.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMessageApi;
    use crate::storage::{MemoryStorage, Storage};

    struct Setup {
        mode: Arc<ModeFlag>,
        cache: Arc<MessageCatalogCache>,
        resolver: MessageResolver,
    }

    fn setup(mode: Mode, catalog: Vec<MessageEntry>) -> Setup {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let flag = Arc::new(ModeFlag::new(Arc::clone(&storage)));
        flag.set_mode(mode);

        let mut api = MockMessageApi::new();
        api.expect_fetch_messages().returning(move || Ok(catalog.clone()));
        let cache = Arc::new(MessageCatalogCache::new(Arc::clone(&flag), Arc::new(api), storage));
        let resolver = MessageResolver::new(Arc::clone(&flag), Arc::clone(&cache));

        Setup { mode: flag, cache, resolver }
    }

    fn catalog() -> Vec<MessageEntry> {
        vec![
            MessageEntry::toast("MSG_SAVED", "Saved\nYour changes are stored"),
            MessageEntry::toast("MOCK_MODE_WARNING", "Backend says hi"),
            MessageEntry::alert("CONFIRM_CANCEL_ORDER", "Cancel it?\nThis cannot be undone."),
            MessageEntry::alert("SETTINGS_SAVED", "alert-kind entry for a toast code"),
        ]
    }

    #[tokio::test]
    async fn test_catalog_toast_in_api_mode() {
        let s = setup(Mode::Api, catalog());
        s.cache.force_refresh().await;

        let toast = s.resolver.resolve_toast("MSG_SAVED");
        assert_eq!(toast.title, "Saved");
        assert_eq!(toast.description.as_deref(), Some("Your changes are stored"));
    }

    #[tokio::test]
    async fn test_catalog_takes_precedence_over_defaults() {
        let s = setup(Mode::Api, catalog());
        s.cache.force_refresh().await;

        assert_eq!(s.resolver.resolve_toast("MOCK_MODE_WARNING").title, "Backend says hi");
    }

    #[tokio::test]
    async fn test_alert_keeps_whole_text() {
        let s = setup(Mode::Api, catalog());
        s.cache.force_refresh().await;

        assert_eq!(
            s.resolver.resolve("CONFIRM_CANCEL_ORDER", MessageKind::Alert),
            ResolvedMessage::Alert {
                body_text: "Cancel it?\nThis cannot be undone.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_kind_mismatch_falls_through_to_defaults() {
        let s = setup(Mode::Api, catalog());
        s.cache.force_refresh().await;

        let toast = s.resolver.resolve_toast("SETTINGS_SAVED");
        assert_eq!(toast, toast_default("SETTINGS_SAVED").unwrap());

        // toast-kind catalog entry requested as alert
        assert_eq!(s.resolver.resolve_alert("MSG_SAVED"), "Unknown message: MSG_SAVED");
    }

    #[tokio::test]
    async fn test_mock_mode_ignores_catalog() {
        let s = setup(Mode::Api, catalog());
        s.cache.force_refresh().await;
        s.mode.set_mode(Mode::Mock);

        let toast = s.resolver.resolve_toast("MOCK_MODE_WARNING");
        assert_eq!(
            toast,
            ToastMessage {
                title: "MOCK Mode".to_string(),
                description: Some("Changes are NOT saved to database".to_string()),
                severity: Some(Severity::Error),
            }
        );
        assert_eq!(
            s.resolver.resolve_toast("MSG_SAVED").title,
            "Unknown message: MSG_SAVED"
        );
    }

    #[test]
    fn test_unknown_code_fallback() {
        for mode in [Mode::Mock, Mode::Api] {
            let s = setup(mode, vec![]);

            assert_eq!(
                s.resolver.resolve("TOTALLY_UNKNOWN_CODE", MessageKind::Toast),
                ResolvedMessage::Toast(ToastMessage {
                    title: "Unknown message: TOTALLY_UNKNOWN_CODE".to_string(),
                    description: None,
                    severity: Some(Severity::Error),
                })
            );
            assert_eq!(
                s.resolver.resolve_alert("TOTALLY_UNKNOWN_CODE"),
                "Unknown message: TOTALLY_UNKNOWN_CODE"
            );
        }
    }

    #[test]
    fn test_odd_codes_resolve() {
        let s = setup(Mode::Mock, vec![]);
        assert_eq!(s.resolver.resolve_toast("").title, "Unknown message: ");
        assert_eq!(
            s.resolver.resolve_alert("lower case?"),
            "Unknown message: lower case?"
        );
    }

    #[tokio::test]
    async fn test_default_parity_between_modes() {
        let codes = ["MOCK_MODE_WARNING", "API_UNAVAILABLE", "CSV_IMPORT_FAILED", "SESSION_EXPIRED"];

        let mock = setup(Mode::Mock, vec![]);
        let api = setup(Mode::Api, vec![]);
        api.cache.force_refresh().await;

        for code in codes {
            for kind in [MessageKind::Toast, MessageKind::Alert] {
                assert_eq!(mock.resolver.resolve(code, kind), api.resolver.resolve(code, kind));
            }
        }
    }

    #[tokio::test]
    async fn test_upsert_is_visible_immediately() {
        let s = setup(Mode::Api, catalog());
        s.cache.force_refresh().await;

        s.cache.upsert(MessageEntry::toast("MSG_SAVED", "Stored!"));
        let toast = s.resolver.resolve_toast("MSG_SAVED");
        assert_eq!(toast.title, "Stored!");
        assert_eq!(toast.description, None);

        s.cache.remove("MSG_SAVED");
        assert_eq!(s.resolver.resolve_toast("MSG_SAVED").title, "Unknown message: MSG_SAVED");
    }
}
