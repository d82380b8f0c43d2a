//! Mode-aware notification messages for the portfolio/DCA tracker.
//!
//! A [`ModeFlag`](mode::ModeFlag) decides whether the backend may be trusted, a
//! [`MessageCatalogCache`](messages::MessageCatalogCache) keeps a TTL-bounded copy
//! of the backend catalog, and a [`MessageResolver`](messages::MessageResolver)
//! turns message codes into display text with compiled-in fallbacks.

pub mod api;
pub mod config;
pub mod context;
pub mod messages;
pub mod mode;
pub mod storage;

pub use context::MessageCenter;
