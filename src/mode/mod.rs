use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::api::{ApiError, MessageApi};
use crate::storage::{Storage, MODE_KEY};

/// Whether the remote backend may be treated as real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Mock,
    Api,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Mock => "MOCK",
            Mode::Api => "API",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Mode::Api,
            _ => Mode::Mock,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Mode::Mock => 0,
            Mode::Api => 1,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("MOCK") {
            Ok(Mode::Mock)
        } else if s.eq_ignore_ascii_case("API") {
            Ok(Mode::Api)
        } else {
            Err(format!("Unknown mode: {}", s))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeChangeEvent {
    pub previous: Mode,
    pub current: Mode,
}

/// Single source of truth for the current [`Mode`], persisted across restarts.
///
/// Readers call [`ModeFlag::get_mode`] on every operation; the value is never
/// cached downstream.
pub struct ModeFlag {
    current: AtomicU8,
    storage: Arc<dyn Storage>,
    change_tx: broadcast::Sender<ModeChangeEvent>,
}

impl ModeFlag {
    /// Restores the persisted mode, falling back to `MOCK` when nothing valid is stored.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let mode = match storage.get(MODE_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring persisted mode: {}", e);
                Mode::Mock
            }),
            Ok(None) => Mode::Mock,
            Err(e) => {
                warn!("Failed to read persisted mode, defaulting to MOCK: {}", e);
                Mode::Mock
            }
        };

        let (change_tx, _) = broadcast::channel(32);
        Self {
            current: AtomicU8::new(mode.as_u8()),
            storage,
            change_tx,
        }
    }

    pub fn get_mode(&self) -> Mode {
        Mode::from_u8(self.current.load(Ordering::Acquire))
    }

    pub fn is_api(&self) -> bool {
        self.get_mode() == Mode::Api
    }

    pub fn set_mode(&self, next: Mode) {
        let previous = Mode::from_u8(self.current.swap(next.as_u8(), Ordering::AcqRel));

        if let Err(e) = self.storage.set(MODE_KEY, next.as_str()) {
            warn!("Failed to persist mode {}: {}", next, e);
        }

        if previous != next {
            info!("Mode switched: {} -> {}", previous, next);
        }
        let _ = self.change_tx.send(ModeChangeEvent { previous, current: next });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModeChangeEvent> {
        self.change_tx.subscribe()
    }
}

/// Probes the backend and only then trusts it.
///
/// On a failed probe the flag is forced back to `MOCK` and the probe error is
/// returned so the caller can surface it (typically as `API_UNAVAILABLE`).
pub async fn activate_api(flag: &ModeFlag, api: &dyn MessageApi) -> Result<(), ApiError> {
    match api.health().await {
        Ok(()) => {
            flag.set_mode(Mode::Api);
            Ok(())
        }
        Err(e) => {
            warn!("Health check failed, staying in MOCK mode: {}", e);
            flag.set_mode(Mode::Mock);
            Err(e)
        }
    }
}
