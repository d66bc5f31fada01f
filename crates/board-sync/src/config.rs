//! Sync configuration: the persist follow-up policy and edge side defaults.

use std::time::Duration;

use board_core::Side;

use crate::error::ConfigError;

/// Environment variable holding follow-up persist delays, comma-separated
/// milliseconds (`"150"`, `"100,400"`, or empty for none).
pub const PERSIST_DELAYS_ENV: &str = "BOARD_PERSIST_DELAYS_MS";

/// When to ask the host to persist again after a write.
///
/// The adapter always persists once right after writing. Each entry of
/// `follow_up_delays` schedules one more persist, measured from the
/// previous one. The follow-ups only shrink the window in which another
/// writer can clobber the document before it reaches disk; they do not
/// close it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistPolicy {
    pub follow_up_delays: Vec<Duration>,
}

impl Default for PersistPolicy {
    fn default() -> Self {
        PersistPolicy {
            follow_up_delays: vec![Duration::from_millis(150)],
        }
    }
}

impl PersistPolicy {
    /// Persist once, with no follow-ups.
    pub fn immediate() -> Self {
        PersistPolicy {
            follow_up_delays: Vec::new(),
        }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        PersistPolicy {
            follow_up_delays: delays.iter().copied().map(Duration::from_millis).collect(),
        }
    }

    /// Parses a comma-separated list of millisecond delays.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let mut delays = Vec::new();
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let ms: u64 = part.parse().map_err(|_| ConfigError::InvalidValue {
                name: PERSIST_DELAYS_ENV.to_string(),
                reason: format!("'{}' is not a whole number of milliseconds", part),
            })?;
            delays.push(Duration::from_millis(ms));
        }
        Ok(PersistPolicy {
            follow_up_delays: delays,
        })
    }
}

/// Settings for a [`SyncAdapter`](crate::adapter::SyncAdapter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub persist: PersistPolicy,
    /// Written on edges that have no `fromSide`.
    pub default_from_side: Side,
    /// Written on edges that have no `toSide`.
    pub default_to_side: Side,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            persist: PersistPolicy::default(),
            default_from_side: Side::Right,
            default_to_side: Side::Left,
        }
    }
}

impl SyncConfig {
    /// Defaults, with the persist policy taken from
    /// [`PERSIST_DELAYS_ENV`] when it is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = SyncConfig::default();
        if let Ok(value) = std::env::var(PERSIST_DELAYS_ENV) {
            config.persist = PersistPolicy::parse(&value)?;
        }
        Ok(config)
    }

    pub fn with_persist(mut self, persist: PersistPolicy) -> Self {
        self.persist = persist;
        self
    }
}
