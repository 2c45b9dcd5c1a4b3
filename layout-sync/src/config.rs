//! Session configuration.

use std::time::Duration;

use layout_advisor::AdvisorConfig;

/// Default quiet period before a manual edit is committed.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default bound on a single suggestion request.
pub const DEFAULT_SUGGESTION_TIMEOUT_MS: u64 = 20_000;
/// Default capacity of the session event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Everything a sync session needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period after the last keystroke before an edit commits.
    pub debounce: Duration,
    /// Requests still pending after this long count as unavailable.
    pub suggestion_timeout: Duration,
    /// Capacity of the broadcast channel carrying [`crate::SyncEvent`]s.
    pub event_capacity: usize,
    /// Suggestion service settings, including the credential.
    pub advisor: AdvisorConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            suggestion_timeout: Duration::from_millis(DEFAULT_SUGGESTION_TIMEOUT_MS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            advisor: AdvisorConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Read configuration from environment variables or defaults.
    ///
    /// Environment variables:
    /// - `LAYOUT_DEBOUNCE_MS`: edit quiet period (default: 300)
    /// - `LAYOUT_SUGGESTION_TIMEOUT_MS`: suggestion bound (default: 20000)
    /// - everything [`AdvisorConfig::from_env`] reads
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SyncConfig::from_env`] but reading through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(Duration::from_millis(default), Duration::from_millis)
        };

        Self {
            debounce: millis("LAYOUT_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS),
            suggestion_timeout: millis(
                "LAYOUT_SUGGESTION_TIMEOUT_MS",
                DEFAULT_SUGGESTION_TIMEOUT_MS,
            ),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            advisor: AdvisorConfig::from_lookup(&lookup),
        }
    }

    /// Override the debounce interval.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Override the suggestion timeout.
    #[must_use]
    pub fn with_suggestion_timeout(mut self, timeout: Duration) -> Self {
        self.suggestion_timeout = timeout;
        self
    }
}
