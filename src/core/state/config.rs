//=========================================================================
// State Machine Configuration
//=========================================================================
//
// Plain configuration records passed into constructors. Both derive
// `Deserialize` with field defaults so a host can load them from its own
// settings files; nothing here is global.
//
//=========================================================================

//=== External Dependencies ===============================================

use serde::Deserialize;

//=== ContextConfig =======================================================

/// Tunables for a [`Context`](super::Context).
///
/// # Default Values
///
/// - **history_capacity**: 16 entries
/// - **max_settle_passes**: 32 requests applied per flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Upper bound on the history stack; the oldest entry is evicted beyond it.
    pub history_capacity: usize,

    /// Requests applied per settle before the remainder is deferred to the
    /// next tick. Bounds transition ping-pong between misbehaving states.
    pub max_settle_passes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_capacity: 16,
            max_settle_passes: 32,
        }
    }
}

//=== LoadConfig ==========================================================

/// Settings for an [`AsyncLoad`](super::AsyncLoad) state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Text handed to the status bar when loading starts.
    pub status_text: String,

    /// Seconds to wait for completion before falling back. `None` waits forever.
    pub timeout_secs: Option<f32>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            status_text: String::from("Loading..."),
            timeout_secs: None,
        }
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_config_defaults() {
        let config = ContextConfig::default();
        assert_eq!(config.history_capacity, 16);
        assert_eq!(config.max_settle_passes, 32);
    }

    #[test]
    fn context_config_fills_missing_fields() {
        let config: ContextConfig = serde_json::from_str(r#"{ "history_capacity": 4 }"#).unwrap();
        assert_eq!(config.history_capacity, 4);
        assert_eq!(config.max_settle_passes, 32);
    }

    #[test]
    fn load_config_parses_timeout() {
        let config: LoadConfig =
            serde_json::from_str(r#"{ "status_text": "Loading arcade", "timeout_secs": 2.5 }"#)
                .unwrap();
        assert_eq!(config.status_text, "Loading arcade");
        assert_eq!(config.timeout_secs, Some(2.5));
    }

    #[test]
    fn load_config_defaults_to_no_timeout() {
        let config: LoadConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoadConfig::default());
        assert!(config.timeout_secs.is_none());
    }
}
