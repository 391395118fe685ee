use std::time::Duration;

/// Match configuration: the per-player clock allowance and display names.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Countdown budget each player starts with.
    pub allowance: Duration,
    /// Display name for White.
    pub white_name: String,
    /// Display name for Black.
    pub black_name: String,
}

impl MatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// `CHESS_CLOCK_SECS` (whole seconds), `CHESS_WHITE_NAME`,
    /// `CHESS_BLACK_NAME`.
    pub fn from_env() -> Self {
        let defaults = MatchConfig::default();
        MatchConfig {
            allowance: std::env::var("CHESS_CLOCK_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.allowance),
            white_name: std::env::var("CHESS_WHITE_NAME").unwrap_or(defaults.white_name),
            black_name: std::env::var("CHESS_BLACK_NAME").unwrap_or(defaults.black_name),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            allowance: Duration::from_secs(300),
            white_name: "Player 1".to_string(),
            black_name: "Player 2".to_string(),
        }
    }
}
