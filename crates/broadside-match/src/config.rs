//! Match configuration.

use std::time::Duration;

/// What a turn timeout costs the silent player.
///
/// Two readings of "timeout" are reasonable for a turn-based game, so the
/// choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// The turn passes to the opponent; the match continues.
    #[default]
    ForfeitTurn,
    /// The silent player loses the match.
    ForfeitMatch,
}

/// Settings for one match.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// How long the acting player has to answer each prompt.
    ///
    /// Default: 30 seconds.
    pub turn_timeout: Duration,

    /// Default: [`TimeoutPolicy::ForfeitTurn`].
    pub timeout_policy: TimeoutPolicy,

    /// How long each player has to answer "play again?".
    /// No answer counts as "no".
    ///
    /// Default: 30 seconds.
    pub replay_prompt_timeout: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(30),
            timeout_policy: TimeoutPolicy::default(),
            replay_prompt_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = MatchConfig::default();
        assert_eq!(config.turn_timeout, Duration::from_secs(30));
        assert_eq!(config.timeout_policy, TimeoutPolicy::ForfeitTurn);
        assert_eq!(config.replay_prompt_timeout, Duration::from_secs(30));
    }
}
