use std::time::Duration;

use broadside::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Server settings read from `BROADSIDE_*` variables.
#[derive(Debug)]
struct Settings {
    addr: String,
    turn_timeout: Duration,
    grace: Duration,
    matches: usize,
    policy: TimeoutPolicy,
}

impl Settings {
    fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let secs = |key: &str, default: u64| -> Result<Duration, String> {
            match get(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .map(Duration::from_secs)
                    .map_err(|_| format!("{key} must be a whole number of seconds, got {v:?}")),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let matches = match get("BROADSIDE_MATCHES") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| format!("BROADSIDE_MATCHES must be a positive number, got {v:?}"))?,
            None => 1,
        };

        let policy = match get("BROADSIDE_TIMEOUT_POLICY").as_deref().map(str::trim) {
            None | Some("turn") => TimeoutPolicy::ForfeitTurn,
            Some("match") => TimeoutPolicy::ForfeitMatch,
            Some(other) => {
                return Err(format!(
                    "BROADSIDE_TIMEOUT_POLICY must be `turn` or `match`, got {other:?}"
                ));
            }
        };

        Ok(Self {
            addr: get("BROADSIDE_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            turn_timeout: secs("BROADSIDE_TURN_TIMEOUT_SECS", 30)?,
            grace: secs("BROADSIDE_GRACE_SECS", 60)?,
            matches,
            policy,
        })
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(?settings, "starting battleship server");

    let server = BroadsideServer::<ClassicFleet>::builder()
        .bind(&settings.addr)
        .session_config(SessionConfig {
            reconnect_grace: settings.grace,
        })
        .match_config(MatchConfig {
            turn_timeout: settings.turn_timeout,
            timeout_policy: settings.policy,
            ..MatchConfig::default()
        })
        .max_concurrent_matches(settings.matches)
        .build(ClassicFleet::random())
        .await?;

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.addr, "0.0.0.0:5000");
        assert_eq!(s.turn_timeout, Duration::from_secs(30));
        assert_eq!(s.grace, Duration::from_secs(60));
        assert_eq!(s.matches, 1);
        assert_eq!(s.policy, TimeoutPolicy::ForfeitTurn);
    }

    #[test]
    fn test_from_lookup_overrides_apply() {
        let s = settings(&[
            ("BROADSIDE_ADDR", "127.0.0.1:9000"),
            ("BROADSIDE_TURN_TIMEOUT_SECS", "10"),
            ("BROADSIDE_GRACE_SECS", " 5 "),
            ("BROADSIDE_MATCHES", "3"),
            ("BROADSIDE_TIMEOUT_POLICY", "match"),
        ])
        .unwrap();
        assert_eq!(s.addr, "127.0.0.1:9000");
        assert_eq!(s.turn_timeout, Duration::from_secs(10));
        assert_eq!(s.grace, Duration::from_secs(5));
        assert_eq!(s.matches, 3);
        assert_eq!(s.policy, TimeoutPolicy::ForfeitMatch);
    }

    #[test]
    fn test_from_lookup_bad_values_rejected() {
        assert!(settings(&[("BROADSIDE_GRACE_SECS", "soon")]).is_err());
        assert!(settings(&[("BROADSIDE_MATCHES", "-1")]).is_err());
        assert!(settings(&[("BROADSIDE_TIMEOUT_POLICY", "game")]).is_err());
    }
}
