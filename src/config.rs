//! Application-level configuration loading, including the sync loop tuning knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the service looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KINEKIDS_SYNC_CONFIG_PATH";
/// Environment variable that overrides the configured engine base URL.
const ENGINE_URL_ENV: &str = "KINEKIDS_ENGINE_URL";

/// Engine base URL used when neither the config file nor the environment set one.
const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
///
/// The intervals mirror the cadences the classroom UI historically used;
/// they are tuning values, not a contract with the engine.
pub struct AppConfig {
    /// Base URL of the game-engine backend.
    pub engine_base_url: String,
    /// Cadence of the sync-status poll loop.
    pub poll_interval: Duration,
    /// Per-request timeout applied to engine calls issued by the loops.
    pub request_timeout: Duration,
    /// Cadence of the batched all-scores refresh.
    pub score_refresh_interval: Duration,
    /// Cadence of the reachability probe.
    pub probe_interval: Duration,
    /// How long polling stays paused after the engine reports resource exhaustion.
    pub exhaustion_cooldown: Duration,
    /// Delay between recording a completion and signalling the next student,
    /// giving the engine time to settle the finished session.
    pub advance_settle_delay: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    ///
    /// `KINEKIDS_ENGINE_URL` wins over the file for the engine base URL.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded sync configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Ok(url) = env::var(ENGINE_URL_ENV) {
            if !url.trim().is_empty() {
                config.engine_base_url = url;
            }
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine_base_url: DEFAULT_ENGINE_URL.to_string(),
            poll_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(3),
            score_refresh_interval: Duration::from_secs(30),
            probe_interval: Duration::from_secs(30),
            exhaustion_cooldown: Duration::from_secs(10),
            advance_settle_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    engine_base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    score_refresh_interval_ms: Option<u64>,
    probe_interval_ms: Option<u64>,
    exhaustion_cooldown_ms: Option<u64>,
    advance_settle_delay_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        let millis =
            |value: Option<u64>, fallback: Duration| value.map(Duration::from_millis).unwrap_or(fallback);

        Self {
            engine_base_url: raw
                .engine_base_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.engine_base_url),
            poll_interval: millis(raw.poll_interval_ms, defaults.poll_interval),
            request_timeout: millis(raw.request_timeout_ms, defaults.request_timeout),
            score_refresh_interval: millis(
                raw.score_refresh_interval_ms,
                defaults.score_refresh_interval,
            ),
            probe_interval: millis(raw.probe_interval_ms, defaults.probe_interval),
            exhaustion_cooldown: millis(raw.exhaustion_cooldown_ms, defaults.exhaustion_cooldown),
            advance_settle_delay: millis(raw.advance_settle_delay_ms, defaults.advance_settle_delay),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_cadences() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.score_refresh_interval, Duration::from_secs(30));
        assert_eq!(config.probe_interval, Duration::from_secs(30));
        assert_eq!(config.exhaustion_cooldown, Duration::from_secs(10));
    }

    #[test]
    fn raw_config_overrides_only_present_fields() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"engine_base_url": "http://engine:9000", "poll_interval_ms": 1000}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.engine_base_url, "http://engine:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_engine_url_falls_back_to_default() {
        let raw: RawConfig = serde_json::from_str(r#"{"engine_base_url": "  "}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.engine_base_url, DEFAULT_ENGINE_URL);
    }
}
