use async_trait::async_trait;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub watchdog: WatchdogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Watchdog timing and debounce settings.
///
/// Raw values are signed so that out-of-range input (a negative delay, a zero
/// poll period) can be accepted and normalized instead of rejected. The
/// supervisor only ever consumes the clamped accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Whether the watchdog runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds to wait after a (re)start before polling begins (min 0)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: i64,
    /// Seconds between link status polls (min 1)
    #[serde(default = "default_poll_period")]
    pub poll_period_secs: i64,
    /// Consecutive unavailable observations before a reconnect attempt (min 1)
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: i64,
}

fn default_enabled() -> bool {
    true
}

fn default_initial_delay() -> i64 {
    10
}

fn default_poll_period() -> i64 {
    5
}

fn default_offline_threshold() -> i64 {
    3
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            initial_delay_secs: default_initial_delay(),
            poll_period_secs: default_poll_period(),
            offline_threshold: default_offline_threshold(),
        }
    }
}

impl WatchdogConfig {
    /// Clamp all values to their documented minimums.
    pub fn sanitized(&self) -> Self {
        Self {
            enabled: self.enabled,
            initial_delay_secs: self.initial_delay_secs.max(0),
            poll_period_secs: self.poll_period_secs.max(1),
            offline_threshold: self.offline_threshold.max(1),
        }
    }

    /// Settle delay before polling begins
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs.max(0) as u64)
    }

    /// Interval between status polls
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs.max(1) as u64)
    }

    /// Debounce threshold
    pub fn threshold(&self) -> u32 {
        self.offline_threshold.clamp(1, i64::from(u32::MAX)) as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("watchdog.enabled", true)?
            .set_default("watchdog.initial_delay_secs", 10)?
            .set_default("watchdog.poll_period_secs", 5)?
            .set_default("watchdog.offline_threshold", 3)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("RELINK_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (RELINK_WATCHDOG__POLL_PERIOD_SECS, etc.)
            .add_source(
                Environment::with_prefix("RELINK")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

/// Host-owned settings storage.
///
/// The supervisor re-reads this at the start of every restart; it never caches
/// a config across cycles, so saved changes take effect on the next restart.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn load(&self) -> WatchdogConfig;
}

/// In-memory settings backing for the CLI and tests
#[derive(Debug, Default)]
pub struct StaticSettings {
    inner: RwLock<WatchdogConfig>,
}

impl StaticSettings {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Replace the stored settings. Callers still need to route a
    /// settings-saved notification to the supervisor for this to take effect.
    pub fn update(&self, config: WatchdogConfig) {
        *self.inner.write().expect("settings lock poisoned") = config;
    }
}

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn load(&self) -> WatchdogConfig {
        self.inner.read().expect("settings lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_minimums() {
        let config = WatchdogConfig {
            enabled: true,
            initial_delay_secs: -5,
            poll_period_secs: 0,
            offline_threshold: 0,
        };

        let sane = config.sanitized();
        assert_eq!(sane.initial_delay_secs, 0);
        assert_eq!(sane.poll_period_secs, 1);
        assert_eq!(sane.offline_threshold, 1);
    }

    #[test]
    fn test_sanitize_keeps_valid_values() {
        let config = WatchdogConfig::default();
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn test_clamped_accessors() {
        let config = WatchdogConfig {
            enabled: true,
            initial_delay_secs: -1,
            poll_period_secs: -10,
            offline_threshold: -3,
        };

        assert_eq!(config.initial_delay(), Duration::from_secs(0));
        assert_eq!(config.poll_period(), Duration::from_secs(1));
        assert_eq!(config.threshold(), 1);
    }

    #[test]
    fn test_default_values() {
        let config = WatchdogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.initial_delay_secs, 10);
        assert_eq!(config.poll_period_secs, 5);
        assert_eq!(config.offline_threshold, 3);
    }

    #[tokio::test]
    async fn test_static_settings_roundtrip() {
        let settings = StaticSettings::new(WatchdogConfig::default());
        let mut updated = WatchdogConfig::default();
        updated.poll_period_secs = 2;
        settings.update(updated.clone());

        assert_eq!(settings.load().await, updated);
    }
}
