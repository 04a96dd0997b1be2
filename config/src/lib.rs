//! Configuration for Consulate, read from `~/.consulate/config.toml`.
//!
//! Every key is optional. Absent or unreadable files fall back to defaults
//! with a warning rather than failing startup.
//!
//! ```toml
//! [store]
//! path = "${HOME}/.consulate/consulate.db"
//! busy_timeout_ms = 5000
//!
//! [recovery]
//! reissue_after_secs = 3600
//! redeem_within_secs = 86400
//!
//! [logging]
//! filter = "consulate_store=debug,info"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use consulate_types::{DEFAULT_BUSY_TIMEOUT, RecoveryWindow};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "CONSULATE_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct ConsulateConfig {
    pub store: Option<StoreConfig>,
    pub recovery: Option<RecoveryConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub path: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecoveryConfig {
    pub reissue_after_secs: Option<u64>,
    pub redeem_within_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

impl ConsulateConfig {
    /// Load from [`config_path`], or defaults when there is nothing usable.
    ///
    /// Problems reading or parsing the file are returned as warnings so the
    /// caller can report them once logging is up.
    #[must_use]
    pub fn load() -> (Self, Vec<String>) {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => (Self::default(), Vec::new()),
        }
    }

    /// Load a specific file, falling back to defaults if missing or invalid.
    #[must_use]
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        if !path.exists() {
            return (Self::default(), Vec::new());
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                let warning = format!("Failed to read config at {}: {err}", path.display());
                return (Self::default(), vec![warning]);
            }
        };

        match Self::parse(&content) {
            Ok(config) => {
                let warnings = config.range_warnings();
                (config, warnings)
            }
            Err(err) => {
                let warning = format!("Failed to parse config at {}: {err}", path.display());
                (Self::default(), vec![warning])
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Database location, with `${VAR}` references expanded.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.store
            .as_ref()
            .and_then(|store| store.path.as_deref())
            .map(|raw| PathBuf::from(expand_env_vars(raw)))
            .or_else(default_store_path)
            .unwrap_or_else(|| PathBuf::from("consulate.db"))
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        self.store
            .as_ref()
            .and_then(|store| store.busy_timeout_ms)
            .map_or(DEFAULT_BUSY_TIMEOUT, Duration::from_millis)
    }

    #[must_use]
    pub fn recovery_window(&self) -> RecoveryWindow {
        let recovery = self.recovery.as_ref();
        let reissue_after = recovery
            .and_then(|r| r.reissue_after_secs)
            .map_or(RecoveryWindow::DEFAULT_REISSUE_AFTER, Duration::from_secs);
        let redeem_within = recovery
            .and_then(|r| r.redeem_within_secs)
            .map_or(RecoveryWindow::DEFAULT_REDEEM_WITHIN, Duration::from_secs);
        RecoveryWindow::new(reissue_after, redeem_within)
    }

    /// Recovery bounds that [`RecoveryWindow::new`] will clamp.
    fn range_warnings(&self) -> Vec<String> {
        let Some(recovery) = self.recovery.as_ref() else {
            return Vec::new();
        };
        [
            ("reissue_after_secs", recovery.reissue_after_secs),
            ("redeem_within_secs", recovery.redeem_within_secs),
        ]
        .into_iter()
        .filter_map(|(key, secs)| Some((key, secs?)))
        .filter(|&(_, secs)| RecoveryWindow::exceeds_max(Duration::from_secs(secs)))
        .map(|(key, secs)| {
            format!(
                "[recovery] {key} = {secs} is out of range; using {}",
                RecoveryWindow::MAX.as_secs()
            )
        })
        .collect()
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.logging
            .as_ref()
            .and_then(|logging| logging.filter.as_deref())
    }
}

/// Replace `${VAR}` with the variable's value (empty when unset).
///
/// An unterminated `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

/// `~/.consulate`, home of the config file, default database and logs.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".consulate"))
}

fn default_store_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("consulate.db"))
}
