//! Application-level configuration loading: credentials, seeded events and timer defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    services::credentials::Credential,
    state::events::{EventLifecycle, EventStatus},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ROUND_TIMER_CONFIG_PATH";
const DEFAULT_ROUND_DURATION_SECS: u32 = 180;
const DEFAULT_BREAK_DURATION_SECS: u32 = 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    credentials: Vec<(String, Credential)>,
    events: Vec<(Uuid, EventLifecycle)>,
    default_round_duration: u32,
    default_break_duration: u32,
    sweep_interval: Option<Duration>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        credentials = app_config.credentials.len(),
                        events = app_config.events.len(),
                        "loaded configuration"
                    );
                    app_config
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
        }
    }

    /// Parse a configuration document.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Bearer tokens and the credential each resolves to.
    pub fn credentials(&self) -> &[(String, Credential)] {
        &self.credentials
    }

    /// Events to register with the in-memory lifecycle directory at startup.
    pub fn seeded_events(&self) -> Vec<(Uuid, EventLifecycle)> {
        self.events.clone()
    }

    /// Round length given to newly created timer records.
    pub fn default_round_duration(&self) -> u32 {
        self.default_round_duration
    }

    /// Break length given to newly created timer records.
    pub fn default_break_duration(&self) -> u32 {
        self.default_break_duration
    }

    /// Period of the background expiry sweep, `None` when disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        warn!("using built-in development credentials `dev-admin` and `dev-viewer`");
        Self {
            credentials: vec![
                (
                    "dev-admin".into(),
                    Credential {
                        subject: "organizer".into(),
                        admin: true,
                    },
                ),
                (
                    "dev-viewer".into(),
                    Credential {
                        subject: "participant".into(),
                        admin: false,
                    },
                ),
            ],
            events: Vec::new(),
            default_round_duration: DEFAULT_ROUND_DURATION_SECS,
            default_break_duration: DEFAULT_BREAK_DURATION_SECS,
            sweep_interval: Some(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    credentials: Vec<RawCredential>,
    #[serde(default)]
    events: Vec<RawEvent>,
    #[serde(default = "default_round_duration")]
    default_round_duration: u32,
    #[serde(default = "default_break_duration")]
    default_break_duration: u32,
    #[serde(default = "default_sweep_interval")]
    sweep_interval_secs: u64,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            credentials: value
                .credentials
                .into_iter()
                .map(|raw| {
                    (
                        raw.token,
                        Credential {
                            subject: raw.subject,
                            admin: raw.admin,
                        },
                    )
                })
                .collect(),
            events: value
                .events
                .into_iter()
                .map(|raw| {
                    (
                        raw.id,
                        EventLifecycle {
                            status: raw.status,
                            final_round: raw.final_round.max(1),
                        },
                    )
                })
                .collect(),
            default_round_duration: value.default_round_duration.max(1),
            default_break_duration: value.default_break_duration,
            sweep_interval: (value.sweep_interval_secs > 0)
                .then(|| Duration::from_secs(value.sweep_interval_secs)),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a bearer credential.
struct RawCredential {
    token: String,
    subject: String,
    #[serde(default)]
    admin: bool,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a seeded event.
struct RawEvent {
    id: Uuid,
    status: EventStatus,
    final_round: u32,
}

fn default_round_duration() -> u32 {
    DEFAULT_ROUND_DURATION_SECS
}

fn default_break_duration() -> u32 {
    DEFAULT_BREAK_DURATION_SECS
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
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
    fn parses_full_document() {
        let config = AppConfig::from_json(
            r#"{
                "credentials": [
                    { "token": "secret", "subject": "host", "admin": true },
                    { "token": "guest", "subject": "guest" }
                ],
                "events": [
                    { "id": "6f1c1f5e-8a7e-4f57-9a43-0f0c2d1f9b11", "status": "in_progress", "final_round": 6 }
                ],
                "default_round_duration": 240,
                "sweep_interval_secs": 0
            }"#,
        )
        .unwrap();

        assert_eq!(config.credentials().len(), 2);
        assert!(config.credentials()[0].1.admin);
        assert!(!config.credentials()[1].1.admin);
        assert_eq!(config.seeded_events()[0].1.final_round, 6);
        assert_eq!(config.default_round_duration(), 240);
        assert_eq!(config.default_break_duration(), DEFAULT_BREAK_DURATION_SECS);
        assert_eq!(config.sweep_interval(), None);
    }

    #[test]
    fn clamps_degenerate_values() {
        let config = AppConfig::from_json(
            r#"{
                "events": [
                    { "id": "6f1c1f5e-8a7e-4f57-9a43-0f0c2d1f9b11", "status": "upcoming", "final_round": 0 }
                ],
                "default_round_duration": 0
            }"#,
        )
        .unwrap();

        assert_eq!(config.seeded_events()[0].1.final_round, 1);
        assert_eq!(config.default_round_duration(), 1);
        assert_eq!(
            config.sweep_interval(),
            Some(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS))
        );
    }
}
