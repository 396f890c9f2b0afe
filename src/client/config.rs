//! Connection settings for the timer client.

use std::time::Duration;

use super::error::{ClientError, ClientResult};

/// Seconds between two background polls when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where the timer authority lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL of the authority, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Bearer credential sent with every request.
    pub token: String,
    /// Interval between background polls.
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Construct a configuration polling every [`DEFAULT_POLL_INTERVAL`].
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the background poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("ROUND_TIMER_URL").map_err(|_| ClientError::MissingEnvVar {
            var: "ROUND_TIMER_URL",
        })?;
        let token = std::env::var("ROUND_TIMER_TOKEN").map_err(|_| {
            ClientError::MissingEnvVar {
                var: "ROUND_TIMER_TOKEN",
            }
        })?;

        let mut config = Self::new(base_url, token);
        if let Ok(raw) = std::env::var("ROUND_TIMER_POLL_SECS") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ClientError::InvalidEnvVar {
                    var: "ROUND_TIMER_POLL_SECS",
                    value: raw,
                })?;
            config = config.with_poll_interval(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
