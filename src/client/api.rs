//! Seam between the synchronization logic and the timer authority's HTTP API.

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dto::timer::TimerSnapshot;

use super::error::ClientResult;

/// Control action a client can ask the authority to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Begin round one.
    Start,
    /// Freeze the running round.
    Pause {
        /// Countdown the caller was displaying; informational only.
        time_remaining: Option<u32>,
    },
    /// Continue a paused round.
    Resume,
    /// Finish the current round early.
    EndRound,
    /// Leave the break and start the following round.
    NextRound,
    /// Change round and/or break length.
    UpdateDuration {
        /// New round length in seconds.
        round_duration: Option<u32>,
        /// New break length in seconds.
        break_duration: Option<u32>,
    },
}

impl TimerAction {
    /// Path segment under `/events/{event_id}/timer`.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            TimerAction::Start => "start",
            TimerAction::Pause { .. } => "pause",
            TimerAction::Resume => "resume",
            TimerAction::EndRound => "end-round",
            TimerAction::NextRound => "next-round",
            TimerAction::UpdateDuration { .. } => "duration",
        }
    }
}

/// Reads and writes an event's authoritative timer.
pub trait TimerApi: Send + Sync {
    /// Current authoritative snapshot.
    fn fetch(&self, event_id: Uuid) -> BoxFuture<'static, ClientResult<TimerSnapshot>>;

    /// Ask the authority to apply `action`; resolves to the post-write snapshot.
    fn send(
        &self,
        event_id: Uuid,
        action: TimerAction,
    ) -> BoxFuture<'static, ClientResult<TimerSnapshot>>;
}

#[cfg(feature = "http-client")]
pub use http::HttpTimerApi;

#[cfg(feature = "http-client")]
mod http {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use reqwest::{Client, Method, RequestBuilder};
    use uuid::Uuid;

    use crate::{
        client::{
            config::ClientConfig,
            error::{ClientError, ClientResult},
        },
        dto::timer::{ErrorResponse, PauseRequest, TimerSnapshot, UpdateDurationRequest},
    };

    use super::{TimerAction, TimerApi};

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// [`TimerApi`] backed by the authority's REST endpoints.
    #[derive(Clone)]
    pub struct HttpTimerApi {
        client: Client,
        base_url: Arc<str>,
        token: Arc<str>,
    }

    impl HttpTimerApi {
        /// Build a client for the authority described by `config`.
        pub fn new(config: &ClientConfig) -> ClientResult<Self> {
            let client = Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|source| ClientError::ClientBuilder {
                    source: Box::new(source),
                })?;

            Ok(Self {
                client,
                base_url: Arc::from(config.base_url.trim_end_matches('/')),
                token: Arc::from(config.token.as_str()),
            })
        }

        fn request(&self, method: Method, path: &str) -> RequestBuilder {
            let url = format!("{}/{}", self.base_url, path);
            self.client
                .request(method, url)
                .bearer_auth(self.token.as_ref())
        }
    }

    impl TimerApi for HttpTimerApi {
        fn fetch(&self, event_id: Uuid) -> BoxFuture<'static, ClientResult<TimerSnapshot>> {
            let path = format!("events/{event_id}/timer");
            let builder = self.request(Method::GET, &path);
            Box::pin(execute(builder, path))
        }

        fn send(
            &self,
            event_id: Uuid,
            action: TimerAction,
        ) -> BoxFuture<'static, ClientResult<TimerSnapshot>> {
            let path = format!("events/{event_id}/timer/{}", action.path_suffix());
            let builder = match action {
                TimerAction::Pause { time_remaining } => self
                    .request(Method::POST, &path)
                    .json(&PauseRequest { time_remaining }),
                TimerAction::UpdateDuration {
                    round_duration,
                    break_duration,
                } => self
                    .request(Method::PUT, &path)
                    .json(&UpdateDurationRequest {
                        round_duration,
                        break_duration,
                    }),
                _ => self.request(Method::POST, &path),
            };
            Box::pin(execute(builder, path))
        }
    }

    async fn execute(builder: RequestBuilder, path: String) -> ClientResult<TimerSnapshot> {
        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::RequestSend {
                path: path.clone(),
                source: Box::new(source),
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<TimerSnapshot>()
                .await
                .map_err(|source| ClientError::DecodeResponse {
                    path,
                    source: Box::new(source),
                });
        }

        let (message, timer) = match response.json::<ErrorResponse>().await {
            Ok(body) => (body.message, body.timer.map(Box::new)),
            Err(_) => (status.to_string(), None),
        };
        Err(ClientError::Rejected {
            path,
            status: status.as_u16(),
            message,
            timer,
        })
    }
}
