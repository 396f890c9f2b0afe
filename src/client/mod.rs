//! Client-side synchronization with the timer authority.
//!
//! A [`TimerObserver`] polls the authority, reconciles each snapshot through a
//! [`ClientTimerStateMachine`], runs a one-second local countdown between polls and emits one
//! end-of-round signal per expiry.

pub mod api;
pub mod config;
pub mod error;
pub mod machine;
pub mod notifier;
pub mod observer;
pub mod recovery;
mod scheduler;
mod ticker;

#[cfg(feature = "http-client")]
pub use api::HttpTimerApi;
pub use api::{TimerAction, TimerApi};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use machine::{ClientTimerStateMachine, ClientTimerView, ViewSource};
pub use notifier::{NotificationEmitter, NotificationSink};
pub use observer::{ObserverOptions, TimerObserver};
pub use recovery::{FileRecoveryStore, MemoryRecoveryStore, RecoveredView, RecoveryStore};
