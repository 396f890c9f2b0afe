//! Wire types exchanged with clients over REST and SSE.

pub mod events;
pub mod health;
pub mod sse;
pub mod timer;
