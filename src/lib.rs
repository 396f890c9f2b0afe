//! Round timer authority and client synchronization library.
//!
//! The server half ([`state`], [`services`], [`routes`]) owns one authoritative timer per event
//! and exposes it over HTTP. The [`client`] half polls that API and turns snapshots into a smooth
//! local countdown.

pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
