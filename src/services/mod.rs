//! Business logic behind the HTTP routes.

/// Credential collaborator: bearer token resolution.
pub mod credentials;
/// OpenAPI documentation generation.
pub mod documentation;
/// Background sweep for overdue rounds.
pub mod expiry_sweeper;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Timer authority operations.
pub mod timer_service;
