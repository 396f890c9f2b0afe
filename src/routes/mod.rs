//! HTTP router and credential middleware.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::credentials::bearer_token, state::SharedState};

pub mod docs;
pub mod events;
pub mod health;
pub mod sse;
pub mod timer;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(timer::router(state.clone()))
        .merge(sse::router(state.clone()))
        .merge(events::router(state.clone()))
        .merge(docs::router());

    api_router.with_state(state)
}

/// Resolve the `Authorization: Bearer` credential and attach it to the request extensions.
async fn require_credential(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let credential = {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("missing bearer credential".into()))?;

        state
            .credentials()
            .resolve(token)
            .ok_or_else(|| AppError::Unauthorized("unknown bearer credential".into()))?
    };

    req.extensions_mut().insert(credential);
    Ok(next.run(req).await)
}
