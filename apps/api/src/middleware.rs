use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use pls_core::{AppError, Principal};

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the acting identity from the configured header.
///
/// The header is set by the trusted login collaborator in front of the
/// service; a missing or blank value is rejected before any handler runs.
pub async fn require_actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let subject = request
        .headers()
        .get(&state.actor_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(format!("missing '{}' header", state.actor_header))
        })?;

    let actor = Principal::new(subject)?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
