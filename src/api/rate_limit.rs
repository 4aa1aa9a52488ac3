use crate::api::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Records every rate-limit decision made by the governor layers beneath it.
pub async fn log_rate_limit_events(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let retry_after = response.headers().get("x-ratelimit-after").and_then(|v| v.to_str().ok());
    state.rate_limit_service.log_decision(response.status(), retry_after);

    response
}
