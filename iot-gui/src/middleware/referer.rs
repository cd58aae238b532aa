use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::error::REFRESH_PATH;
use crate::AppState;

/// Points an expired-session redirect at a signed refresh URL carrying the
/// page that was requested, so the user lands back there afterwards.
pub async fn referer_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let mut response = next.run(req).await;

    let is_refresh_redirect = response.status() == StatusCode::SEE_OTHER
        && response
            .headers()
            .get(header::LOCATION)
            .is_some_and(|l| l.as_bytes() == REFRESH_PATH.as_bytes());
    if !is_refresh_redirect {
        return response;
    }

    match state.signer.refresh_location(&target) {
        Ok(location) => match HeaderValue::from_str(&location) {
            Ok(value) => {
                response.headers_mut().insert(header::LOCATION, value);
            }
            Err(e) => tracing::warn!(error = %e, "unsigned refresh redirect"),
        },
        Err(e) => tracing::warn!(error = %e, "unsigned refresh redirect"),
    }

    response
}
