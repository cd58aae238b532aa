use axum::response::IntoResponse;

use crate::error::Error;

pub async fn metrics() -> Result<impl IntoResponse, Error> {
    crate::services::metrics::get_metrics().map_err(|e| Error::Internal(e.to_string()))
}
