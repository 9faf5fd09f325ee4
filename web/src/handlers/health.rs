//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Liveness check.
///
/// Does not contact the backend.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let Json(body) = health_check().await;
        assert_eq!(body.status, "ok");
    }
}
