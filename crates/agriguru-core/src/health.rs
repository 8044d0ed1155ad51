use std::future::Future;

use axum::extract::State;
use axum::http::StatusCode;

/// Readiness check implemented by a service's shared state.
pub trait ReadinessProbe: Clone + Send + Sync + 'static {
    fn is_ready(&self) -> impl Future<Output = bool> + Send;
}

/// Liveness check for `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness check for `GET /readyz`. Returns 503 while the probe reports not ready.
pub async fn readyz<S: ReadinessProbe>(State(state): State<S>) -> StatusCode {
    if state.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
