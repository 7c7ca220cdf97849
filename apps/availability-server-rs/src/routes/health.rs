use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Process is up", body = HealthResponse))
)]
pub(crate) async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Ready once the status log answers a router listing.
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "health",
    responses(
        (status = 200, description = "Status log reachable", body = HealthResponse),
        (status = 503, description = "Status log unreachable", body = HealthResponse)
    )
)]
pub(crate) async fn readyz_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.source.list_devices().await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{device, test_state, MemoryObservationSource};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn status_of(source: MemoryObservationSource, uri: &str) -> StatusCode {
        router()
            .with_state(test_state(source))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn healthz_ignores_the_status_log() {
        let source = MemoryObservationSource::default().unreachable();
        assert_eq!(status_of(source, "/healthz").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readyz_follows_the_status_log() {
        let source = MemoryObservationSource::new(vec![device(1, "core")], Vec::new());
        assert_eq!(status_of(source, "/readyz").await, StatusCode::OK);

        let source = MemoryObservationSource::default().unreachable();
        assert_eq!(
            status_of(source, "/readyz").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
