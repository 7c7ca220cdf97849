use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::services::availability::{
    classify, find_device, AvailabilityError, Device, DeviceId, DeviceStatus, LivenessResult,
    Observation,
};
use crate::state::AppState;
use crate::time::format_timestamp;

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct LivenessQuery {
    /// Overrides the configured heartbeat threshold for this request.
    pub(crate) stale_after_seconds: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RouterStatusResponse {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) ip_address: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) status: DeviceStatus,
    pub(crate) last_update: Option<String>,
    pub(crate) stale: bool,
    pub(crate) stale_reason: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct RoutersListResponse {
    pub(crate) success: bool,
    pub(crate) data: Vec<RouterStatusResponse>,
}

impl RouterStatusResponse {
    fn new(device: Device, liveness: LivenessResult) -> Self {
        Self {
            id: device.id,
            name: device.name,
            ip_address: device.ip_address,
            location: device.location,
            status: liveness.effective_status,
            last_update: liveness.last_update.map(format_timestamp),
            stale: liveness.stale,
            stale_reason: liveness.stale_reason.map(|reason| reason.as_str().to_string()),
        }
    }
}

fn stale_after(state: &AppState, query: &LivenessQuery) -> AppResult<chrono::Duration> {
    match query.stale_after_seconds {
        None => Ok(state.config.stale_after()),
        Some(0) => Err(AppError::bad_request(
            "stale_after_seconds must be greater than zero",
        )),
        Some(seconds) => Ok(chrono::Duration::seconds(
            seconds.min(u64::from(u32::MAX)) as i64,
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/routers",
    tag = "routers",
    params(LivenessQuery),
    responses(
        (status = 200, description = "Routers with liveness", body = RoutersListResponse),
        (status = 400, description = "Invalid stale threshold"),
        (status = 503, description = "Status data source unavailable")
    )
)]
pub(crate) async fn list_routers(
    State(state): State<AppState>,
    Query(query): Query<LivenessQuery>,
) -> AppResult<Json<RoutersListResponse>> {
    let stale_after = stale_after(&state, &query)?;
    let now = Utc::now();

    let devices = state
        .source
        .list_devices()
        .await
        .map_err(AvailabilityError::from)?;
    let latest: HashMap<DeviceId, Observation> = state
        .source
        .fetch_latest_observations()
        .await
        .map_err(AvailabilityError::from)?
        .into_iter()
        .map(|observation| (observation.device_id, observation))
        .collect();

    let data = devices
        .into_iter()
        .map(|device| {
            let liveness = classify(device.id, latest.get(&device.id), now, stale_after);
            RouterStatusResponse::new(device, liveness)
        })
        .collect();

    Ok(Json(RoutersListResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/routers/{router_id}/status",
    tag = "routers",
    params(
        ("router_id" = i64, Path, description = "Router id"),
        LivenessQuery
    ),
    responses(
        (status = 200, description = "Effective status of one router", body = RouterStatusResponse),
        (status = 404, description = "Router not found"),
        (status = 503, description = "Status data source unavailable")
    )
)]
pub(crate) async fn router_status(
    State(state): State<AppState>,
    Path(router_id): Path<DeviceId>,
    Query(query): Query<LivenessQuery>,
) -> AppResult<Json<RouterStatusResponse>> {
    let stale_after = stale_after(&state, &query)?;
    let device = find_device(state.source.as_ref(), router_id).await?;
    let latest = state
        .source
        .fetch_latest_observation(router_id)
        .await
        .map_err(|err| AvailabilityError::from(err).for_device(router_id))?;

    let liveness = classify(router_id, latest.as_ref(), Utc::now(), stale_after);
    Ok(Json(RouterStatusResponse::new(device, liveness)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/routers", get(list_routers))
        .route("/routers/{router_id}/status", get(router_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::availability::{DataSourceError, Observation};
    use crate::test_support::{device, test_state, MemoryObservationSource};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use tower::ServiceExt;

    fn app(source: MemoryObservationSource) -> Router {
        Router::new()
            .nest("/api", router())
            .with_state(test_state(source))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn list_routers_classifies_every_router() {
        let now = Utc::now();
        let source = MemoryObservationSource::new(
            vec![device(1, "core"), device(2, "edge"), device(3, "lab")],
            vec![
                Observation::new(1, now - Duration::seconds(10), DeviceStatus::Online),
                Observation::new(2, now - Duration::minutes(30), DeviceStatus::Online),
            ],
        );

        let (status, body) = get_json(app(source), "/api/routers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["status"], "online");
        assert_eq!(data[0]["stale"], false);
        assert_eq!(data[0]["ip_address"], "10.0.0.1");
        assert_eq!(data[1]["status"], "offline");
        assert_eq!(data[1]["stale_reason"], "heartbeat overdue");
        assert_eq!(data[2]["status"], "offline");
        assert_eq!(data[2]["stale_reason"], "no data");
        assert!(data[2]["last_update"].is_null());
    }

    #[tokio::test]
    async fn stale_threshold_can_be_widened_per_request() {
        let now = Utc::now();
        let source = MemoryObservationSource::new(
            vec![device(2, "edge")],
            vec![Observation::new(
                2,
                now - Duration::minutes(30),
                DeviceStatus::Online,
            )],
        );

        let (status, body) = get_json(app(source), "/api/routers?stale_after_seconds=7200").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["status"], "online");
        assert_eq!(body["data"][0]["stale"], false);
    }

    #[tokio::test]
    async fn zero_stale_threshold_is_rejected() {
        let source = MemoryObservationSource::new(vec![device(1, "core")], Vec::new());
        let (status, _) = get_json(app(source), "/api/routers?stale_after_seconds=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreachable_source_is_service_unavailable() {
        let source =
            MemoryObservationSource::new(vec![device(1, "core")], Vec::new()).unreachable();
        let (status, _) = get_json(app(source), "/api/routers").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn router_status_reports_offline_router_as_not_stale() {
        let now = Utc::now();
        let source = MemoryObservationSource::new(
            vec![device(4, "branch")],
            vec![Observation::new(
                4,
                now - Duration::hours(5),
                DeviceStatus::Offline,
            )],
        );

        let (status, body) = get_json(app(source), "/api/routers/4/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 4);
        assert_eq!(body["status"], "offline");
        assert_eq!(body["stale"], false);
        assert!(body["stale_reason"].is_null());
    }

    #[tokio::test]
    async fn router_status_for_unknown_router_is_not_found() {
        let source = MemoryObservationSource::new(vec![device(1, "core")], Vec::new());
        let (status, _) = get_json(app(source), "/api/routers/99/status").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_latest_row_is_bad_gateway() {
        let source = MemoryObservationSource::new(vec![device(1, "core")], Vec::new())
            .with_error_for(1, || DataSourceError::MalformedStatus {
                device_id: 1,
                raw: "maybe".to_string(),
            });
        let (status, _) = get_json(app(source), "/api/routers/1/status").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
