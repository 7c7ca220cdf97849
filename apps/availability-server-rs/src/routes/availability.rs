use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, AppResult};
use crate::services::availability::fleet::{device_downtime, summarize};
use crate::services::availability::format::round2;
use crate::services::availability::{find_device, DeviceId, DowntimeInterval, Window};
use crate::state::AppState;
use crate::time::{format_timestamp, parse_query_instant};

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct WindowQuery {
    /// Window start (inclusive).
    pub(crate) start: Option<String>,
    /// Window end (exclusive).
    pub(crate) end: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct UptimeResponse {
    pub(crate) uptime_percentage: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct DowntimeEntry {
    pub(crate) start: String,
    /// `null` while the outage is still running at the window end.
    pub(crate) end: Option<String>,
    pub(crate) duration_seconds: i64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct DowntimeResponse {
    pub(crate) total_downtime_seconds: i64,
    pub(crate) total_downtime_minutes: f64,
    pub(crate) downtimes: Vec<DowntimeEntry>,
}

impl From<&DowntimeInterval> for DowntimeEntry {
    fn from(interval: &DowntimeInterval) -> Self {
        Self {
            start: format_timestamp(interval.start),
            end: interval.end.map(format_timestamp),
            duration_seconds: interval.duration_seconds(),
        }
    }
}

fn required_instant(raw: Option<&str>, name: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{name} is required")))?;
    parse_query_instant(raw).ok_or_else(|| {
        AppError::bad_request(format!(
            "{name} must be YYYY-MM-DD, YYYY-MM-DD HH:MM:SS or RFC3339"
        ))
    })
}

/// Parses a reporting window and enforces the configured maximum span.
pub(crate) fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    max_window: Duration,
) -> AppResult<Window> {
    let start = required_instant(start, "start")?;
    let end = required_instant(end, "end")?;
    let window = Window::new(start, end)?;
    if window.duration() > max_window {
        return Err(AppError::bad_request(format!(
            "window must not exceed {} days",
            max_window.num_days()
        )));
    }
    Ok(window)
}

#[utoipa::path(
    get,
    path = "/api/routers/{router_id}/uptime",
    tag = "availability",
    params(
        ("router_id" = i64, Path, description = "Router id"),
        WindowQuery
    ),
    responses(
        (status = 200, description = "Uptime over the window", body = UptimeResponse),
        (status = 400, description = "Invalid window"),
        (status = 404, description = "Router not found"),
        (status = 502, description = "Malformed status rows"),
        (status = 503, description = "Status data source unavailable")
    )
)]
pub(crate) async fn router_uptime(
    State(state): State<AppState>,
    Path(router_id): Path<DeviceId>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<UptimeResponse>> {
    let window = resolve_window(
        query.start.as_deref(),
        query.end.as_deref(),
        state.config.max_window(),
    )?;
    find_device(state.source.as_ref(), router_id).await?;

    let coalesced = device_downtime(state.source.as_ref(), router_id, &window).await?;
    let summary = summarize(router_id, &coalesced, &window);
    Ok(Json(UptimeResponse {
        uptime_percentage: round2(summary.uptime_percentage),
    }))
}

#[utoipa::path(
    get,
    path = "/api/routers/{router_id}/downtimes",
    tag = "availability",
    params(
        ("router_id" = i64, Path, description = "Router id"),
        WindowQuery
    ),
    responses(
        (status = 200, description = "Coalesced downtime intervals", body = DowntimeResponse),
        (status = 400, description = "Invalid window"),
        (status = 404, description = "Router not found"),
        (status = 502, description = "Malformed status rows"),
        (status = 503, description = "Status data source unavailable")
    )
)]
pub(crate) async fn router_downtimes(
    State(state): State<AppState>,
    Path(router_id): Path<DeviceId>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<DowntimeResponse>> {
    let window = resolve_window(
        query.start.as_deref(),
        query.end.as_deref(),
        state.config.max_window(),
    )?;
    find_device(state.source.as_ref(), router_id).await?;

    let coalesced = device_downtime(state.source.as_ref(), router_id, &window).await?;
    let downtimes: Vec<DowntimeEntry> = coalesced
        .intervals
        .iter()
        .map(DowntimeEntry::from)
        .collect();
    let total_downtime_seconds: i64 = downtimes.iter().map(|entry| entry.duration_seconds).sum();

    Ok(Json(DowntimeResponse {
        total_downtime_seconds,
        total_downtime_minutes: round2(coalesced.total_downtime_seconds / 60.0),
        downtimes,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/routers/{router_id}/uptime", get(router_uptime))
        .route("/routers/{router_id}/downtimes", get(router_downtimes))
}
