use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::routes::availability::resolve_window;
use crate::services::availability::fleet::rank_fleet;
use crate::services::availability::format::{humanize, round2};
use crate::services::availability::{AvailabilityError, DeviceId, OfflineEvent};
use crate::state::AppState;
use crate::time::{day_bounds, format_report_date, parse_report_day};

const MAX_OFFENDERS_LIMIT: u32 = 500;

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct OffendersQuery {
    pub(crate) start: Option<String>,
    pub(crate) end: Option<String>,
    /// Defaults to the configured offenders limit; capped at 500.
    pub(crate) limit: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct OffenderEntry {
    pub(crate) router: String,
    pub(crate) router_id: i64,
    pub(crate) downtime_minutes: f64,
    pub(crate) downtime_hm: String,
    pub(crate) downtime_pct: f64,
    pub(crate) uptime_pct: f64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct OffendersResponse {
    pub(crate) offenders: Vec<OffenderEntry>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct DailyReportQuery {
    /// Report day as `YYYY-MM-DD`.
    pub(crate) date: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct DailyReportEntry {
    pub(crate) router: String,
    pub(crate) location: Option<String>,
    pub(crate) status: String,
    /// `MM/DD/YY`.
    pub(crate) date: String,
}

impl From<OfflineEvent> for DailyReportEntry {
    fn from(event: OfflineEvent) -> Self {
        Self {
            router: event.router,
            location: event.location,
            status: event.status.as_str().to_string(),
            date: format_report_date(event.timestamp),
        }
    }
}

fn offenders_limit(state: &AppState, requested: Option<u32>) -> AppResult<usize> {
    match requested {
        None => Ok(state.config.offenders_limit),
        Some(0) => Err(AppError::bad_request("limit must be at least 1")),
        Some(limit) => Ok(limit.min(MAX_OFFENDERS_LIMIT) as usize),
    }
}

#[utoipa::path(
    get,
    path = "/api/reports/offenders",
    tag = "reports",
    params(OffendersQuery),
    responses(
        (status = 200, description = "Routers ranked worst first", body = OffendersResponse),
        (status = 400, description = "Invalid window or limit"),
        (status = 502, description = "Malformed status rows"),
        (status = 503, description = "Status data source unavailable")
    )
)]
pub(crate) async fn offenders(
    State(state): State<AppState>,
    Query(query): Query<OffendersQuery>,
) -> AppResult<Json<OffendersResponse>> {
    let window = resolve_window(
        query.start.as_deref(),
        query.end.as_deref(),
        state.config.max_window(),
    )?;
    let limit = offenders_limit(&state, query.limit)?;

    let devices = state
        .source
        .list_devices()
        .await
        .map_err(AvailabilityError::from)?;
    let device_ids: Vec<DeviceId> = devices.iter().map(|device| device.id).collect();
    let names: HashMap<DeviceId, String> = devices
        .into_iter()
        .map(|device| (device.id, device.name))
        .collect();

    let summaries = rank_fleet(
        state.source.as_ref(),
        &device_ids,
        &window,
        state.config.fleet_concurrency,
    )
    .await?;

    let offenders = summaries
        .into_iter()
        .take(limit)
        .map(|summary| {
            let downtime_minutes = summary.downtime_minutes();
            OffenderEntry {
                router: names.get(&summary.device_id).cloned().unwrap_or_default(),
                router_id: summary.device_id,
                downtime_minutes: round2(downtime_minutes),
                downtime_hm: humanize(downtime_minutes),
                downtime_pct: round2(summary.downtime_percentage),
                uptime_pct: round2(summary.uptime_percentage),
            }
        })
        .collect();

    Ok(Json(OffendersResponse { offenders }))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "reports",
    params(DailyReportQuery),
    responses(
        (status = 200, description = "Offline reports of the day", body = Vec<DailyReportEntry>),
        (status = 400, description = "Missing or invalid date"),
        (status = 503, description = "Status data source unavailable")
    )
)]
pub(crate) async fn daily_report(
    State(state): State<AppState>,
    Query(query): Query<DailyReportQuery>,
) -> AppResult<Json<Vec<DailyReportEntry>>> {
    let day = query
        .date
        .as_deref()
        .and_then(parse_report_day)
        .ok_or_else(|| AppError::bad_request("date must be YYYY-MM-DD"))?;
    if day_bounds(day).is_none() {
        return Err(AppError::bad_request("date is out of range"));
    }

    let events = state
        .source
        .fetch_offline_events_on(day)
        .await
        .map_err(AvailabilityError::from)?;
    Ok(Json(events.into_iter().map(DailyReportEntry::from).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(daily_report))
        .route("/reports/offenders", get(offenders))
}
