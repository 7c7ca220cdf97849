use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{availability, health, reports, routers};
use crate::services::availability::DeviceStatus;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Router availability API",
        description = "Uptime, downtime intervals, liveness and offender rankings for routers."
    ),
    paths(
        health::healthz_handler,
        health::readyz_handler,
        routers::list_routers,
        routers::router_status,
        availability::router_uptime,
        availability::router_downtimes,
        reports::offenders,
        reports::daily_report,
    ),
    components(schemas(
        DeviceStatus,
        health::HealthResponse,
        routers::RouterStatusResponse,
        routers::RoutersListResponse,
        availability::UptimeResponse,
        availability::DowntimeEntry,
        availability::DowntimeResponse,
        reports::OffenderEntry,
        reports::OffendersResponse,
        reports::DailyReportEntry,
    )),
    tags(
        (name = "health"),
        (name = "routers"),
        (name = "availability"),
        (name = "reports")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or(serde_json::Value::Null)
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = openapi_json();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/healthz",
            "/readyz",
            "/api/routers",
            "/api/routers/{router_id}/status",
            "/api/routers/{router_id}/uptime",
            "/api/routers/{router_id}/downtimes",
            "/api/reports/offenders",
            "/api/reports",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
