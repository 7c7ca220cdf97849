use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::pin::Pin;

use super::error::{AvailabilityError, DataSourceError};
use super::types::{DeviceId, DeviceStatus, Observation, Window};
use crate::time::{day_bounds, parse_source_timestamp};

pub type SourceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, DataSourceError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub ip_address: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineEvent {
    pub router: String,
    pub location: Option<String>,
    pub status: DeviceStatus,
    pub timestamp: DateTime<Utc>,
}

/// System of record for routers and their status log.
///
/// Implementations return observations sorted ascending by timestamp with
/// every timestamp already normalized; the engine never re-sorts or re-parses.
pub trait ObservationSource: Send + Sync {
    fn list_devices(&self) -> SourceFuture<'_, Vec<Device>>;

    /// Observations with `window.start <= timestamp < window.end`.
    fn fetch_observations(
        &self,
        device_id: DeviceId,
        window: Window,
    ) -> SourceFuture<'_, Vec<Observation>>;

    fn fetch_latest_observation(
        &self,
        device_id: DeviceId,
    ) -> SourceFuture<'_, Option<Observation>>;

    /// Latest observation of every router that has one.
    fn fetch_latest_observations(&self) -> SourceFuture<'_, Vec<Observation>>;

    /// Offline reports recorded on `day`, newest first.
    fn fetch_offline_events_on(&self, day: NaiveDate) -> SourceFuture<'_, Vec<OfflineEvent>>;
}

pub async fn find_device(
    source: &dyn ObservationSource,
    device_id: DeviceId,
) -> Result<Device, AvailabilityError> {
    source
        .list_devices()
        .await?
        .into_iter()
        .find(|device| device.id == device_id)
        .ok_or(AvailabilityError::UnknownDevice(device_id))
}

#[derive(Debug, Clone, FromRow)]
struct RouterRow {
    id: i64,
    name: String,
    ip_address: Option<String>,
    location: Option<String>,
}

/// `ts` is rendered with `to_char(.., 'YYYY-MM-DD HH24:MI:SS.US')` so the
/// text does not depend on the session `DateStyle`.
#[derive(Debug, Clone, FromRow)]
struct StatusLogRow {
    router_id: i64,
    status: String,
    ts: String,
}

impl TryFrom<StatusLogRow> for Observation {
    type Error = DataSourceError;

    fn try_from(row: StatusLogRow) -> Result<Self, Self::Error> {
        let timestamp =
            parse_source_timestamp(&row.ts).ok_or_else(|| DataSourceError::MalformedTimestamp {
                device_id: row.router_id,
                raw: row.ts.clone(),
            })?;
        let status =
            DeviceStatus::parse(&row.status).ok_or_else(|| DataSourceError::MalformedStatus {
                device_id: row.router_id,
                raw: row.status.clone(),
            })?;
        Ok(Observation::new(row.router_id, timestamp, status))
    }
}

#[derive(Debug, Clone, FromRow)]
struct OfflineEventRow {
    router_id: i64,
    router: String,
    location: Option<String>,
    status: String,
    ts: String,
}

impl TryFrom<OfflineEventRow> for OfflineEvent {
    type Error = DataSourceError;

    fn try_from(row: OfflineEventRow) -> Result<Self, Self::Error> {
        let observation = Observation::try_from(StatusLogRow {
            router_id: row.router_id,
            status: row.status,
            ts: row.ts,
        })?;
        Ok(OfflineEvent {
            router: row.router,
            location: row.location,
            status: observation.status,
            timestamp: observation.timestamp,
        })
    }
}

fn into_observations(rows: Vec<StatusLogRow>) -> Result<Vec<Observation>, DataSourceError> {
    rows.into_iter().map(Observation::try_from).collect()
}

fn query_failed(err: sqlx::Error, what: &str) -> DataSourceError {
    tracing::error!(error = %err, query = what, "status log query failed");
    DataSourceError::from(err)
}

/// Postgres-backed source over the `routers` and `router_status_log` tables.
#[derive(Debug, Clone)]
pub struct PgObservationSource {
    pool: PgPool,
}

impl PgObservationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_devices_inner(&self) -> Result<Vec<Device>, DataSourceError> {
        let rows: Vec<RouterRow> = sqlx::query_as(
            r#"
            SELECT id, name, ip_address, location
            FROM routers
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| query_failed(err, "list_devices"))?;

        Ok(rows
            .into_iter()
            .map(|row| Device {
                id: row.id,
                name: row.name,
                ip_address: row.ip_address,
                location: row.location,
            })
            .collect())
    }

    async fn fetch_observations_inner(
        &self,
        device_id: DeviceId,
        window: Window,
    ) -> Result<Vec<Observation>, DataSourceError> {
        let rows: Vec<StatusLogRow> = sqlx::query_as(
            r#"
            SELECT
                router_id,
                status,
                to_char("timestamp", 'YYYY-MM-DD HH24:MI:SS.US') AS ts
            FROM router_status_log
            WHERE router_id = $1
              AND "timestamp" >= $2
              AND "timestamp" < $3
            ORDER BY "timestamp" ASC
            "#,
        )
        .bind(device_id)
        .bind(window.start.naive_utc())
        .bind(window.end.naive_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| query_failed(err, "fetch_observations"))?;

        tracing::debug!(device_id, rows = rows.len(), "fetched status rows");
        into_observations(rows)
    }

    async fn fetch_latest_observation_inner(
        &self,
        device_id: DeviceId,
    ) -> Result<Option<Observation>, DataSourceError> {
        let row: Option<StatusLogRow> = sqlx::query_as(
            r#"
            SELECT
                router_id,
                status,
                to_char("timestamp", 'YYYY-MM-DD HH24:MI:SS.US') AS ts
            FROM router_status_log
            WHERE router_id = $1
            ORDER BY "timestamp" DESC
            LIMIT 1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| query_failed(err, "fetch_latest_observation"))?;

        row.map(Observation::try_from).transpose()
    }

    async fn fetch_latest_observations_inner(&self) -> Result<Vec<Observation>, DataSourceError> {
        let rows: Vec<StatusLogRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT ON (router_id)
                router_id,
                status,
                to_char("timestamp", 'YYYY-MM-DD HH24:MI:SS.US') AS ts
            FROM router_status_log
            ORDER BY router_id, "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| query_failed(err, "fetch_latest_observations"))?;

        into_observations(rows)
    }

    async fn fetch_offline_events_on_inner(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<OfflineEvent>, DataSourceError> {
        let (start, end) = day_bounds(day)
            .ok_or_else(|| DataSourceError::Unavailable(format!("invalid report day {day}")))?;
        let rows: Vec<OfflineEventRow> = sqlx::query_as(
            r#"
            SELECT
                l.router_id,
                r.name AS router,
                r.location,
                l.status,
                to_char(l."timestamp", 'YYYY-MM-DD HH24:MI:SS.US') AS ts
            FROM router_status_log l
            JOIN routers r ON r.id = l.router_id
            WHERE l."timestamp" >= $1
              AND l."timestamp" < $2
              AND lower(trim(l.status)) = 'offline'
            ORDER BY l."timestamp" DESC
            "#,
        )
        .bind(start.naive_utc())
        .bind(end.naive_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| query_failed(err, "fetch_offline_events_on"))?;

        rows.into_iter().map(OfflineEvent::try_from).collect()
    }
}

impl ObservationSource for PgObservationSource {
    fn list_devices(&self) -> SourceFuture<'_, Vec<Device>> {
        Box::pin(self.list_devices_inner())
    }

    fn fetch_observations(
        &self,
        device_id: DeviceId,
        window: Window,
    ) -> SourceFuture<'_, Vec<Observation>> {
        Box::pin(self.fetch_observations_inner(device_id, window))
    }

    fn fetch_latest_observation(
        &self,
        device_id: DeviceId,
    ) -> SourceFuture<'_, Option<Observation>> {
        Box::pin(self.fetch_latest_observation_inner(device_id))
    }

    fn fetch_latest_observations(&self) -> SourceFuture<'_, Vec<Observation>> {
        Box::pin(self.fetch_latest_observations_inner())
    }

    fn fetch_offline_events_on(&self, day: NaiveDate) -> SourceFuture<'_, Vec<OfflineEvent>> {
        Box::pin(self.fetch_offline_events_on_inner(day))
    }
}
