use crate::config::AvailabilityConfig;
use crate::services::availability::source::SourceFuture;
use crate::services::availability::{
    DataSourceError, Device, DeviceId, Observation, ObservationSource, OfflineEvent, Window,
};
use crate::state::AppState;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub fn test_config() -> AvailabilityConfig {
    AvailabilityConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        stale_after_seconds: 60,
        fleet_concurrency: 4,
        offenders_limit: 10,
        max_window_days: 31,
    }
}

pub fn test_state(source: MemoryObservationSource) -> AppState {
    AppState {
        config: test_config(),
        source: Arc::new(source),
    }
}

/// `2024-01-01 00:00:00 UTC` plus `minute` minutes.
pub fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("base timestamp")
        + Duration::minutes(minute)
}

pub fn device(id: DeviceId, name: &str) -> Device {
    Device {
        id,
        name: name.to_string(),
        ip_address: Some(format!("10.0.0.{id}")),
        location: Some("Main office".to_string()),
    }
}

type ErrorFactory = Box<dyn Fn() -> DataSourceError + Send + Sync>;

/// In-memory status log; observations must be supplied in timestamp order.
#[derive(Default)]
pub struct MemoryObservationSource {
    devices: Vec<Device>,
    observations: Vec<Observation>,
    offline_events: Vec<OfflineEvent>,
    failures: HashMap<DeviceId, ErrorFactory>,
    list_failure: bool,
}

impl MemoryObservationSource {
    pub fn new(devices: Vec<Device>, observations: Vec<Observation>) -> Self {
        Self {
            devices,
            observations,
            ..Self::default()
        }
    }

    pub fn failing_for(self, device_id: DeviceId) -> Self {
        self.with_error_for(device_id, || {
            DataSourceError::Unavailable("simulated outage".to_string())
        })
    }

    pub fn with_error_for(
        mut self,
        device_id: DeviceId,
        factory: impl Fn() -> DataSourceError + Send + Sync + 'static,
    ) -> Self {
        self.failures.insert(device_id, Box::new(factory));
        self
    }

    pub fn with_offline_events(mut self, events: Vec<OfflineEvent>) -> Self {
        self.offline_events = events;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.list_failure = true;
        self
    }

    fn check(&self, device_id: Option<DeviceId>) -> Result<(), DataSourceError> {
        if self.list_failure {
            return Err(DataSourceError::Unavailable("connection refused".to_string()));
        }
        match device_id.and_then(|id| self.failures.get(&id)) {
            Some(factory) => Err(factory()),
            None => Ok(()),
        }
    }

    fn latest_for(&self, device_id: DeviceId) -> Option<Observation> {
        self.observations
            .iter()
            .filter(|observation| observation.device_id == device_id)
            .max_by_key(|observation| observation.timestamp)
            .cloned()
    }
}

impl ObservationSource for MemoryObservationSource {
    fn list_devices(&self) -> SourceFuture<'_, Vec<Device>> {
        Box::pin(async move {
            self.check(None)?;
            Ok::<_, DataSourceError>(self.devices.clone())
        })
    }

    fn fetch_observations(
        &self,
        device_id: DeviceId,
        window: Window,
    ) -> SourceFuture<'_, Vec<Observation>> {
        Box::pin(async move {
            self.check(Some(device_id))?;
            let observations: Vec<Observation> = self
                .observations
                .iter()
                .filter(|observation| {
                    observation.device_id == device_id && window.contains(observation.timestamp)
                })
                .cloned()
                .collect();
            Ok::<_, DataSourceError>(observations)
        })
    }

    fn fetch_latest_observation(
        &self,
        device_id: DeviceId,
    ) -> SourceFuture<'_, Option<Observation>> {
        Box::pin(async move {
            self.check(Some(device_id))?;
            Ok::<_, DataSourceError>(self.latest_for(device_id))
        })
    }

    fn fetch_latest_observations(&self) -> SourceFuture<'_, Vec<Observation>> {
        Box::pin(async move {
            self.check(None)?;
            let mut ids: Vec<DeviceId> = self
                .observations
                .iter()
                .map(|observation| observation.device_id)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            let latest: Vec<Observation> =
                ids.into_iter().filter_map(|id| self.latest_for(id)).collect();
            Ok::<_, DataSourceError>(latest)
        })
    }

    fn fetch_offline_events_on(&self, day: NaiveDate) -> SourceFuture<'_, Vec<OfflineEvent>> {
        Box::pin(async move {
            self.check(None)?;
            let events: Vec<OfflineEvent> = self
                .offline_events
                .iter()
                .filter(|event| event.timestamp.date_naive() == day)
                .cloned()
                .collect();
            Ok::<_, DataSourceError>(events)
        })
    }
}
