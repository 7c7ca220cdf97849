use chrono::{DateTime, Duration, Utc};

use super::types::{DeviceId, DeviceStatus, LivenessResult, Observation, StaleReason};

/// Decides what a router's status is right now from its latest report.
///
/// An `online` report older than `stale_after` no longer counts as proof of
/// life and is downgraded to offline. An explicit `offline` report is taken
/// at face value regardless of age.
pub fn classify(
    device_id: DeviceId,
    last_observation: Option<&Observation>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> LivenessResult {
    let Some(observation) = last_observation else {
        return LivenessResult {
            device_id,
            effective_status: DeviceStatus::Offline,
            last_update: None,
            stale: true,
            stale_reason: Some(StaleReason::NoData),
        };
    };

    let (effective_status, stale_reason) = match observation.status {
        DeviceStatus::Online if now - observation.timestamp > stale_after => {
            (DeviceStatus::Offline, Some(StaleReason::HeartbeatOverdue))
        }
        DeviceStatus::Online => (DeviceStatus::Online, None),
        DeviceStatus::Offline => (DeviceStatus::Offline, None),
    };

    LivenessResult {
        device_id,
        effective_status,
        last_update: Some(observation.timestamp),
        stale: stale_reason.is_some(),
        stale_reason,
    }
}
