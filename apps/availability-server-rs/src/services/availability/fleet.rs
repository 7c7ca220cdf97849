use futures::stream::{self, StreamExt, TryStreamExt};

use super::coalesce::coalesce;
use super::error::AvailabilityError;
use super::source::ObservationSource;
use super::types::{
    CoalescedDowntime, DeviceAvailabilitySummary, DeviceId, DeviceStatus, Observation, Window,
};

/// Routers with no earlier record are assumed to start every window up.
pub const ASSUMED_INITIAL_STATUS: DeviceStatus = DeviceStatus::Online;

/// `(downtime %, uptime %)`, both clamped to `[0, 100]`; a zero-length
/// window reports `(0, 0)`.
pub fn percentages(total_downtime_seconds: f64, window: &Window) -> (f64, f64) {
    let window_seconds = window.duration_seconds();
    if window_seconds <= 0.0 {
        return (0.0, 0.0);
    }
    let downtime = (total_downtime_seconds / window_seconds * 100.0).clamp(0.0, 100.0);
    let uptime = (100.0 - downtime).clamp(0.0, 100.0);
    (downtime, uptime)
}

pub fn summarize(
    device_id: DeviceId,
    coalesced: &CoalescedDowntime,
    window: &Window,
) -> DeviceAvailabilitySummary {
    let (downtime_percentage, uptime_percentage) =
        percentages(coalesced.total_downtime_seconds, window);
    DeviceAvailabilitySummary {
        device_id,
        total_downtime_seconds: coalesced.total_downtime_seconds,
        downtime_percentage,
        uptime_percentage,
    }
}

/// Worst offenders first. The sort is stable, so equal downtime keeps the
/// order the routers were listed in.
pub fn rank(mut summaries: Vec<DeviceAvailabilitySummary>) -> Vec<DeviceAvailabilitySummary> {
    summaries.sort_by(|a, b| b.total_downtime_seconds.total_cmp(&a.total_downtime_seconds));
    summaries
}

pub fn rank_observations(
    per_device: &[(DeviceId, Vec<Observation>)],
    window: &Window,
) -> Vec<DeviceAvailabilitySummary> {
    let summaries = per_device
        .iter()
        .map(|(device_id, observations)| {
            let coalesced = coalesce(observations, window, ASSUMED_INITIAL_STATUS);
            summarize(*device_id, &coalesced, window)
        })
        .collect();
    rank(summaries)
}

pub async fn device_downtime(
    source: &dyn ObservationSource,
    device_id: DeviceId,
    window: &Window,
) -> Result<CoalescedDowntime, AvailabilityError> {
    let observations = source
        .fetch_observations(device_id, *window)
        .await
        .map_err(|err| AvailabilityError::from(err).for_device(device_id))?;
    Ok(coalesce(&observations, window, ASSUMED_INITIAL_STATUS))
}

/// Fetches every router's observations (at most `concurrency` in flight)
/// and ranks them. Any fetch failure fails the whole ranking.
pub async fn rank_fleet(
    source: &dyn ObservationSource,
    device_ids: &[DeviceId],
    window: &Window,
    concurrency: usize,
) -> Result<Vec<DeviceAvailabilitySummary>, AvailabilityError> {
    let window = *window;
    let per_device: Vec<(DeviceId, Vec<Observation>)> = stream::iter(device_ids.iter().copied())
        .map(move |device_id| async move {
            source
                .fetch_observations(device_id, window)
                .await
                .map(|observations| (device_id, observations))
                .map_err(|err| {
                    tracing::warn!(device_id, error = %err, "fleet ranking aborted");
                    AvailabilityError::from(err).for_device(device_id)
                })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    tracing::debug!(devices = per_device.len(), "ranking fleet downtime");
    Ok(rank_observations(&per_device, &window))
}
