use super::types::{CoalescedDowntime, DeviceStatus, DowntimeInterval, Observation, Window};

/// Folds one router's observations into downtime intervals.
///
/// Observations are expected in ascending timestamp order and inside
/// `window`; filtering and ordering belong to the source. Out-of-order input
/// is consumed as given: each report is authoritative at its position and a
/// span that would run backwards counts as zero seconds.
///
/// When `assumed_initial` is offline the router is treated as down from
/// `window.start`. An outage still running after the last observation is
/// emitted as an open interval measured against `window.end`.
pub fn coalesce(
    observations: &[Observation],
    window: &Window,
    assumed_initial: DeviceStatus,
) -> CoalescedDowntime {
    let mut intervals = Vec::new();
    let mut offline_since = match assumed_initial {
        DeviceStatus::Offline => Some(window.start),
        DeviceStatus::Online => None,
    };
    let mut prev_status = assumed_initial;

    for observation in observations {
        match observation.status {
            DeviceStatus::Offline => {
                if prev_status != DeviceStatus::Offline && offline_since.is_none() {
                    offline_since = Some(observation.timestamp);
                }
            }
            DeviceStatus::Online => {
                if let Some(since) = offline_since.take() {
                    intervals.push(DowntimeInterval::closed(since, observation.timestamp));
                }
            }
        }
        prev_status = observation.status;
    }

    if let Some(since) = offline_since {
        intervals.push(DowntimeInterval::open(since, window.end));
    }

    let total_downtime_seconds = intervals
        .iter()
        .map(|interval| interval.duration.num_milliseconds() as f64 / 1000.0)
        .sum();

    CoalescedDowntime {
        intervals,
        total_downtime_seconds,
    }
}
