use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::error::AvailabilityError;

pub type DeviceId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("online") {
            Some(Self::Online)
        } else if trimmed.eq_ignore_ascii_case("offline") {
            Some(Self::Offline)
        } else {
            None
        }
    }
}

/// A single status report for one device, already normalized by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub device_id: DeviceId,
    pub timestamp: DateTime<Utc>,
    pub status: DeviceStatus,
}

impl Observation {
    pub fn new(device_id: DeviceId, timestamp: DateTime<Utc>, status: DeviceStatus) -> Self {
        Self {
            device_id,
            timestamp,
            status,
        }
    }
}

/// Half-open evaluation range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AvailabilityError> {
        if end < start {
            return Err(AvailabilityError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 1000.0
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// A contiguous offline span. `end == None` means the device was still down
/// when the window closed; its duration is measured against the window end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DowntimeInterval {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub duration: Duration,
}

impl DowntimeInterval {
    pub(crate) fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
            duration: non_negative(end - start),
        }
    }

    pub(crate) fn open(start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            duration: non_negative(window_end - start),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration.num_seconds()
    }
}

fn non_negative(duration: Duration) -> Duration {
    if duration < Duration::zero() {
        Duration::zero()
    } else {
        duration
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoalescedDowntime {
    pub intervals: Vec<DowntimeInterval>,
    pub total_downtime_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceAvailabilitySummary {
    pub device_id: DeviceId,
    pub total_downtime_seconds: f64,
    pub downtime_percentage: f64,
    pub uptime_percentage: f64,
}

impl DeviceAvailabilitySummary {
    pub fn downtime_minutes(&self) -> f64 {
        self.total_downtime_seconds / 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    NoData,
    HeartbeatOverdue,
}

impl StaleReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no data",
            Self::HeartbeatOverdue => "heartbeat overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessResult {
    pub device_id: DeviceId,
    pub effective_status: DeviceStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub stale: bool,
    pub stale_reason: Option<StaleReason>,
}
