//! Availability interval engine: downtime coalescing, liveness and fleet
//! ranking over router status observations.

mod coalesce;
mod error;
pub mod fleet;
pub mod format;
mod liveness;
pub mod source;
pub mod types;

pub use coalesce::coalesce;
pub use error::{AvailabilityError, DataSourceError};
pub use liveness::classify;
pub use source::{find_device, Device, ObservationSource, OfflineEvent, PgObservationSource};
pub use types::{
    CoalescedDowntime, DeviceAvailabilitySummary, DeviceId, DeviceStatus, DowntimeInterval,
    LivenessResult, Observation, StaleReason, Window,
};
