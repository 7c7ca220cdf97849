use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::DeviceId;

/// Failures reported by an observation source.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("router {device_id} has an unparseable timestamp {raw:?}")]
    MalformedTimestamp { device_id: DeviceId, raw: String },

    #[error("router {device_id} has an unknown status {raw:?}")]
    MalformedStatus { device_id: DeviceId, raw: String },
}

impl From<sqlx::Error> for DataSourceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("window end {end} is before start {start}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("{}", unavailable_message(*device_id, message))]
    DataSourceUnavailable {
        device_id: Option<DeviceId>,
        message: String,
    },

    #[error("router {device_id} has an unparseable timestamp {raw:?}")]
    MalformedTimestamp { device_id: DeviceId, raw: String },

    #[error("router {device_id} has an unknown status {raw:?}")]
    MalformedStatus { device_id: DeviceId, raw: String },

    #[error("router {0} not found")]
    UnknownDevice(DeviceId),
}

fn unavailable_message(device_id: Option<DeviceId>, message: &str) -> String {
    match device_id {
        Some(id) => format!("data source unavailable for router {id}: {message}"),
        None => format!("data source unavailable: {message}"),
    }
}

impl AvailabilityError {
    /// Attaches the router being fetched when the source itself did not know it.
    pub fn for_device(self, id: DeviceId) -> Self {
        match self {
            Self::DataSourceUnavailable {
                device_id: None,
                message,
            } => Self::DataSourceUnavailable {
                device_id: Some(id),
                message,
            },
            other => other,
        }
    }
}

impl From<DataSourceError> for AvailabilityError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::Unavailable(message) => Self::DataSourceUnavailable {
                device_id: None,
                message,
            },
            DataSourceError::MalformedTimestamp { device_id, raw } => {
                Self::MalformedTimestamp { device_id, raw }
            }
            DataSourceError::MalformedStatus { device_id, raw } => {
                Self::MalformedStatus { device_id, raw }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_device_names_the_failing_router() {
        let err = AvailabilityError::from(DataSourceError::Unavailable("timeout".to_string()))
            .for_device(7);
        assert_eq!(
            err.to_string(),
            "data source unavailable for router 7: timeout"
        );
    }

    #[test]
    fn for_device_keeps_malformed_rows_untouched() {
        let err = AvailabilityError::from(DataSourceError::MalformedTimestamp {
            device_id: 3,
            raw: "yesterday".to_string(),
        })
        .for_device(9);
        assert!(matches!(
            err,
            AvailabilityError::MalformedTimestamp { device_id: 3, .. }
        ));
    }
}
