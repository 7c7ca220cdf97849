use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::availability::AvailabilityError;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        let (status, message) = map_availability_error(err);
        Self::new(status, message)
    }
}

/// Maps engine failures to responses. A source outage is surfaced as such
/// instead of being reported as zero downtime.
pub fn map_availability_error(err: AvailabilityError) -> (StatusCode, String) {
    let status = match &err {
        AvailabilityError::InvalidWindow { .. } => StatusCode::BAD_REQUEST,
        AvailabilityError::UnknownDevice(_) => StatusCode::NOT_FOUND,
        AvailabilityError::DataSourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AvailabilityError::MalformedTimestamp { .. }
        | AvailabilityError::MalformedStatus { .. } => StatusCode::BAD_GATEWAY,
    };

    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
            tracing::debug!(error = %err, status = %status, "rejected availability request");
            (status, err.to_string())
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            tracing::error!(error = %err, status = %status, "status log unavailable");
            (status, "Status data source unavailable".to_string())
        }
        _ => {
            tracing::error!(error = %err, status = %status, "corrupt status log data");
            (status, "Status data source returned malformed rows".to_string())
        }
    }
}
