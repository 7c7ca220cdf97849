use crate::config::AvailabilityConfig;
use crate::services::availability::ObservationSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AvailabilityConfig,
    pub source: Arc<dyn ObservationSource>,
}
