use std::sync::Arc;

use clinica_config::ClinicSettings;
use clinica_scheduling::{AvailabilityCalculator, BookingEngine, LifecycleManager};
use clinica_storage::ClinicStore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClinicStore>,
    pub settings: Arc<ClinicSettings>,
    pub booking: BookingEngine,
    pub lifecycle: LifecycleManager,
    pub availability: AvailabilityCalculator,
}

impl AppState {
    /// Wires the engines onto a storage backend.
    pub fn new(store: Arc<dyn ClinicStore>, settings: Arc<ClinicSettings>) -> Self {
        Self {
            booking: BookingEngine::new(store.clone()),
            lifecycle: LifecycleManager::new(
                store.clone(),
                settings.cancellation_policy.clone(),
            ),
            availability: AvailabilityCalculator::new(store.clone(), settings.clone()),
            store,
            settings,
        }
    }
}
