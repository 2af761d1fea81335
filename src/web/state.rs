use std::sync::Arc;
use std::time::Duration;

use crate::database::TableStore;
use crate::models::WorkshopCatalog;
use crate::services::form_flow_service::FlowContext;
use crate::services::registrations_cache::RegistrationsCache;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TableStore>,
    pub cache: Arc<RegistrationsCache>,
    pub catalog: Arc<WorkshopCatalog>,
    pub reset_delay: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TableStore>,
        cache: Arc<RegistrationsCache>,
        catalog: WorkshopCatalog,
        reset_delay: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            catalog: Arc::new(catalog),
            reset_delay,
        }
    }

    pub fn flow_context(&self) -> FlowContext<'_> {
        FlowContext {
            store: self.store.as_ref(),
            cache: &self.cache,
            catalog: &self.catalog,
        }
    }
}
