use std::sync::Arc;

use axum::Router;
use shopfloor_core::Module;

use crate::api;
use crate::service::MachineService;

/// Machine module: block registry, documents, QC forms and completion.
pub struct MachineModule {
    service: Arc<MachineService>,
}

impl MachineModule {
    pub fn new(service: MachineService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> Arc<MachineService> {
        self.service.clone()
    }
}

impl Module for MachineModule {
    fn name(&self) -> &str {
        "machine"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
