//! Shared request state

use std::sync::Arc;

use hadir_config::AppConfig;
use hadir_store::Backend;

use crate::admin::AdminService;
use crate::checkin::CheckInService;
use crate::export::ExportContext;

pub struct AppState {
    pub config: AppConfig,
    pub backend: Backend,
    pub checkin: CheckInService,
    pub admin: AdminService,
    pub export: ExportContext,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Backend) -> Arc<Self> {
        Arc::new(Self {
            checkin: CheckInService::new(backend.clone(), &config),
            admin: AdminService::new(backend.clone(), &config),
            export: ExportContext::from_config(&config.event),
            backend,
            config,
        })
    }
}
