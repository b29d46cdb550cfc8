//! Application state for the HTTP server.

use crate::db::repository::FullRepository;
use crate::services::AccessGranter;
use std::sync::Arc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository holding the administrative records
    pub repository: Arc<dyn FullRepository>,
    /// Absent when no access-grant credentials are configured
    pub access_granter: Option<Arc<AccessGranter>>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            access_granter: None,
        }
    }

    pub fn with_access_granter(mut self, granter: Arc<AccessGranter>) -> Self {
        self.access_granter = Some(granter);
        self
    }

    pub fn repo(&self) -> &dyn FullRepository {
        self.repository.as_ref()
    }
}
