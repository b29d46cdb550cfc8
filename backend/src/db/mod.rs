//! Database module for GIFTECH administrative data.
//!
//! Storage is reached through the Repository pattern so backends can be
//! swapped without touching handlers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers                                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Business Logic           │
//! │  - Input validation                                     │
//! │  - Reference checks                                     │
//! │  - Timetable conflict reporting                         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use giftech_admin::db::{services, RepositoryFactory};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let repo = RepositoryFactory::create_local();
//!     let faculty = services::list_faculty(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;
pub mod services;


pub use services::{
    check_assignment, create_assignment, delete_assignment, health_check, list_timetable,
    update_assignment, TimetableError,
};

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
pub use repository::{
    AssignmentWrite, AuditRepository, ErrorContext, FacultyRepository, FinanceRepository,
    FullRepository, PartnerRepository, RepositoryError, RepositoryResult, ScholarshipRepository,
    SchoolRepository, StudentRepository, TimetableRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

use crate::config::RepositorySettings;

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton for the configured backend.
///
/// Later calls are no-ops.
pub fn init_repository(settings: &RepositorySettings) -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = RepositoryFactory::from_settings(settings)
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
