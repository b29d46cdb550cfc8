//! Repository factory for dependency injection.
//!
//! Selects and builds the storage backend named in configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::config::RepositorySettings;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "memory").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" | "in-memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Read `REPOSITORY_TYPE`, defaulting to Local.
    pub fn from_env() -> Result<Self, String> {
        match std::env::var("REPOSITORY_TYPE") {
            Ok(val) => val.parse(),
            Err(_) => Ok(Self::Local),
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use giftech_admin::db::{RepositoryFactory, RepositoryType};
///
/// let repo = RepositoryFactory::create(RepositoryType::Local);
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    pub fn create(repo_type: RepositoryType) -> Arc<dyn FullRepository> {
        match repo_type {
            RepositoryType::Local => Self::create_local(),
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create the repository described by the `[repository]` config section.
    pub fn from_settings(settings: &RepositorySettings) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = RepositoryType::from_str(&settings.repo_type).map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        Ok(Self::create(repo_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(RepositoryType::from_str("local").unwrap(), RepositoryType::Local);
        assert_eq!(RepositoryType::from_str("Memory").unwrap(), RepositoryType::Local);
        assert!(RepositoryType::from_str("mongodb").is_err());
    }

    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_from_settings_rejects_unknown_backend() {
        let settings = RepositorySettings {
            repo_type: "cassandra".to_string(),
        };
        let err = RepositoryFactory::from_settings(&settings).err().unwrap();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

        let settings = RepositorySettings {
            repo_type: "local".to_string(),
        };
        let repo = RepositoryFactory::from_settings(&settings).unwrap();
        assert!(repo.health_check().await.unwrap());
    }
}
