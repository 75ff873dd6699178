use std::{collections::HashMap, sync::Arc};

use crate::error::ConfigurationError;
use crate::repository::{BackingRepository, RepositoryKind};

pub type SharedRepository = Arc<dyn BackingRepository>;

/// The configured repositories, in configuration order within each tier.
pub trait RepositoryRegistry: Send + Sync {
    fn list_local(&self) -> Vec<SharedRepository>;

    fn list_caches(&self) -> Vec<SharedRepository>;

    fn list_remotes(&self) -> Vec<SharedRepository>;

    fn resolve(&self, key: &str) -> Option<SharedRepository>;

    /// The remote a cache mirrors, if it is configured.
    fn own_remote_of(&self, cache: &dyn BackingRepository) -> Option<SharedRepository>;
}

/// Registry over a fixed list of repositories.
#[derive(Default)]
pub struct StaticRegistry {
    repositories: Vec<SharedRepository>,
    cache_remotes: HashMap<String, String>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a local or remote repository.
    pub fn register(&mut self, repository: SharedRepository) -> Result<(), ConfigurationError> {
        if repository.kind() == RepositoryKind::Cache {
            return Err(ConfigurationError::Invalid {
                message: format!(
                    "cache `{}` must be registered with its remote",
                    repository.key()
                ),
            });
        }
        self.insert(repository)
    }

    /// Registers a cache together with the key of the remote it mirrors.
    /// The remote may be registered later.
    pub fn register_cache(
        &mut self,
        cache: SharedRepository,
        remote_key: impl Into<String>,
    ) -> Result<(), ConfigurationError> {
        if cache.kind() != RepositoryKind::Cache {
            return Err(ConfigurationError::Invalid {
                message: format!("`{}` is not a cache repository", cache.key()),
            });
        }
        self.cache_remotes
            .insert(cache.key().to_string(), remote_key.into());
        self.insert(cache)
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with(mut self, repository: SharedRepository) -> Self {
        self.register(repository).expect("register repository");
        self
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_cache(mut self, cache: SharedRepository, remote_key: &str) -> Self {
        self.register_cache(cache, remote_key)
            .expect("register cache");
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    fn insert(&mut self, repository: SharedRepository) -> Result<(), ConfigurationError> {
        if self.resolve(repository.key()).is_some() {
            return Err(ConfigurationError::Invalid {
                message: format!("duplicate repository key `{}`", repository.key()),
            });
        }
        self.repositories.push(repository);
        Ok(())
    }

    fn of_kind(&self, kind: RepositoryKind) -> Vec<SharedRepository> {
        self.repositories
            .iter()
            .filter(|repo| repo.kind() == kind)
            .cloned()
            .collect()
    }
}

impl RepositoryRegistry for StaticRegistry {
    fn list_local(&self) -> Vec<SharedRepository> {
        self.of_kind(RepositoryKind::Local)
    }

    fn list_caches(&self) -> Vec<SharedRepository> {
        self.of_kind(RepositoryKind::Cache)
    }

    fn list_remotes(&self) -> Vec<SharedRepository> {
        self.of_kind(RepositoryKind::Remote)
    }

    fn resolve(&self, key: &str) -> Option<SharedRepository> {
        self.repositories
            .iter()
            .find(|repo| repo.key() == key)
            .cloned()
    }

    fn own_remote_of(&self, cache: &dyn BackingRepository) -> Option<SharedRepository> {
        let remote_key = self.cache_remotes.get(cache.key())?;
        self.resolve(remote_key)
            .filter(|repo| repo.kind() == RepositoryKind::Remote)
    }
}
