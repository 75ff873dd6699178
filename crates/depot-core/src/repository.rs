use std::{fmt, io::Read};

use depot_domain::ResourceDescriptor;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryKind {
    Local,
    Cache,
    Remote,
}

impl RepositoryKind {
    /// Locals and caches form the local tier; their hits beat remote fetches.
    #[must_use]
    pub fn is_local_tier(self) -> bool {
        matches!(self, Self::Local | Self::Cache)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cache => "cache",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One store consulted during resolution.
///
/// `describe` and `open` may be called concurrently for distinct
/// repositories, hence `Send + Sync`.
pub trait BackingRepository: Send + Sync {
    fn key(&self) -> &str;

    fn kind(&self) -> RepositoryKind;

    fn describe(&self, path: &str) -> Result<ResourceDescriptor, StorageError>;

    fn open(&self, descriptor: &ResourceDescriptor) -> Result<Box<dyn Read + Send>, StorageError>;

    fn handles_releases(&self) -> bool {
        true
    }

    fn handles_snapshots(&self) -> bool {
        true
    }

    fn is_local(&self) -> bool {
        self.kind() == RepositoryKind::Local
    }

    fn is_cache(&self) -> bool {
        self.kind() == RepositoryKind::Cache
    }
}

impl fmt::Debug for dyn BackingRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingRepository")
            .field("key", &self.key())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Reads the whole content behind `descriptor`.
pub(crate) fn read_all(
    repository: &dyn BackingRepository,
    descriptor: &ResourceDescriptor,
) -> Result<Vec<u8>, StorageError> {
    let mut reader = repository.open(descriptor)?;
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).map_err(|err| {
        StorageError::unavailable(repository.key(), descriptor.repo_path.path(), err)
    })?;
    Ok(buffer)
}
