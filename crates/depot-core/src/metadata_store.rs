use depot_domain::{RepoPath, SnapshotMetadataDocument};

use crate::error::{MetadataStoreError, StorageError};

/// Access to the metadata document and file listing of a snapshot version
/// directory.
///
/// Implementations must make `write` atomic per directory; callers that
/// read, compute and write must hold the directory's deploy lock.
pub trait MetadataStore: Send + Sync {
    /// The directory's current document; `Ok(None)` when there is none.
    fn read(
        &self,
        directory: &RepoPath,
    ) -> Result<Option<SnapshotMetadataDocument>, MetadataStoreError>;

    fn write(
        &self,
        directory: &RepoPath,
        document: &SnapshotMetadataDocument,
    ) -> Result<(), MetadataStoreError>;

    /// File names in the directory, sorted.
    fn list_sibling_names(&self, directory: &RepoPath) -> Result<Vec<String>, StorageError>;
}
