use depot_domain::maven::{is_checksum_path, is_metadata_path, snapshot_directory_of};
use depot_domain::{MavenArtifactPath, RepoPath, SnapshotMetadataDocument, SnapshotPolicy};
use tracing::debug;

use super::allocator::BuildNumberAllocator;
use crate::clock::Clock;
use crate::error::DeployError;
use crate::metadata_store::MetadataStore;

/// Maps deployment targets onto the naming the owning repository's
/// snapshot policy asks for.
pub struct SnapshotPathRewriter<'a> {
    allocator: BuildNumberAllocator<'a>,
}

impl<'a> SnapshotPathRewriter<'a> {
    pub fn new(store: &'a dyn MetadataStore, clock: &'a dyn Clock) -> Self {
        Self {
            allocator: BuildNumberAllocator::new(store, clock),
        }
    }

    /// The path an artifact deployed at `path` is stored under.
    ///
    /// Checksums, metadata files and anything outside a snapshot version
    /// directory come back unchanged.
    pub fn rewrite_for_deployment(
        &self,
        path: &RepoPath,
        policy: SnapshotPolicy,
        client_used_non_unique: bool,
    ) -> Result<RepoPath, DeployError> {
        if is_checksum_path(path.path()) || is_metadata_path(path.path()) {
            return Ok(path.clone());
        }
        let Some(file) = MavenArtifactPath::parse(path.path()).and_then(|p| p.snapshot_file())
        else {
            return Ok(path.clone());
        };

        if policy.is_effectively_non_unique(client_used_non_unique) {
            return Ok(path.with_name(&file.into_non_unique().to_string()));
        }
        if policy != SnapshotPolicy::Unique || file.is_unique() {
            return Ok(path.clone());
        }

        let Some(directory) = path.parent() else {
            return Ok(path.clone());
        };
        let build_number = self.allocator.next_build_number(&directory, &file)?;
        let timestamp = self.allocator.timestamp_for(&directory, build_number)?;
        let rewritten = path.with_name(&file.into_unique(timestamp, build_number).to_string());
        debug!(from = %path, to = %rewritten, "unique snapshot name assigned");
        Ok(rewritten)
    }

    /// Adjusts the snapshot pointer of a metadata document deployed at `path`.
    pub fn rewrite_metadata_for_deployment(
        &self,
        path: &RepoPath,
        mut document: SnapshotMetadataDocument,
        policy: SnapshotPolicy,
        client_used_non_unique: bool,
    ) -> Result<SnapshotMetadataDocument, DeployError> {
        let directory = snapshot_directory_of(path)
            .filter(|_| is_metadata_path(path.path()) && !is_checksum_path(path.path()))
            .ok_or_else(|| DeployError::NotSnapshotMetadata {
                path: path.to_string(),
            })?;

        if policy.is_effectively_non_unique(client_used_non_unique) {
            if let Some(pointer) = document.snapshot.as_mut() {
                pointer.timestamp = None;
            }
            return Ok(document);
        }
        if policy != SnapshotPolicy::Unique {
            return Ok(document);
        }

        let build_number = self.allocator.next_metadata_build_number(&directory)?;
        let pointer = document.snapshot.get_or_insert_with(Default::default);
        pointer.build_number = build_number;
        if pointer.timestamp.is_none() {
            pointer.timestamp = Some(self.allocator.timestamp_for(&directory, build_number)?);
        }
        debug!(dir = %directory, build_number, "metadata pointer rewritten");
        Ok(document)
    }
}
