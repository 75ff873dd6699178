use depot_domain::maven::format_snapshot_timestamp;
use depot_domain::{RepoPath, SnapshotFileName};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{DeployError, MetadataStoreError, StorageError};
use crate::metadata_store::MetadataStore;

/// Hands out build numbers and timestamps for one snapshot version directory.
///
/// Not race-free on its own: callers must hold the directory's deploy lock
/// across "read metadata, allocate, write".
pub struct BuildNumberAllocator<'a> {
    store: &'a dyn MetadataStore,
    clock: &'a dyn Clock,
}

impl<'a> BuildNumberAllocator<'a> {
    pub fn new(store: &'a dyn MetadataStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// The build number recorded in the directory's metadata, 0 when there
    /// is no document, no pointer, or the document is malformed.
    pub fn last_build_number(&self, directory: &RepoPath) -> Result<u32, StorageError> {
        match self.store.read(directory) {
            Ok(document) => Ok(document.map_or(0, |doc| doc.build_number())),
            Err(MetadataStoreError::Metadata(err)) => {
                warn!(dir = %directory, %err, "existing metadata unreadable, assuming no builds");
                Ok(0)
            }
            Err(MetadataStoreError::Storage(err)) => Err(err),
        }
    }

    /// Build number for an artifact file about to be stored in `directory`.
    pub fn next_build_number(
        &self,
        directory: &RepoPath,
        file: &SnapshotFileName,
    ) -> Result<u32, DeployError> {
        let recorded = self.last_build_number(directory)?;
        if recorded == 0 {
            return Ok(1);
        }
        if file.classifier.is_some() {
            debug!(dir = %directory, recorded, "classified artifact joins the recorded build");
            return Ok(recorded);
        }
        if file.is_descriptor() {
            let siblings = self.unique_siblings(directory)?;
            let next_started = recorded.checked_add(1).is_some_and(|next| {
                siblings.iter().any(|s| s.build_number() == Some(next))
            });
            let recorded_has_descriptor = siblings
                .iter()
                .any(|s| s.is_descriptor() && s.build_number() == Some(recorded));
            if !next_started && !recorded_has_descriptor {
                debug!(dir = %directory, recorded, "descriptor joins the recorded build");
                return Ok(recorded);
            }
        }
        Self::successor(directory, recorded)
    }

    /// Build number for a metadata document deployed into `directory`.
    pub fn next_metadata_build_number(&self, directory: &RepoPath) -> Result<u32, DeployError> {
        Self::successor(directory, self.last_build_number(directory)?)
    }

    fn successor(directory: &RepoPath, recorded: u32) -> Result<u32, DeployError> {
        recorded
            .checked_add(1)
            .ok_or_else(|| DeployError::BuildNumberExhausted {
                directory: directory.to_string(),
            })
    }

    /// The timestamp already used by `build_number` in `directory`, or a
    /// fresh one when this is the build's first file.
    pub fn timestamp_for(
        &self,
        directory: &RepoPath,
        build_number: u32,
    ) -> Result<String, StorageError> {
        let existing = self
            .unique_siblings(directory)?
            .into_iter()
            .find(|s| s.build_number() == Some(build_number))
            .and_then(|s| s.timestamp().map(ToString::to_string));
        let timestamp = match existing {
            Some(timestamp) => timestamp,
            None => format_snapshot_timestamp(self.clock.now()),
        };
        debug!(dir = %directory, build_number, %timestamp, "snapshot stamp allocated");
        Ok(timestamp)
    }

    fn unique_siblings(&self, directory: &RepoPath) -> Result<Vec<SnapshotFileName>, StorageError> {
        let version = directory.name();
        let Some(artifact_id) = directory.parent().map(|p| p.name().to_string()) else {
            return Ok(Vec::new());
        };
        Ok(self
            .store
            .list_sibling_names(directory)?
            .iter()
            .filter_map(|name| SnapshotFileName::parse(&artifact_id, version, name))
            .filter(SnapshotFileName::is_unique)
            .collect())
    }
}
