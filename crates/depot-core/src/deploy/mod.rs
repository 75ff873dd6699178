//! Deploying artifacts and snapshot metadata into local repositories.

use std::sync::Arc;

use depot_domain::maven::{is_metadata_path, snapshot_directory_of, METADATA_FILE_NAME};
use depot_domain::{MavenArtifactPath, RepoPath, SnapshotMetadataDocument};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{ConfigurationError, DeployError};
use crate::fs::FsRepository;
use crate::metadata_store::MetadataStore;
use crate::repository::{BackingRepository, RepositoryKind};

mod allocator;
mod locks;
mod rewriter;

pub use allocator::BuildNumberAllocator;
pub use rewriter::SnapshotPathRewriter;

use locks::DirectoryLocks;

/// Runs each deployment into a snapshot version directory as one critical
/// section: read metadata, allocate, store.
pub struct Deployer {
    repositories: IndexMap<String, Arc<FsRepository>>,
    clock: Arc<dyn Clock>,
    locks: DirectoryLocks,
}

impl Deployer {
    pub fn new(
        repositories: impl IntoIterator<Item = Arc<FsRepository>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repositories: repositories
                .into_iter()
                .map(|repo| (repo.key().to_string(), repo))
                .collect(),
            clock,
            locks: DirectoryLocks::default(),
        }
    }

    /// Stores `bytes` at `path` in `repo_key`, returning where they landed.
    ///
    /// When `client_used_non_unique` is `None` it is read off the filename.
    pub fn deploy_artifact(
        &self,
        repo_key: &str,
        path: &str,
        bytes: &[u8],
        client_used_non_unique: Option<bool>,
    ) -> Result<RepoPath, DeployError> {
        let repo = self.target(repo_key)?;
        let requested = RepoPath::new(repo_key, path);
        let Some(directory) = snapshot_directory_of(&requested) else {
            repo.store(&requested, bytes)?;
            debug!(path = %requested, "stored as addressed");
            return Ok(requested);
        };

        let client_used_non_unique =
            client_used_non_unique.unwrap_or_else(|| uses_non_unique_name(&requested));
        self.locks
            .with_directory(&directory, &repo.lock_path(&directory), || {
                let rewriter = SnapshotPathRewriter::new(repo, self.clock.as_ref());
                let stored = rewriter.rewrite_for_deployment(
                    &requested,
                    repo.snapshot_policy(),
                    client_used_non_unique,
                )?;
                repo.store(&stored, bytes)?;
                info!(
                    from = %requested,
                    to = %stored,
                    policy = %repo.snapshot_policy(),
                    "artifact deployed"
                );
                Ok(stored)
            })
    }

    /// Rewrites and stores a snapshot metadata document deployed at `path`,
    /// which may name the document or its version directory.
    ///
    /// When `client_used_non_unique` is `None` it is inferred from the
    /// incoming pointer: no timestamp means non-unique.
    pub fn deploy_metadata(
        &self,
        repo_key: &str,
        path: &str,
        bytes: &[u8],
        client_used_non_unique: Option<bool>,
    ) -> Result<SnapshotMetadataDocument, DeployError> {
        let repo = self.target(repo_key)?;
        let mut target = RepoPath::new(repo_key, path);
        if !is_metadata_path(target.path()) {
            target = target.join(METADATA_FILE_NAME);
        }
        let directory =
            snapshot_directory_of(&target).ok_or_else(|| DeployError::NotSnapshotMetadata {
                path: target.to_string(),
            })?;

        let incoming = SnapshotMetadataDocument::from_bytes(bytes)?;
        let client_used_non_unique =
            client_used_non_unique.unwrap_or(incoming.snapshot_timestamp().is_none());
        self.locks
            .with_directory(&directory, &repo.lock_path(&directory), || {
                let rewriter = SnapshotPathRewriter::new(repo, self.clock.as_ref());
                let document = rewriter.rewrite_metadata_for_deployment(
                    &target,
                    incoming,
                    repo.snapshot_policy(),
                    client_used_non_unique,
                )?;
                repo.write(&directory, &document)?;
                info!(
                    dir = %directory,
                    build_number = document.build_number(),
                    "snapshot metadata deployed"
                );
                Ok(document)
            })
    }

    fn target(&self, repo_key: &str) -> Result<&FsRepository, DeployError> {
        let repo = self.repositories.get(repo_key).ok_or_else(|| {
            ConfigurationError::UnknownRepository {
                key: repo_key.to_string(),
            }
        })?;
        if repo.kind() != RepositoryKind::Local {
            return Err(DeployError::NotDeployable {
                key: repo_key.to_string(),
            });
        }
        Ok(&**repo)
    }
}

fn uses_non_unique_name(path: &RepoPath) -> bool {
    MavenArtifactPath::parse(path.path())
        .and_then(|artifact| artifact.snapshot_file())
        .is_some_and(|file| !file.is_unique())
}
