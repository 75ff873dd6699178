//! Repositories laid out as plain directory trees.

use std::fs::{self, File};
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use depot_domain::maven::METADATA_FILE_NAME;
use depot_domain::{
    normalize_path, RepoPath, ResourceDescriptor, SnapshotMetadataDocument, SnapshotPolicy,
};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tracing::trace;

use crate::error::{MetadataStoreError, StorageError};
use crate::metadata_store::MetadataStore;
use crate::repository::{BackingRepository, RepositoryKind};

/// Suffix of the marker a cache keeps next to a path its remote lacked.
pub const MISS_MARKER_SUFFIX: &str = ".depot-miss";
pub(crate) const LOCK_FILE_NAME: &str = ".depot.lock";

#[derive(Debug, Clone)]
pub struct FsRepository {
    key: String,
    kind: RepositoryKind,
    root: PathBuf,
    handles_releases: bool,
    handles_snapshots: bool,
    snapshot_policy: SnapshotPolicy,
}

impl FsRepository {
    pub fn new(key: impl Into<String>, kind: RepositoryKind, root: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            kind,
            root: root.into(),
            handles_releases: true,
            handles_snapshots: true,
            snapshot_policy: SnapshotPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_handles(mut self, releases: bool, snapshots: bool) -> Self {
        self.handles_releases = releases;
        self.handles_snapshots = snapshots;
        self
    }

    #[must_use]
    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }

    #[must_use]
    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        self.snapshot_policy
    }

    /// On-disk location of a repository-relative path.
    #[must_use]
    pub fn local_path(&self, path: &str) -> PathBuf {
        normalize_path(path)
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    pub(crate) fn lock_path(&self, directory: &RepoPath) -> PathBuf {
        self.local_path(directory.path()).join(LOCK_FILE_NAME)
    }

    /// Writes `bytes` at `path`, replacing any existing file atomically.
    pub fn store(&self, path: &RepoPath, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.local_path(path.path());
        write_atomic(&target, bytes).map_err(|err| self.unavailable(path.path(), err))?;
        trace!(repo = %self.key, path = %path.path(), size = bytes.len(), "stored");
        Ok(())
    }

    fn unavailable(&self, path: &str, err: impl ToString) -> StorageError {
        StorageError::unavailable(&self.key, path, err)
    }

    fn remembered_miss(&self, file: &Path) -> Option<Option<OffsetDateTime>> {
        if self.kind != RepositoryKind::Cache {
            return None;
        }
        let mut marker = file.as_os_str().to_owned();
        marker.push(MISS_MARKER_SUFFIX);
        let meta = fs::metadata(PathBuf::from(marker)).ok()?;
        Some(meta.modified().ok().map(OffsetDateTime::from))
    }
}

impl BackingRepository for FsRepository {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> RepositoryKind {
        self.kind
    }

    fn describe(&self, path: &str) -> Result<ResourceDescriptor, StorageError> {
        let repo_path = RepoPath::new(self.key.clone(), path);
        let file = self.local_path(path);
        match fs::metadata(&file) {
            Ok(meta) if meta.is_file() => {
                let modified = meta.modified().ok().map(OffsetDateTime::from);
                Ok(ResourceDescriptor::found(repo_path, modified).with_size(meta.len()))
            }
            Ok(_) => Ok(ResourceDescriptor::not_found(repo_path, "not a file")),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Ok(match self.remembered_miss(&file) {
                    Some(remembered_at) => ResourceDescriptor::cached_miss(repo_path, remembered_at),
                    None => ResourceDescriptor::not_found(repo_path, "no such file"),
                })
            }
            Err(err) => Err(self.unavailable(path, err)),
        }
    }

    fn open(&self, descriptor: &ResourceDescriptor) -> Result<Box<dyn Read + Send>, StorageError> {
        let path = descriptor.repo_path.path();
        let file = File::open(self.local_path(path)).map_err(|err| self.unavailable(path, err))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn handles_releases(&self) -> bool {
        self.handles_releases
    }

    fn handles_snapshots(&self) -> bool {
        self.handles_snapshots
    }
}

impl MetadataStore for FsRepository {
    fn read(
        &self,
        directory: &RepoPath,
    ) -> Result<Option<SnapshotMetadataDocument>, MetadataStoreError> {
        let file = self.local_path(directory.path()).join(METADATA_FILE_NAME);
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.unavailable(directory.path(), err).into()),
        };
        Ok(Some(SnapshotMetadataDocument::from_bytes(&bytes)?))
    }

    fn write(
        &self,
        directory: &RepoPath,
        document: &SnapshotMetadataDocument,
    ) -> Result<(), MetadataStoreError> {
        let rendered = document.render()?;
        self.store(&directory.join(METADATA_FILE_NAME), rendered.as_bytes())?;
        Ok(())
    }

    fn list_sibling_names(&self, directory: &RepoPath) -> Result<Vec<String>, StorageError> {
        let dir = self.local_path(directory.path());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.unavailable(directory.path(), err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| self.unavailable(directory.path(), err))?;
            let is_file = entry
                .file_type()
                .map_err(|err| self.unavailable(directory.path(), err))?
                .is_file();
            let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if is_file && !name.starts_with('.') && !name.ends_with(MISS_MARKER_SUFFIX) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempfile::tempdir;

    use super::*;

    const JAR: &str = "org/acme/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar";
    const DIR: &str = "org/acme/foo/1.0-SNAPSHOT";

    #[test]
    fn describes_stored_files() {
        let temp = tempdir().unwrap();
        let repo = FsRepository::new("libs", RepositoryKind::Local, temp.path());
        repo.store(&RepoPath::new("libs", JAR), b"jar-bytes").unwrap();

        let descriptor = repo.describe(JAR).unwrap();
        assert!(descriptor.found);
        assert_eq!(descriptor.size, Some(9));
        assert!(descriptor.last_modified.is_some());
        assert_eq!(descriptor.repo_key(), "libs");

        let mut content = String::new();
        repo.open(&descriptor)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "jar-bytes");
    }

    #[test]
    fn missing_files_and_directories_are_not_found() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(DIR)).unwrap();
        let repo = FsRepository::new("libs", RepositoryKind::Local, temp.path());

        assert!(!repo.describe(JAR).unwrap().found);
        let dir = repo.describe(DIR).unwrap();
        assert!(!dir.found);
        assert!(!dir.negative_cached);
    }

    #[test]
    fn cache_markers_are_reported_as_cached_misses() {
        let temp = tempdir().unwrap();
        let marker = temp.path().join(format!("{JAR}{MISS_MARKER_SUFFIX}"));
        fs::create_dir_all(marker.parent().unwrap()).unwrap();
        fs::write(&marker, b"").unwrap();

        let cache = FsRepository::new("cache", RepositoryKind::Cache, temp.path());
        let descriptor = cache.describe(JAR).unwrap();
        assert!(!descriptor.found);
        assert!(descriptor.negative_cached);
        assert_eq!(descriptor.not_found_reason.as_deref(), Some("cached miss"));

        let local = FsRepository::new("libs", RepositoryKind::Local, temp.path());
        assert!(!local.describe(JAR).unwrap().negative_cached);
    }

    #[test]
    fn metadata_round_trips_through_the_directory() {
        let temp = tempdir().unwrap();
        let repo = FsRepository::new("libs", RepositoryKind::Local, temp.path());
        let dir = RepoPath::new("libs", DIR);
        assert_eq!(repo.read(&dir).unwrap(), None);

        let document = SnapshotMetadataDocument::with_versions(["1.0-SNAPSHOT"])
            .with_snapshot(Some("20240101.000000"), 4);
        repo.write(&dir, &document).unwrap();
        let stored = repo.read(&dir).unwrap().expect("document");
        assert_eq!(stored.build_number(), 4);
        assert!(temp.path().join(DIR).join(METADATA_FILE_NAME).is_file());
    }

    #[test]
    fn malformed_metadata_is_a_metadata_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(DIR)).unwrap();
        fs::write(temp.path().join(DIR).join(METADATA_FILE_NAME), "not xml").unwrap();
        let repo = FsRepository::new("libs", RepositoryKind::Local, temp.path());

        let err = repo.read(&RepoPath::new("libs", DIR)).unwrap_err();
        assert!(matches!(err, MetadataStoreError::Metadata(_)));
    }

    #[test]
    fn sibling_names_are_sorted_and_skip_bookkeeping_files() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(DIR);
        fs::create_dir_all(dir.join("nested")).unwrap();
        for name in [
            "foo-1.0-20240102.000000-2.jar",
            "foo-1.0-20240101.000000-1.jar",
            LOCK_FILE_NAME,
            "foo-1.0-SNAPSHOT.pom.depot-miss",
        ] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let repo = FsRepository::new("libs", RepositoryKind::Local, temp.path());

        let names = repo.list_sibling_names(&RepoPath::new("libs", DIR)).unwrap();
        assert_eq!(
            names,
            vec!["foo-1.0-20240101.000000-1.jar", "foo-1.0-20240102.000000-2.jar"]
        );
        assert!(repo
            .list_sibling_names(&RepoPath::new("libs", "org/absent/1.0-SNAPSHOT"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn local_path_ignores_parent_segments() {
        let repo = FsRepository::new("libs", RepositoryKind::Local, "/srv/libs");
        assert_eq!(
            repo.local_path("../etc/./passwd"),
            PathBuf::from("/srv/libs/etc/passwd")
        );
        let addressed = RepoPath::new("libs", "a/../b/./c.jar");
        assert_eq!(addressed.path(), "a/b/c.jar");
        assert_eq!(
            repo.local_path(addressed.path()),
            repo.local_path("a/../b/./c.jar")
        );
    }
}
