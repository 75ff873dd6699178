//! In-memory collaborators for unit tests.

use std::{
    collections::{BTreeMap, HashMap},
    io::{Cursor, Read},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use depot_domain::{RepoPath, ResourceDescriptor, SnapshotMetadataDocument};
use time::OffsetDateTime;

use crate::error::{MetadataStoreError, StorageError};
use crate::metadata_store::MetadataStore;
use crate::repository::{BackingRepository, RepositoryKind};

#[derive(Clone)]
enum Entry {
    File {
        modified: Option<OffsetDateTime>,
        content: Vec<u8>,
    },
    CachedMiss,
}

pub(crate) struct MockRepository {
    key: String,
    kind: RepositoryKind,
    releases: bool,
    snapshots: bool,
    unavailable: bool,
    entries: HashMap<String, Entry>,
    describe_calls: AtomicUsize,
}

impl MockRepository {
    fn new(key: &str, kind: RepositoryKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
            releases: true,
            snapshots: true,
            unavailable: false,
            entries: HashMap::new(),
            describe_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn local(key: &str) -> Self {
        Self::new(key, RepositoryKind::Local)
    }

    pub(crate) fn cache(key: &str) -> Self {
        Self::new(key, RepositoryKind::Cache)
    }

    pub(crate) fn remote(key: &str) -> Self {
        Self::new(key, RepositoryKind::Remote)
    }

    /// Adds a file modified `modified` seconds after the epoch.
    pub(crate) fn with_file(mut self, path: &str, modified: i64, content: &str) -> Self {
        self.entries.insert(
            path.to_string(),
            Entry::File {
                modified: Some(at(modified)),
                content: content.as_bytes().to_vec(),
            },
        );
        self
    }

    pub(crate) fn with_undated_file(mut self, path: &str) -> Self {
        self.entries.insert(
            path.to_string(),
            Entry::File {
                modified: None,
                content: Vec::new(),
            },
        );
        self
    }

    pub(crate) fn with_cached_miss(mut self, path: &str) -> Self {
        self.entries.insert(path.to_string(), Entry::CachedMiss);
        self
    }

    pub(crate) fn releases(mut self, handles: bool) -> Self {
        self.releases = handles;
        self
    }

    pub(crate) fn snapshots(mut self, handles: bool) -> Self {
        self.snapshots = handles;
        self
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn at(seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(seconds).expect("valid timestamp")
}

impl BackingRepository for MockRepository {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> RepositoryKind {
        self.kind
    }

    fn describe(&self, path: &str) -> Result<ResourceDescriptor, StorageError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(StorageError::unavailable(&self.key, path, "backend offline"));
        }
        let repo_path = RepoPath::new(self.key.clone(), path);
        Ok(match self.entries.get(path) {
            Some(Entry::File { modified, content }) => {
                ResourceDescriptor::found(repo_path, *modified).with_size(content.len() as u64)
            }
            Some(Entry::CachedMiss) => ResourceDescriptor::cached_miss(repo_path, None),
            None => ResourceDescriptor::not_found(repo_path, "no such file"),
        })
    }

    fn open(&self, descriptor: &ResourceDescriptor) -> Result<Box<dyn Read + Send>, StorageError> {
        match self.entries.get(descriptor.repo_path.path()) {
            Some(Entry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            _ => Err(StorageError::unavailable(
                &self.key,
                descriptor.repo_path.path(),
                "no content",
            )),
        }
    }

    fn handles_releases(&self) -> bool {
        self.releases
    }

    fn handles_snapshots(&self) -> bool {
        self.snapshots
    }
}

/// Metadata store over a map of directory path to raw document text.
#[derive(Default)]
pub(crate) struct MemoryMetadataStore {
    documents: Mutex<HashMap<String, String>>,
    siblings: Mutex<BTreeMap<String, Vec<String>>>,
}

impl MemoryMetadataStore {
    pub(crate) fn with_document(self, dir: &str, document: &SnapshotMetadataDocument) -> Self {
        let rendered = document.render().expect("render");
        self.with_raw_document(dir, &rendered)
    }

    pub(crate) fn with_raw_document(self, dir: &str, raw: &str) -> Self {
        self.documents
            .lock()
            .expect("lock")
            .insert(dir.to_string(), raw.to_string());
        self
    }

    pub(crate) fn with_siblings(self, dir: &str, names: &[&str]) -> Self {
        self.siblings.lock().expect("lock").insert(
            dir.to_string(),
            names.iter().map(ToString::to_string).collect(),
        );
        self
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn read(
        &self,
        directory: &RepoPath,
    ) -> Result<Option<SnapshotMetadataDocument>, MetadataStoreError> {
        let documents = self.documents.lock().expect("lock");
        match documents.get(directory.path()) {
            Some(raw) => Ok(Some(SnapshotMetadataDocument::parse(raw)?)),
            None => Ok(None),
        }
    }

    fn write(
        &self,
        directory: &RepoPath,
        document: &SnapshotMetadataDocument,
    ) -> Result<(), MetadataStoreError> {
        let rendered = document.render()?;
        self.documents
            .lock()
            .expect("lock")
            .insert(directory.path().to_string(), rendered);
        Ok(())
    }

    fn list_sibling_names(&self, directory: &RepoPath) -> Result<Vec<String>, StorageError> {
        Ok(self
            .siblings
            .lock()
            .expect("lock")
            .get(directory.path())
            .cloned()
            .unwrap_or_default())
    }
}
