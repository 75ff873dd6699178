use depot_domain::MetadataError;

/// Problems with the repository configuration itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("[DP101] repository `{key}` is not configured")]
    UnknownRepository { key: String },
    #[error("[DP102] cache `{cache}` has no associated remote repository")]
    MissingRemote { cache: String },
    #[error("[DP103] invalid repository configuration: {message}")]
    Invalid { message: String },
}

impl ConfigurationError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownRepository { .. } => "DP101",
            Self::MissingRemote { .. } => "DP102",
            Self::Invalid { .. } => "DP103",
        }
    }
}

/// The backing store could not answer; never retried here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("[DP201] storage unavailable for {repo_key}:{path}: {message}")]
    Unavailable {
        repo_key: String,
        path: String,
        message: String,
    },
}

impl StorageError {
    pub fn unavailable(repo_key: &str, path: &str, err: impl ToString) -> Self {
        Self::Unavailable {
            repo_key: repo_key.to_string(),
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "DP201",
        }
    }
}

/// Failure reading or writing the metadata document of a directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl MetadataStoreError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(err) => err.code(),
            Self::Metadata(err) => err.code(),
        }
    }
}

/// "Could not determine" outcomes of a resolution, as opposed to a
/// `Resolution::NotFound`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResolveError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(err) => err.code(),
            Self::Storage(err) => err.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("[DP401] {path} is not a snapshot metadata document")]
    NotSnapshotMetadata { path: String },
    #[error("[DP402] repository `{key}` does not accept deployments")]
    NotDeployable { key: String },
    #[error("[DP403] {directory} has no build numbers left to allocate")]
    BuildNumberExhausted { directory: String },
}

impl DeployError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(err) => err.code(),
            Self::Metadata(err) => err.code(),
            Self::Configuration(err) => err.code(),
            Self::NotSnapshotMetadata { .. } => "DP401",
            Self::NotDeployable { .. } => "DP402",
            Self::BuildNumberExhausted { .. } => "DP403",
        }
    }
}

impl From<MetadataStoreError> for DeployError {
    fn from(err: MetadataStoreError) -> Self {
        match err {
            MetadataStoreError::Storage(err) => Self::Storage(err),
            MetadataStoreError::Metadata(err) => Self::Metadata(err),
        }
    }
}
