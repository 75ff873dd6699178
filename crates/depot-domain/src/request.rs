use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::maven::{is_checksum_path, is_in_snapshot_directory, is_metadata_path};
use crate::normalize_path;

/// Which repositories a request may be served from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetGroup {
    /// Every configured repository.
    Any,
    /// One named repository (plus caches/remotes it escalates to).
    Repository(String),
}

impl TargetGroup {
    pub const ANY_KEY: &'static str = "ANY";
}

impl FromStr for TargetGroup {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == Self::ANY_KEY {
            Ok(Self::Any)
        } else {
            Ok(Self::Repository(value.to_string()))
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(Self::ANY_KEY),
            Self::Repository(key) => f.write_str(key),
        }
    }
}

/// The three resolution strategies, picked from the shape of the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    Standard,
    SnapshotArtifact,
    SnapshotMetadata,
}

impl RequestKind {
    #[must_use]
    pub fn classify(path: &str) -> Self {
        if is_checksum_path(path) || !is_in_snapshot_directory(path) {
            Self::Standard
        } else if is_metadata_path(path) {
            Self::SnapshotMetadata
        } else {
            Self::SnapshotArtifact
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub path: String,
    pub target_group: TargetGroup,
    pub head_only: bool,
    pub if_modified_since: Option<OffsetDateTime>,
    pub originates_from_peer_instance: bool,
}

impl ResolutionRequest {
    pub fn new(target_group: TargetGroup, path: &str) -> Self {
        Self {
            path: normalize_path(path),
            target_group,
            head_only: false,
            if_modified_since: None,
            originates_from_peer_instance: false,
        }
    }

    #[must_use]
    pub fn head_only(mut self, head_only: bool) -> Self {
        self.head_only = head_only;
        self
    }

    #[must_use]
    pub fn if_modified_since(mut self, since: Option<OffsetDateTime>) -> Self {
        self.if_modified_since = since;
        self
    }

    #[must_use]
    pub fn from_peer(mut self, from_peer: bool) -> Self {
        self.originates_from_peer_instance = from_peer;
        self
    }

    #[must_use]
    pub fn kind(&self) -> RequestKind {
        RequestKind::classify(&self.path)
    }

    #[must_use]
    pub fn is_checksum(&self) -> bool {
        is_checksum_path(&self.path)
    }
}
