use serde::Serialize;
use time::OffsetDateTime;

use crate::{ResourceDescriptor, SnapshotMetadataDocument};

/// Outcome of resolving one request. Not finding anything is a normal
/// outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Resolution {
    Found(Resolved),
    NotFound { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resolved {
    /// Key of the repository serving the content (the first contributor for merged metadata).
    pub repository: String,
    pub descriptor: ResourceDescriptor,
    /// Set for snapshot metadata requests: the merge of every contributing document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_metadata: Option<SnapshotMetadataDocument>,
}

impl Resolution {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn found(descriptor: ResourceDescriptor) -> Self {
        Self::Found(Resolved {
            repository: descriptor.repo_key().to_string(),
            descriptor,
            merged_metadata: None,
        })
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[must_use]
    pub fn resolved(&self) -> Option<&Resolved> {
        match self {
            Self::Found(resolved) => Some(resolved),
            Self::NotFound { .. } => None,
        }
    }

    /// Key of the serving repository, if any.
    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.resolved().map(|r| r.repository.as_str())
    }

    /// Whether a conditional request should receive content.
    #[must_use]
    pub fn is_modified_since(&self, since: OffsetDateTime) -> bool {
        self.resolved()
            .is_some_and(|r| r.descriptor.is_modified_since(since))
    }
}
