use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::RepoPath;

/// Point-in-time answer from one backing repository about one path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub repo_path: RepoPath,
    pub found: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_modified: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_reason: Option<String>,
    /// A remembered remote miss held by a cache rather than a plain absence.
    #[serde(default)]
    pub negative_cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ResourceDescriptor {
    pub fn found(repo_path: RepoPath, last_modified: Option<OffsetDateTime>) -> Self {
        Self {
            repo_path,
            found: true,
            last_modified,
            not_found_reason: None,
            negative_cached: false,
            size: None,
        }
    }

    pub fn not_found(repo_path: RepoPath, reason: impl Into<String>) -> Self {
        Self {
            repo_path,
            found: false,
            last_modified: None,
            not_found_reason: Some(reason.into()),
            negative_cached: false,
            size: None,
        }
    }

    pub fn cached_miss(repo_path: RepoPath, remembered_at: Option<OffsetDateTime>) -> Self {
        Self {
            repo_path,
            found: false,
            last_modified: remembered_at,
            not_found_reason: Some("cached miss".to_string()),
            negative_cached: true,
            size: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn repo_key(&self) -> &str {
        self.repo_path.repo_key()
    }

    /// True when this descriptor was changed strictly after `since`.
    /// Descriptors without a timestamp always count as modified.
    #[must_use]
    pub fn is_modified_since(&self, since: OffsetDateTime) -> bool {
        self.last_modified.map_or(true, |modified| modified > since)
    }
}
