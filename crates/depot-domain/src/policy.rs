use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How a local repository stores snapshot artifacts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotPolicy {
    /// One file per build, named with timestamp and build number.
    #[default]
    Unique,
    /// One file per version, named with the `SNAPSHOT` marker.
    NonUnique,
    /// Keep whatever naming the deploying client used.
    DeployerDecides,
}

impl SnapshotPolicy {
    /// Whether a deployment under this policy ends up in `SNAPSHOT` form.
    #[must_use]
    pub fn is_effectively_non_unique(self, client_used_non_unique: bool) -> bool {
        match self {
            Self::NonUnique => true,
            Self::DeployerDecides => client_used_non_unique,
            Self::Unique => false,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::NonUnique => "non-unique",
            Self::DeployerDecides => "deployer",
        }
    }
}

impl fmt::Display for SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown snapshot policy `{0}` (expected unique, non-unique or deployer)")]
pub struct UnknownSnapshotPolicy(pub String);

impl FromStr for SnapshotPolicy {
    type Err = UnknownSnapshotPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "unique" => Ok(Self::Unique),
            "non-unique" | "nonunique" => Ok(Self::NonUnique),
            "deployer" | "deployer-decides" => Ok(Self::DeployerDecides),
            _ => Err(UnknownSnapshotPolicy(value.to_string())),
        }
    }
}
