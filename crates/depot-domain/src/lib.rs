#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod descriptor;
pub mod maven;
pub mod policy;
pub mod repo_path;
pub mod request;
pub mod resolution;

pub use descriptor::ResourceDescriptor;
pub use maven::{
    MavenArtifactPath, MetadataError, SnapshotFileName, SnapshotMetadataDocument, SnapshotPointer,
    SnapshotStamp, SnapshotVersion,
};
pub use policy::{SnapshotPolicy, UnknownSnapshotPolicy};
pub use repo_path::{normalize_path, RepoPath};
pub use request::{RequestKind, ResolutionRequest, TargetGroup};
pub use resolution::{Resolution, Resolved};
