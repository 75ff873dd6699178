pub mod metadata;
pub mod naming;

pub use metadata::{MetadataError, SnapshotMetadataDocument, SnapshotPointer, SnapshotVersion};
pub use naming::{
    format_snapshot_timestamp, is_checksum_path, is_in_snapshot_directory,
    is_metadata_path, is_snapshot_metadata_path, is_snapshot_timestamp, is_snapshot_version,
    snapshot_directory_of, MavenArtifactPath, SnapshotFileName, SnapshotStamp,
    METADATA_FILE_NAME, SNAPSHOT,
};
