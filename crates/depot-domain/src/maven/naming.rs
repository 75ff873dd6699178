//! Maven repository layout conventions: checksum and metadata files,
//! snapshot version directories and the two snapshot filename forms.

use std::fmt;

use time::{macros::format_description, OffsetDateTime};

use crate::RepoPath;

pub const SNAPSHOT: &str = "SNAPSHOT";
pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";
pub const CHECKSUM_EXTENSIONS: &[&str] = &["sha1", "md5", "sha256", "sha512", "asc"];

#[must_use]
pub fn is_checksum_path(path: &str) -> bool {
    let name = file_name(path);
    name.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty() && CHECKSUM_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    })
}

/// `maven-metadata.xml` and its per-repository variants (`maven-metadata-local.xml`).
#[must_use]
pub fn is_metadata_path(path: &str) -> bool {
    let name = file_name(path);
    name == METADATA_FILE_NAME || (name.starts_with("maven-metadata-") && name.ends_with(".xml"))
}

#[must_use]
pub fn is_snapshot_version(version: &str) -> bool {
    version == SNAPSHOT || version.ends_with("-SNAPSHOT")
}

/// True when the path's parent directory is a snapshot version directory.
#[must_use]
pub fn is_in_snapshot_directory(path: &str) -> bool {
    parent_name(path).is_some_and(is_snapshot_version)
}

#[must_use]
pub fn is_snapshot_metadata_path(path: &str) -> bool {
    is_metadata_path(path) && !is_checksum_path(path) && is_in_snapshot_directory(path)
}

/// The snapshot version directory holding `path`, if it sits in one.
#[must_use]
pub fn snapshot_directory_of(path: &RepoPath) -> Option<RepoPath> {
    let dir = path.parent()?;
    is_snapshot_version(dir.name()).then_some(dir)
}

/// Formats a timestamp in the unique-snapshot form `yyyyMMdd.HHmmss` (UTC).
#[must_use]
pub fn format_snapshot_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(format_description!(
            "[year][month][day].[hour][minute][second]"
        ))
        .unwrap_or_default()
}

/// Checks the `yyyyMMdd.HHmmss` shape without interpreting the values.
#[must_use]
pub fn is_snapshot_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'.'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

fn parent_name(path: &str) -> Option<&str> {
    let trimmed = path.trim_matches('/');
    let (parent, _) = trimmed.rsplit_once('/')?;
    parent.rsplit('/').next()
}

/// A file inside `<group...>/<artifactId>/<version>/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MavenArtifactPath {
    pub group_path: String,
    pub artifact_id: String,
    pub version: String,
    pub file_name: String,
}

impl MavenArtifactPath {
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if segments.len() < 4 {
            return None;
        }
        let n = segments.len();
        Some(Self {
            group_path: segments[..n - 3].join("/"),
            artifact_id: segments[n - 3].to_string(),
            version: segments[n - 2].to_string(),
            file_name: segments[n - 1].to_string(),
        })
    }

    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }

    /// Parses the filename as a snapshot artifact of this directory.
    #[must_use]
    pub fn snapshot_file(&self) -> Option<SnapshotFileName> {
        if !self.is_snapshot() {
            return None;
        }
        SnapshotFileName::parse(&self.artifact_id, &self.version, &self.file_name)
    }
}

/// How the version part of a snapshot filename is stamped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotStamp {
    /// `foo-1.0-SNAPSHOT.jar`
    NonUnique,
    /// `foo-1.0-20240101.000000-5.jar`
    Unique {
        timestamp: String,
        build_number: u32,
    },
}

/// A snapshot artifact filename broken into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotFileName {
    pub artifact_id: String,
    /// The directory version with its `SNAPSHOT` suffix removed, e.g. `1.0-`.
    pub version_prefix: String,
    pub stamp: SnapshotStamp,
    pub classifier: Option<String>,
    pub extension: String,
}

impl SnapshotFileName {
    /// Parses `file_name` as an artifact of `artifact_id` at snapshot `version`.
    #[must_use]
    pub fn parse(artifact_id: &str, version: &str, file_name: &str) -> Option<Self> {
        let version_prefix = version.strip_suffix(SNAPSHOT)?;
        let rest = file_name
            .strip_prefix(artifact_id)?
            .strip_prefix('-')?
            .strip_prefix(version_prefix)?;

        let (stamp, rest) = if let Some(rest) = rest.strip_prefix(SNAPSHOT) {
            (SnapshotStamp::NonUnique, rest)
        } else {
            parse_unique_stamp(rest)?
        };
        let (classifier, extension) = parse_tail(rest)?;

        Some(Self {
            artifact_id: artifact_id.to_string(),
            version_prefix: version_prefix.to_string(),
            stamp,
            classifier,
            extension,
        })
    }

    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self.stamp, SnapshotStamp::Unique { .. })
    }

    #[must_use]
    pub fn build_number(&self) -> Option<u32> {
        match &self.stamp {
            SnapshotStamp::Unique { build_number, .. } => Some(*build_number),
            SnapshotStamp::NonUnique => None,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        match &self.stamp {
            SnapshotStamp::Unique { timestamp, .. } => Some(timestamp.as_str()),
            SnapshotStamp::NonUnique => None,
        }
    }

    /// POM descriptors get their own build-number heuristic.
    #[must_use]
    pub fn is_descriptor(&self) -> bool {
        self.extension == "pom"
    }

    #[must_use]
    pub fn into_non_unique(self) -> Self {
        Self {
            stamp: SnapshotStamp::NonUnique,
            ..self
        }
    }

    #[must_use]
    pub fn into_unique(self, timestamp: impl Into<String>, build_number: u32) -> Self {
        Self {
            stamp: SnapshotStamp::Unique {
                timestamp: timestamp.into(),
                build_number,
            },
            ..self
        }
    }
}

impl fmt::Display for SnapshotFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.artifact_id, self.version_prefix)?;
        match &self.stamp {
            SnapshotStamp::NonUnique => f.write_str(SNAPSHOT)?,
            SnapshotStamp::Unique {
                timestamp,
                build_number,
            } => write!(f, "{timestamp}-{build_number}")?,
        }
        if let Some(classifier) = &self.classifier {
            write!(f, "-{classifier}")?;
        }
        write!(f, ".{}", self.extension)
    }
}

fn parse_unique_stamp(rest: &str) -> Option<(SnapshotStamp, &str)> {
    let timestamp = rest.get(..15)?;
    if !is_snapshot_timestamp(timestamp) {
        return None;
    }
    let after = rest[15..].strip_prefix('-')?;
    let digits = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    if digits == 0 {
        return None;
    }
    let build_number = after[..digits].parse().ok()?;
    Some((
        SnapshotStamp::Unique {
            timestamp: timestamp.to_string(),
            build_number,
        },
        &after[digits..],
    ))
}

fn parse_tail(rest: &str) -> Option<(Option<String>, String)> {
    if let Some(extension) = rest.strip_prefix('.') {
        return (!extension.is_empty()).then(|| (None, extension.to_string()));
    }
    let tail = rest.strip_prefix('-')?;
    let (classifier, extension) = tail.split_once('.')?;
    if classifier.is_empty() || extension.is_empty() {
        return None;
    }
    Some((Some(classifier.to_string()), extension.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn detects_checksums_and_metadata() {
        assert!(is_checksum_path("org/acme/foo/1.0/foo-1.0.jar.sha1"));
        assert!(is_checksum_path("org/acme/foo/maven-metadata.xml.md5"));
        assert!(!is_checksum_path("org/acme/foo/1.0/foo-1.0.jar"));
        assert!(!is_checksum_path(".sha1"));

        assert!(is_metadata_path("org/acme/foo/maven-metadata.xml"));
        assert!(is_metadata_path("org/acme/foo/maven-metadata-local.xml"));
        assert!(!is_metadata_path("org/acme/foo/1.0/foo-1.0.pom"));
    }

    #[test]
    fn snapshot_metadata_requires_snapshot_directory() {
        assert!(is_snapshot_metadata_path(
            "org/acme/foo/1.0-SNAPSHOT/maven-metadata.xml"
        ));
        assert!(!is_snapshot_metadata_path("org/acme/foo/maven-metadata.xml"));
        assert!(!is_snapshot_metadata_path(
            "org/acme/foo/1.0-SNAPSHOT/maven-metadata.xml.sha1"
        ));
    }

    #[test]
    fn parses_non_unique_names() {
        let name = SnapshotFileName::parse("foo", "1.0-SNAPSHOT", "foo-1.0-SNAPSHOT-sources.jar")
            .expect("parse");
        assert_eq!(name.stamp, SnapshotStamp::NonUnique);
        assert_eq!(name.classifier.as_deref(), Some("sources"));
        assert_eq!(name.extension, "jar");
        assert_eq!(name.to_string(), "foo-1.0-SNAPSHOT-sources.jar");
    }

    #[test]
    fn unique_name_round_trips() {
        let name = SnapshotFileName::parse("foo", "1.0-SNAPSHOT", "foo-1.0-SNAPSHOT.jar")
            .expect("parse")
            .into_unique("20240101.000000", 5);
        let rendered = name.to_string();
        assert_eq!(rendered, "foo-1.0-20240101.000000-5.jar");

        let parsed = SnapshotFileName::parse("foo", "1.0-SNAPSHOT", &rendered).expect("reparse");
        assert_eq!(parsed.build_number(), Some(5));
        assert_eq!(parsed.timestamp(), Some("20240101.000000"));
        assert_eq!(parsed.classifier, None);
    }

    #[test]
    fn unique_name_keeps_classifier_and_compound_extension() {
        let parsed = SnapshotFileName::parse(
            "foo",
            "2.1-SNAPSHOT",
            "foo-2.1-20231231.235959-12-dist.tar.gz",
        )
        .expect("parse");
        assert_eq!(parsed.build_number(), Some(12));
        assert_eq!(parsed.classifier.as_deref(), Some("dist"));
        assert_eq!(parsed.extension, "tar.gz");
        assert_eq!(
            parsed.into_non_unique().to_string(),
            "foo-2.1-SNAPSHOT-dist.tar.gz"
        );
    }

    #[test]
    fn rejects_foreign_names() {
        assert!(SnapshotFileName::parse("foo", "1.0-SNAPSHOT", "bar-1.0-SNAPSHOT.jar").is_none());
        assert!(SnapshotFileName::parse("foo", "1.0-SNAPSHOT", "foo-1.0-2024.jar").is_none());
        assert!(SnapshotFileName::parse("foo", "1.0", "foo-1.0.jar").is_none());
        assert!(SnapshotFileName::parse("foo", "1.0-SNAPSHOT", "foo-1.0-SNAPSHOT").is_none());
    }

    #[test]
    fn bare_snapshot_version_has_empty_prefix() {
        let parsed = SnapshotFileName::parse("foo", "SNAPSHOT", "foo-SNAPSHOT.pom").expect("parse");
        assert!(parsed.is_descriptor());
        assert_eq!(
            parsed.into_unique("20240101.000000", 1).to_string(),
            "foo-20240101.000000-1.pom"
        );
    }

    #[test]
    fn parses_artifact_layout() {
        let path = MavenArtifactPath::parse("org/acme/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar")
            .expect("layout");
        assert_eq!(path.group_path, "org/acme");
        assert_eq!(path.artifact_id, "foo");
        assert!(path.is_snapshot());
        assert!(path.snapshot_file().is_some());
        assert!(MavenArtifactPath::parse("foo/1.0/foo-1.0.jar").is_none());
    }

    #[test]
    fn formats_timestamps_in_utc() {
        let at = datetime!(2024-01-01 00:00:00 UTC);
        assert_eq!(format_snapshot_timestamp(at), "20240101.000000");
        assert!(is_snapshot_timestamp("20240101.000000"));
        assert!(!is_snapshot_timestamp("20240101000000"));
    }
}
