//! `maven-metadata.xml` documents: parsing, rendering and merging.

use indexmap::IndexSet;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("[DP301] malformed metadata document: {message}")]
    Malformed { message: String },
    #[error("[DP302] failed to render metadata document: {message}")]
    Render { message: String },
}

impl MetadataError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "DP301",
            Self::Render { .. } => "DP302",
        }
    }

    fn malformed(message: impl ToString) -> Self {
        Self::Malformed {
            message: message.to_string(),
        }
    }
}

/// The `<snapshot>` pointer of a snapshot version directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPointer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub build_number: u32,
    #[serde(default)]
    pub local_copy: bool,
}

impl SnapshotPointer {
    pub fn new(timestamp: Option<String>, build_number: u32) -> Self {
        Self {
            timestamp,
            build_number,
            local_copy: false,
        }
    }
}

/// One `<snapshotVersion>` entry: the unique value a classifier and
/// extension currently resolve to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub extension: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl SnapshotVersion {
    fn same_file(&self, other: &SnapshotVersion) -> bool {
        self.classifier == other.classifier && self.extension == other.extension
    }
}

/// Index of available versions plus the current snapshot pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: IndexSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotPointer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshot_versions: Vec<SnapshotVersion>,
}

impl SnapshotMetadataDocument {
    pub fn with_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_snapshot(mut self, timestamp: Option<&str>, build_number: u32) -> Self {
        self.snapshot = Some(SnapshotPointer::new(
            timestamp.map(ToString::to_string),
            build_number,
        ));
        self
    }

    /// Recorded build number; 0 when there is no snapshot pointer.
    #[must_use]
    pub fn build_number(&self) -> u32 {
        self.snapshot.as_ref().map_or(0, |s| s.build_number)
    }

    #[must_use]
    pub fn snapshot_timestamp(&self) -> Option<&str> {
        self.snapshot.as_ref().and_then(|s| s.timestamp.as_deref())
    }

    /// Merges `other` into `self`: versions are unioned in encounter order,
    /// `other`'s snapshot pointer replaces ours when present, and its
    /// snapshot versions replace ours for the same classifier and extension.
    pub fn merge(&mut self, other: SnapshotMetadataDocument) {
        let SnapshotMetadataDocument {
            group_id,
            artifact_id,
            version,
            latest,
            release,
            versions,
            snapshot,
            last_updated,
            snapshot_versions,
        } = other;

        self.group_id = self.group_id.take().or(group_id);
        self.artifact_id = self.artifact_id.take().or(artifact_id);
        self.version = self.version.take().or(version);
        if latest.is_some() {
            self.latest = latest;
        }
        if release.is_some() {
            self.release = release;
        }
        self.versions.extend(versions);
        if snapshot.is_some() {
            self.snapshot = snapshot;
        }
        // yyyyMMddHHmmss sorts lexically
        self.last_updated = match (self.last_updated.take(), last_updated) {
            (Some(ours), Some(theirs)) => Some(ours.max(theirs)),
            (ours, theirs) => ours.or(theirs),
        };
        for entry in snapshot_versions {
            match self.snapshot_versions.iter_mut().find(|e| e.same_file(&entry)) {
                Some(existing) => *existing = entry,
                None => self.snapshot_versions.push(entry),
            }
        }
    }

    pub fn parse(input: &str) -> Result<Self, MetadataError> {
        ensure_metadata_root(input)?;
        let wire: MetadataXml = quick_xml::de::from_str(input).map_err(MetadataError::malformed)?;
        Ok(wire.into())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        let text = std::str::from_utf8(bytes).map_err(MetadataError::malformed)?;
        Self::parse(text)
    }

    pub fn render(&self) -> Result<String, MetadataError> {
        let wire = MetadataXml::from(self.clone());
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some("metadata"))
            .map_err(|err| MetadataError::Render {
                message: err.to_string(),
            })?;
        serializer.indent(' ', 2);
        wire.serialize(serializer)
            .map_err(|err| MetadataError::Render {
                message: err.to_string(),
            })?;
        Ok(format!("{XML_DECLARATION}\n{body}\n"))
    }
}

fn ensure_metadata_root(input: &str) -> Result<(), MetadataError> {
    let mut reader = Reader::from_str(input);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                return if element.name().as_ref() == b"metadata" {
                    Ok(())
                } else {
                    Err(MetadataError::malformed(format!(
                        "unexpected root element <{}>",
                        String::from_utf8_lossy(element.name().as_ref())
                    )))
                };
            }
            Ok(Event::Text(text)) if text.iter().all(u8::is_ascii_whitespace) => {}
            Ok(Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => return Err(MetadataError::malformed("document is empty")),
            Ok(_) => return Err(MetadataError::malformed("content before <metadata>")),
            Err(err) => return Err(MetadataError::malformed(err)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataXml {
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    #[serde(rename = "artifactId", default, skip_serializing_if = "Option::is_none")]
    artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    versioning: Option<VersioningXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersioningXml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot: Option<SnapshotXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    versions: Option<VersionsXml>,
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
    #[serde(rename = "snapshotVersions", default, skip_serializing_if = "Option::is_none")]
    snapshot_versions: Option<SnapshotVersionsXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotXml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(rename = "buildNumber", default, skip_serializing_if = "Option::is_none")]
    build_number: Option<u32>,
    #[serde(rename = "localCopy", default, skip_serializing_if = "Option::is_none")]
    local_copy: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionsXml {
    #[serde(rename = "version", default)]
    version: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotVersionsXml {
    #[serde(rename = "snapshotVersion", default)]
    snapshot_version: Vec<SnapshotVersionXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotVersionXml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<MetadataXml> for SnapshotMetadataDocument {
    fn from(wire: MetadataXml) -> Self {
        let versioning = wire.versioning.unwrap_or_default();
        Self {
            group_id: non_empty(wire.group_id),
            artifact_id: non_empty(wire.artifact_id),
            version: non_empty(wire.version),
            latest: non_empty(versioning.latest),
            release: non_empty(versioning.release),
            versions: versioning
                .versions
                .map(|v| v.version)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|v| non_empty(Some(v)))
                .collect(),
            snapshot: versioning.snapshot.map(|s| SnapshotPointer {
                timestamp: non_empty(s.timestamp),
                build_number: s.build_number.unwrap_or(0),
                local_copy: s.local_copy.unwrap_or(false),
            }),
            last_updated: non_empty(versioning.last_updated),
            snapshot_versions: versioning
                .snapshot_versions
                .map(|v| v.snapshot_version)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|entry| {
                    Some(SnapshotVersion {
                        value: non_empty(entry.value)?,
                        classifier: non_empty(entry.classifier),
                        extension: non_empty(entry.extension).unwrap_or_default(),
                        updated: non_empty(entry.updated),
                    })
                })
                .collect(),
        }
    }
}

impl From<SnapshotMetadataDocument> for MetadataXml {
    fn from(doc: SnapshotMetadataDocument) -> Self {
        let versioning = VersioningXml {
            latest: doc.latest,
            release: doc.release,
            snapshot: doc.snapshot.map(|s| SnapshotXml {
                timestamp: s.timestamp,
                build_number: Some(s.build_number),
                local_copy: s.local_copy.then_some(true),
            }),
            versions: (!doc.versions.is_empty()).then(|| VersionsXml {
                version: doc.versions.into_iter().collect(),
            }),
            last_updated: doc.last_updated,
            snapshot_versions: (!doc.snapshot_versions.is_empty()).then(|| SnapshotVersionsXml {
                snapshot_version: doc
                    .snapshot_versions
                    .into_iter()
                    .map(|entry| SnapshotVersionXml {
                        classifier: entry.classifier,
                        extension: Some(entry.extension),
                        value: Some(entry.value),
                        updated: entry.updated,
                    })
                    .collect(),
            }),
        };
        let has_versioning = versioning.latest.is_some()
            || versioning.release.is_some()
            || versioning.snapshot.is_some()
            || versioning.versions.is_some()
            || versioning.last_updated.is_some()
            || versioning.snapshot_versions.is_some();
        Self {
            group_id: doc.group_id,
            artifact_id: doc.artifact_id,
            version: doc.version,
            versioning: has_versioning.then_some(versioning),
        }
    }
}
