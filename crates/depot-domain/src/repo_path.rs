use std::fmt;

use serde::{Deserialize, Serialize};

/// A location inside one repository: the repository key plus a slash
/// separated, case-sensitive path without leading or trailing slashes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoPath {
    repo_key: String,
    path: String,
}

impl RepoPath {
    pub fn new(repo_key: impl Into<String>, path: &str) -> Self {
        Self {
            repo_key: repo_key.into(),
            path: normalize_path(path),
        }
    }

    #[must_use]
    pub fn repo_key(&self) -> &str {
        &self.repo_key
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, or the empty string for the repository root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// The containing directory, or `None` for the repository root.
    #[must_use]
    pub fn parent(&self) -> Option<RepoPath> {
        if self.is_root() {
            return None;
        }
        let parent = match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        };
        Some(Self {
            repo_key: self.repo_key.clone(),
            path: parent.to_string(),
        })
    }

    #[must_use]
    pub fn join(&self, child: &str) -> RepoPath {
        let child = normalize_path(child);
        let path = match (self.path.is_empty(), child.is_empty()) {
            (true, _) => child,
            (false, true) => self.path.clone(),
            (false, false) => format!("{}/{child}", self.path),
        };
        Self {
            repo_key: self.repo_key.clone(),
            path,
        }
    }

    /// Same path under a sibling name in the same directory.
    #[must_use]
    pub fn with_name(&self, name: &str) -> RepoPath {
        match self.parent() {
            Some(parent) => parent.join(name),
            None => RepoPath::new(self.repo_key.clone(), name),
        }
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repo_key, self.path)
    }
}

/// Strips leading/trailing slashes and drops empty, `.` and `..` segments,
/// so a path can never leave its repository.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes() {
        let path = RepoPath::new("libs", "/org//acme/foo/");
        assert_eq!(path.path(), "org/acme/foo");
        assert_eq!(path, RepoPath::new("libs", "org/acme/foo"));
    }

    #[test]
    fn dot_segments_are_dropped() {
        let path = RepoPath::new("libs", "org/../acme/./foo/..");
        assert_eq!(path.path(), "org/acme/foo");
        assert_eq!(path.join("../bar").path(), "org/acme/foo/bar");
        assert!(RepoPath::new("libs", "../..").is_root());
    }

    #[test]
    fn equality_is_case_sensitive_and_keyed_by_repo() {
        assert_ne!(RepoPath::new("libs", "a/B"), RepoPath::new("libs", "a/b"));
        assert_ne!(RepoPath::new("libs", "a/b"), RepoPath::new("other", "a/b"));
    }

    #[test]
    fn parent_and_name_walk_the_tree() {
        let path = RepoPath::new("libs", "org/acme/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar");
        assert_eq!(path.name(), "foo-1.0-SNAPSHOT.jar");
        let dir = path.parent().unwrap();
        assert_eq!(dir.path(), "org/acme/foo/1.0-SNAPSHOT");
        assert_eq!(dir.join("maven-metadata.xml").path(), "org/acme/foo/1.0-SNAPSHOT/maven-metadata.xml");

        let top = RepoPath::new("libs", "org");
        assert!(top.parent().unwrap().is_root());
        assert!(top.parent().unwrap().parent().is_none());
    }

    #[test]
    fn with_name_replaces_last_segment() {
        let path = RepoPath::new("libs", "a/b/c.jar");
        assert_eq!(path.with_name("d.jar").path(), "a/b/d.jar");
        assert_eq!(RepoPath::new("libs", "c.jar").with_name("d.jar").path(), "d.jar");
    }
}
