#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use assert_cmd::{assert::Assert, cargo::cargo_bin_cmd, Command};
use serde_json::Value;
use tempfile::TempDir;

pub const SNAPSHOT_DIR: &str = "org/acme/foo/1.0-SNAPSHOT";
pub const RELEASE_JAR: &str = "org/acme/foo/1.0/foo-1.0.jar";

const CONFIG: &str = r#"
[[repository]]
key = "libs-release"
kind = "local"
path = "storage/libs-release"
handles-snapshots = false

[[repository]]
key = "libs-snapshot"
kind = "local"
path = "storage/libs-snapshot"
snapshot-policy = "unique"

[[repository]]
key = "libs-plain"
kind = "local"
path = "storage/libs-plain"
snapshot-policy = "non-unique"

[[repository]]
key = "central"
kind = "remote"
path = "storage/central"

[[repository]]
key = "central-cache"
kind = "cache"
path = "storage/central-cache"
remote = "central"
"#;

/// A temporary directory holding `depot.toml` and the repository trees.
pub struct Fixture {
    pub temp: TempDir,
    pub config: PathBuf,
}

impl Fixture {
    pub fn new(prefix: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("tempdir");
        let config = temp.path().join("depot.toml");
        fs::write(&config, CONFIG).expect("write config");
        Self { temp, config }
    }

    pub fn repo_root(&self, repo: &str) -> PathBuf {
        self.temp.path().join("storage").join(repo)
    }

    /// Writes `content` at `path` in `repo`, modified `age_secs` before now.
    pub fn place(&self, repo: &str, path: &str, content: &str, age_secs: u64) -> PathBuf {
        let file = self.repo_root(repo).join(path);
        fs::create_dir_all(file.parent().expect("parent")).expect("create dirs");
        fs::write(&file, content).expect("write file");
        let modified = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(&file)
            .and_then(|handle| handle.set_modified(modified))
            .expect("set mtime");
        file
    }

    pub fn write_input(&self, name: &str, content: &str) -> PathBuf {
        let file = self.temp.path().join("inputs").join(name);
        fs::create_dir_all(file.parent().expect("parent")).expect("create dirs");
        fs::write(&file, content).expect("write input");
        file
    }

    pub fn depot(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("depot");
        cmd.env("DEPOT_CONFIG", &self.config)
            .env_remove("DEPOT_PEER")
            .env("NO_COLOR", "1");
        cmd
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn snapshot_metadata(versions: &[&str], snapshot: Option<(&str, u32)>) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n");
    xml.push_str("  <groupId>org.acme</groupId>\n  <artifactId>foo</artifactId>\n");
    xml.push_str("  <version>1.0-SNAPSHOT</version>\n  <versioning>\n");
    if let Some((timestamp, build)) = snapshot {
        xml.push_str("    <snapshot>\n");
        if !timestamp.is_empty() {
            xml.push_str(&format!("      <timestamp>{timestamp}</timestamp>\n"));
        }
        xml.push_str(&format!("      <buildNumber>{build}</buildNumber>\n"));
        xml.push_str("    </snapshot>\n");
    }
    xml.push_str("    <versions>\n");
    for version in versions {
        xml.push_str(&format!("      <version>{version}</version>\n"));
    }
    xml.push_str("    </versions>\n  </versioning>\n</metadata>\n");
    xml
}

pub fn exists(root: &Path, path: &str) -> bool {
    root.join(path).is_file()
}
