//! `depot.toml` repository configuration and process settings.

use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use depot_domain::SnapshotPolicy;
use toml_edit::{DocumentMut, Table};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::deploy::Deployer;
use crate::engine::ResolutionEngine;
use crate::error::ConfigurationError;
use crate::fs::FsRepository;
use crate::registry::{SharedRepository, StaticRegistry};
use crate::repository::RepositoryKind;

pub const CONFIG_ENV: &str = "DEPOT_CONFIG";
pub const PEER_ENV: &str = "DEPOT_PEER";
pub const DEFAULT_CONFIG_FILE: &str = "depot.toml";

const KNOWN_FIELDS: &[&str] = &[
    "key",
    "kind",
    "path",
    "handles-releases",
    "handles-snapshots",
    "snapshot-policy",
    "remote",
];

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        matches!(self.vars.get(key).map(String::as_str), Some("1"))
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Settings taken from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_path: PathBuf,
    pub peer: bool,
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            config_path: snapshot
                .var(CONFIG_ENV)
                .filter(|value| !value.is_empty())
                .map_or_else(default_config_path, PathBuf::from),
            peer: snapshot.flag_is_enabled(PEER_ENV),
        }
    }
}

/// `./depot.toml`, else the per-user one when it exists.
fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return local;
    }
    dirs_next::config_dir()
        .map(|dir| dir.join("depot").join(DEFAULT_CONFIG_FILE))
        .filter(|candidate| candidate.is_file())
        .unwrap_or(local)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub key: String,
    pub kind: RepositoryKind,
    /// Storage root, already resolved against the config file's directory.
    pub path: PathBuf,
    pub handles_releases: bool,
    pub handles_snapshots: bool,
    pub snapshot_policy: SnapshotPolicy,
    pub remote: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub repositories: Vec<RepositoryConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::parse(&contents, base)
            .with_context(|| format!("invalid repository configuration in {}", path.display()))?;
        debug!(
            path = %path.display(),
            repositories = config.repositories.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parses `depot.toml` contents; relative storage paths resolve
    /// against `base`.
    pub fn parse(contents: &str, base: &Path) -> Result<Self> {
        let doc: DocumentMut = contents.parse().context("failed to parse TOML")?;
        let Some(item) = doc.get("repository") else {
            return Ok(Self::default());
        };
        let Some(tables) = item.as_array_of_tables() else {
            bail!(invalid("`repository` must be an array of tables ([[repository]])"));
        };

        let mut seen = HashSet::new();
        let mut repositories = Vec::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            let repository = parse_repository(table, base)
                .with_context(|| format!("in repository entry #{}", idx + 1))?;
            if !seen.insert(repository.key.clone()) {
                bail!(invalid(format!("duplicate repository key `{}`", repository.key)));
            }
            repositories.push(repository);
        }

        for cache in repositories.iter().filter(|r| r.kind == RepositoryKind::Cache) {
            let remote = cache.remote.as_deref().unwrap_or_default();
            let known = repositories
                .iter()
                .any(|r| r.key == remote && r.kind == RepositoryKind::Remote);
            if !known {
                warn!(cache = %cache.key, remote, "cache remote is not a configured remote");
            }
        }
        Ok(Self { repositories })
    }

    /// Instantiates the configured repositories in configuration order.
    pub fn build(&self) -> Result<Repositories> {
        let mut registry = StaticRegistry::new();
        let mut handles = Vec::with_capacity(self.repositories.len());
        for config in &self.repositories {
            let repository = Arc::new(
                FsRepository::new(config.key.clone(), config.kind, config.path.clone())
                    .with_handles(config.handles_releases, config.handles_snapshots)
                    .with_snapshot_policy(config.snapshot_policy),
            );
            let shared: SharedRepository = repository.clone();
            match (&config.remote, config.kind) {
                (Some(remote), RepositoryKind::Cache) => {
                    registry.register_cache(shared, remote.clone())?;
                }
                _ => registry.register(shared)?,
            }
            handles.push(repository);
        }
        Ok(Repositories {
            registry: Arc::new(registry),
            handles,
        })
    }
}

/// The configured repositories, as a registry for resolution and as
/// filesystem handles for deployment.
pub struct Repositories {
    pub registry: Arc<StaticRegistry>,
    pub handles: Vec<Arc<FsRepository>>,
}

impl Repositories {
    #[must_use]
    pub fn engine(&self) -> ResolutionEngine {
        ResolutionEngine::new(self.registry.clone())
    }

    #[must_use]
    pub fn deployer(&self, clock: Arc<dyn Clock>) -> Deployer {
        Deployer::new(self.handles.iter().cloned(), clock)
    }
}

fn parse_repository(table: &Table, base: &Path) -> Result<RepositoryConfig> {
    if let Some((unknown, _)) = table.iter().find(|(name, _)| !KNOWN_FIELDS.contains(name)) {
        bail!(invalid(format!("unknown field `{unknown}`")));
    }

    let key = required_str(table, "key")?.to_string();
    let kind = match required_str(table, "kind")? {
        "local" => RepositoryKind::Local,
        "cache" => RepositoryKind::Cache,
        "remote" => RepositoryKind::Remote,
        other => bail!(invalid(format!(
            "`{key}`: unknown kind `{other}` (expected local, cache or remote)"
        ))),
    };
    let path = base.join(required_str(table, "path")?);

    let snapshot_policy = match optional_str(table, "snapshot-policy")? {
        Some(_) if kind != RepositoryKind::Local => {
            bail!(invalid(format!(
                "`{key}`: snapshot-policy only applies to local repositories"
            )))
        }
        Some(value) => value
            .parse::<SnapshotPolicy>()
            .map_err(|err| invalid(format!("`{key}`: {err}")))?,
        None => SnapshotPolicy::default(),
    };

    let remote = optional_str(table, "remote")?.map(ToString::to_string);
    match (kind, &remote) {
        (RepositoryKind::Cache, None) => {
            bail!(invalid(format!("cache `{key}` must name its `remote`")))
        }
        (RepositoryKind::Local | RepositoryKind::Remote, Some(_)) => {
            bail!(invalid(format!("`{key}`: only caches have a `remote`")))
        }
        _ => {}
    }

    Ok(RepositoryConfig {
        handles_releases: optional_bool(table, "handles-releases")?.unwrap_or(true),
        handles_snapshots: optional_bool(table, "handles-snapshots")?.unwrap_or(true),
        key,
        kind,
        path,
        snapshot_policy,
        remote,
    })
}

fn invalid(message: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Invalid {
        message: message.into(),
    }
}

fn required_str<'t>(table: &'t Table, field: &str) -> Result<&'t str> {
    match optional_str(table, field)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!(invalid(format!("missing required field `{field}`"))),
    }
}

fn optional_str<'t>(table: &'t Table, field: &str) -> Result<Option<&'t str>> {
    match table.get(field) {
        None => Ok(None),
        Some(item) => match item.as_str() {
            Some(value) => Ok(Some(value)),
            None => bail!(invalid(format!("`{field}` must be a string"))),
        },
    }
}

fn optional_bool(table: &Table, field: &str) -> Result<Option<bool>> {
    match table.get(field) {
        None => Ok(None),
        Some(item) => match item.as_bool() {
            Some(value) => Ok(Some(value)),
            None => bail!(invalid(format!("`{field}` must be a boolean"))),
        },
    }
}
