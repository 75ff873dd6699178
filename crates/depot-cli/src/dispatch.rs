use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use depot_core::domain::maven::is_snapshot_metadata_path;
use depot_core::domain::{RepoPath, Resolution, ResolutionRequest};
use depot_core::{
    BackingRepository, BuildNumberAllocator, Config, ConfigurationError, DeployError,
    MetadataStore, MetadataStoreError, Repositories, RepositoryRegistry, ResolveError, Settings,
    StorageError, SystemClock,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cli::{CommandCli, DeployArgs, DepotCli, MetadataArgs, ResolveArgs};
use crate::output::{Outcome, Status};

pub fn run(cli: &DepotCli) -> Result<Outcome> {
    let settings = Settings::from_env();
    let config_path = cli.config.clone().unwrap_or(settings.config_path);
    let peer = cli.peer || settings.peer;

    let repositories = match Config::load(&config_path).and_then(|config| config.build()) {
        Ok(repositories) => repositories,
        Err(err) => return Ok(config_failure(&config_path, &err)),
    };
    debug!(config = %config_path.display(), peer, "repositories ready");

    match &cli.command {
        CommandCli::Resolve(args) => resolve(&repositories, peer, args),
        CommandCli::Deploy(args) => deploy(&repositories, args),
        CommandCli::Metadata(args) => metadata(&repositories, args),
    }
}

fn resolve(repositories: &Repositories, peer: bool, args: &ResolveArgs) -> Result<Outcome> {
    let request = ResolutionRequest::new(args.repo.clone(), &args.path)
        .head_only(args.head)
        .if_modified_since(args.if_modified_since)
        .from_peer(peer);
    let resolution = match repositories.engine().resolve(&request) {
        Ok(resolution) => resolution,
        Err(err) => return Ok(resolve_failure(&err)),
    };

    let mut details = serde_json::to_value(&resolution)?;
    let resolved = match &resolution {
        Resolution::Found(resolved) => resolved,
        Resolution::NotFound { reason } => {
            return Ok(Outcome::new(
                Status::NotFound,
                format!("{} not found: {reason}", request.path),
                details,
            ));
        }
    };

    if let Some(since) = request.if_modified_since {
        if !resolution.is_modified_since(since) {
            insert(&mut details, "not_modified", json!(true));
            return Ok(Outcome::ok(
                format!("{} not modified since {since}", request.path),
                details,
            ));
        }
    }

    let message = format!("{} resolved from {}", request.path, resolved.repository);
    if request.head_only {
        return Ok(Outcome::ok(message, details));
    }

    let document = match &resolved.merged_metadata {
        Some(document) => Some(document.render()?),
        None => None,
    };
    if let Some(output) = &args.output {
        let content = match &document {
            Some(rendered) => rendered.clone().into_bytes(),
            None => read_content(repositories, &resolved.repository, &resolved.descriptor)?,
        };
        write_output(output, &content)?;
        insert(&mut details, "output", json!(output.display().to_string()));
        return Ok(Outcome::ok(message, details));
    }
    if let Some(rendered) = &document {
        insert(&mut details, "document", json!(rendered));
    }
    Ok(Outcome::ok(message, details).with_body(document))
}

fn deploy(repositories: &Repositories, args: &DeployArgs) -> Result<Outcome> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("failed to read {}", args.file.display()))?;
    let deployer = repositories.deployer(Arc::new(SystemClock));

    if is_snapshot_metadata_path(&args.path) {
        return Ok(
            match deployer.deploy_metadata(&args.repo, &args.path, &bytes, args.client_non_unique) {
                Ok(document) => Outcome::ok(
                    format!(
                        "metadata deployed to {}:{} (build {})",
                        args.repo,
                        args.path,
                        document.build_number()
                    ),
                    json!({
                        "repository": args.repo,
                        "path": args.path,
                        "build_number": document.build_number(),
                        "timestamp": document.snapshot_timestamp(),
                    }),
                ),
                Err(err) => deploy_failure(&err),
            },
        );
    }

    Ok(
        match deployer.deploy_artifact(&args.repo, &args.path, &bytes, args.client_non_unique) {
            Ok(stored) => Outcome::ok(
                format!("deployed {stored}"),
                json!({
                    "repository": stored.repo_key(),
                    "requested": args.path,
                    "path": stored.path(),
                    "size": bytes.len(),
                }),
            ),
            Err(err) => deploy_failure(&err),
        },
    )
}

fn metadata(repositories: &Repositories, args: &MetadataArgs) -> Result<Outcome> {
    let Some(repo) = repositories.handles.iter().find(|repo| repo.key() == args.repo) else {
        let err = ConfigurationError::UnknownRepository {
            key: args.repo.clone(),
        };
        return Ok(Outcome::error(Status::UserError, err.code(), err.to_string()));
    };
    let directory = RepoPath::new(args.repo.clone(), &args.dir);

    let clock = SystemClock;
    let allocator = BuildNumberAllocator::new(&**repo, &clock);
    let build_number = match allocator.last_build_number(&directory) {
        Ok(build_number) => build_number,
        Err(err) => return Ok(storage_failure(&err)),
    };
    let document = match repo.read(&directory) {
        Ok(document) => document,
        Err(MetadataStoreError::Metadata(err)) => {
            warn!(dir = %directory, %err, "recorded metadata is malformed");
            None
        }
        Err(MetadataStoreError::Storage(err)) => return Ok(storage_failure(&err)),
    };

    let Some(document) = document else {
        return Ok(Outcome::ok(
            format!("no metadata recorded for {directory}"),
            json!({
                "repository": args.repo,
                "directory": directory.path(),
                "build_number": build_number,
                "document": Value::Null,
            }),
        ));
    };
    let rendered = document.render()?;
    Ok(Outcome::ok(
        format!("{directory}: build {build_number}"),
        json!({
            "repository": args.repo,
            "directory": directory.path(),
            "build_number": build_number,
            "timestamp": document.snapshot_timestamp(),
            "versions": document.versions,
            "document": rendered,
        }),
    )
    .with_body(Some(rendered)))
}

fn read_content(
    repositories: &Repositories,
    repo_key: &str,
    descriptor: &depot_core::domain::ResourceDescriptor,
) -> Result<Vec<u8>> {
    let repo = repositories
        .registry
        .resolve(repo_key)
        .with_context(|| format!("repository `{repo_key}` disappeared"))?;
    let mut reader = repo.open(descriptor)?;
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .with_context(|| format!("failed to read {}", descriptor.repo_path))?;
    Ok(content)
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn insert(details: &mut Value, key: &str, value: Value) {
    if let Some(map) = details.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}

fn config_failure(path: &Path, err: &anyhow::Error) -> Outcome {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigurationError>())
        .map(ConfigurationError::code);
    Outcome::new(
        Status::UserError,
        format!("{err:#}"),
        json!({
            "code": code,
            "config": path.display().to_string(),
            "hint": "point DEPOT_CONFIG or --config at a depot.toml with [[repository]] entries",
        }),
    )
}

fn resolve_failure(err: &ResolveError) -> Outcome {
    let status = match err {
        ResolveError::Storage(_) => Status::Failure,
        ResolveError::Configuration(_) => Status::UserError,
    };
    Outcome::error(status, err.code(), err.to_string())
}

fn deploy_failure(err: &DeployError) -> Outcome {
    let status = match err {
        DeployError::Storage(_) | DeployError::BuildNumberExhausted { .. } => Status::Failure,
        _ => Status::UserError,
    };
    Outcome::error(status, err.code(), err.to_string())
}

fn storage_failure(err: &StorageError) -> Outcome {
    Outcome::error(Status::Failure, err.code(), err.to_string())
}
