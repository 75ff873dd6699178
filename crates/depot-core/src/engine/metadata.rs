use depot_domain::{
    RepoPath, Resolution, ResolutionRequest, Resolved, ResourceDescriptor,
    SnapshotMetadataDocument,
};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::snapshot::{evaluate, Evaluated};
use crate::error::{ResolveError, StorageError};
use crate::registry::SharedRepository;
use crate::repository::read_all;

type Contribution = (Evaluated, SnapshotMetadataDocument);

/// Merges the metadata document of every evaluated hit, in candidate order.
pub(super) fn resolve_metadata(
    request: &ResolutionRequest,
    candidates: &[SharedRepository],
) -> Result<Resolution, ResolveError> {
    let hits = evaluate(&request.path, candidates)?
        .into_iter()
        .filter(|(_, descriptor)| descriptor.found)
        .collect::<Vec<_>>();

    let contributions = hits
        .into_par_iter()
        .map(fetch_document)
        .collect::<Result<Vec<_>, StorageError>>()?;

    let mut contributions = contributions.into_iter().flatten();
    let Some(((first_repo, first_descriptor), mut merged)) = contributions.next() else {
        debug!(path = %request.path, "no parseable metadata in any candidate");
        return Ok(Resolution::not_found(format!(
            "no metadata document for {}",
            request.path
        )));
    };

    let mut last_modified = first_descriptor.last_modified;
    let mut contributors = 1usize;
    for ((_, descriptor), document) in contributions {
        merged.merge(document);
        last_modified = last_modified.max(descriptor.last_modified);
        contributors += 1;
    }
    debug!(path = %request.path, contributors, "metadata merged");

    let repository = first_repo.key().to_string();
    Ok(Resolution::Found(Resolved {
        descriptor: ResourceDescriptor::found(
            RepoPath::new(repository.clone(), &request.path),
            last_modified,
        ),
        repository,
        merged_metadata: Some(merged),
    }))
}

fn fetch_document(hit: Evaluated) -> Result<Option<Contribution>, StorageError> {
    let (repo, descriptor) = &hit;
    let bytes = read_all(repo.as_ref(), descriptor)?;
    match SnapshotMetadataDocument::from_bytes(&bytes) {
        Ok(document) => Ok(Some((hit, document))),
        Err(err) => {
            warn!(repo = %repo.key(), path = %descriptor.repo_path.path(), %err, "ignoring malformed metadata");
            Ok(None)
        }
    }
}
