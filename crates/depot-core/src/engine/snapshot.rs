use std::sync::Arc;

use depot_domain::{Resolution, ResolutionRequest, ResourceDescriptor};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{ResolveError, StorageError};
use crate::registry::SharedRepository;

pub(super) type Evaluated = (SharedRepository, ResourceDescriptor);

/// Describes `path` in every snapshot-capable candidate, except remotes that
/// come after the first local-tier hit.
///
/// The local tier is described concurrently first; remotes only when they
/// precede the first local-tier hit. Results come back in candidate order.
pub(super) fn evaluate(
    path: &str,
    candidates: &[SharedRepository],
) -> Result<Vec<Evaluated>, ResolveError> {
    let (local_tier, remote_tier): (Vec<usize>, Vec<usize>) = candidates
        .iter()
        .enumerate()
        .filter(|(_, repo)| repo.handles_snapshots())
        .map(|(idx, _)| idx)
        .partition(|&idx| candidates[idx].kind().is_local_tier());

    let mut slots: Vec<Option<ResourceDescriptor>> = vec![None; candidates.len()];
    for (idx, descriptor) in describe_slots(path, candidates, &local_tier)? {
        slots[idx] = Some(descriptor);
    }

    let first_local_hit = local_tier
        .iter()
        .copied()
        .find(|&idx| slots[idx].as_ref().is_some_and(|d| d.found));
    let (remotes, skipped): (Vec<usize>, Vec<usize>) = remote_tier
        .into_iter()
        .partition(|&idx| first_local_hit.map_or(true, |hit| idx < hit));
    if !skipped.is_empty() {
        debug!(path, skipped = skipped.len(), "local tier hit, remotes skipped");
    }
    for (idx, descriptor) in describe_slots(path, candidates, &remotes)? {
        slots[idx] = Some(descriptor);
    }

    Ok(candidates
        .iter()
        .zip(slots)
        .filter_map(|(repo, slot)| slot.map(|descriptor| (Arc::clone(repo), descriptor)))
        .collect())
}

fn describe_slots(
    path: &str,
    candidates: &[SharedRepository],
    indices: &[usize],
) -> Result<Vec<(usize, ResourceDescriptor)>, StorageError> {
    indices
        .par_iter()
        .map(|&idx| candidates[idx].describe(path).map(|d| (idx, d)))
        .collect()
}

/// Latest `lastModified` among evaluated hits; ties keep the earlier candidate.
pub(super) fn resolve_artifact(
    request: &ResolutionRequest,
    candidates: &[SharedRepository],
) -> Result<Resolution, ResolveError> {
    let evaluated = evaluate(&request.path, candidates)?;

    let local_hits = evaluated
        .iter()
        .filter(|(repo, d)| d.found && repo.kind().is_local_tier())
        .map(|(repo, _)| repo.key())
        .collect::<Vec<_>>();
    if local_hits.len() > 1 {
        warn!(
            path = %request.path,
            repos = ?local_hits,
            "snapshot present in more than one local-tier repository"
        );
    }

    let mut winner: Option<&ResourceDescriptor> = None;
    for (_, descriptor) in evaluated.iter().filter(|(_, d)| d.found) {
        match winner {
            Some(current) if descriptor.last_modified <= current.last_modified => {}
            _ => winner = Some(descriptor),
        }
    }

    match winner {
        Some(descriptor) => {
            debug!(repo = %descriptor.repo_key(), path = %request.path, "latest snapshot selected");
            Ok(Resolution::found(descriptor.clone()))
        }
        None if evaluated.iter().any(|(_, d)| d.negative_cached) => {
            debug!(path = %request.path, "snapshot miss remembered by cache");
            Ok(Resolution::not_found("cached miss"))
        }
        None => {
            debug!(path = %request.path, "snapshot not found");
            Ok(Resolution::not_found(format!(
                "{} not found in {} snapshot repositories",
                request.path,
                evaluated.len()
            )))
        }
    }
}
