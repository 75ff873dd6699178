use depot_domain::{Resolution, ResolutionRequest};
use tracing::{debug, trace};

use crate::error::ResolveError;
use crate::registry::SharedRepository;

/// First hit wins; later candidates are never queried.
pub(super) fn resolve(
    request: &ResolutionRequest,
    candidates: &[SharedRepository],
) -> Result<Resolution, ResolveError> {
    let checksum = request.is_checksum();
    for repo in candidates {
        if !checksum && !repo.kind().is_local_tier() && !repo.handles_releases() {
            trace!(repo = %repo.key(), "remote does not handle releases, skipping");
            continue;
        }
        let descriptor = repo.describe(&request.path)?;
        if descriptor.found {
            debug!(repo = %repo.key(), path = %request.path, "resolved");
            return Ok(Resolution::found(descriptor));
        }
    }
    debug!(path = %request.path, "not found in any candidate");
    Ok(Resolution::not_found(format!(
        "{} not found in {} candidate repositories",
        request.path,
        candidates.len()
    )))
}
