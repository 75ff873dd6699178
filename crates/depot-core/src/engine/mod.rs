//! Request resolution over an ordered candidate set.

use std::sync::Arc;

use depot_domain::{RequestKind, Resolution, ResolutionRequest};
use tracing::debug;

use crate::candidates::CandidateSetBuilder;
use crate::error::{ConfigurationError, ResolveError};
use crate::registry::RepositoryRegistry;

mod metadata;
mod snapshot;
mod standard;

pub struct ResolutionEngine {
    candidates: CandidateSetBuilder,
}

impl ResolutionEngine {
    pub fn new(registry: Arc<dyn RepositoryRegistry>) -> Self {
        Self {
            candidates: CandidateSetBuilder::new(registry),
        }
    }

    /// Resolves `request` to a single outcome.
    ///
    /// `Ok(Resolution::NotFound)` means nothing satisfied the request
    /// (including an unknown target repository); `Err` means the answer
    /// could not be determined.
    pub fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        let set = self.candidates.build(request);
        if let Some(issue) = set.issue {
            return match issue {
                ConfigurationError::UnknownRepository { .. } => {
                    Ok(Resolution::not_found(issue.to_string()))
                }
                other => Err(other.into()),
            };
        }

        let kind = request.kind();
        debug!(path = %request.path, ?kind, candidates = set.candidates.len(), "resolving");
        match kind {
            RequestKind::Standard => standard::resolve(request, &set.candidates),
            RequestKind::SnapshotArtifact => snapshot::resolve_artifact(request, &set.candidates),
            RequestKind::SnapshotMetadata => metadata::resolve_metadata(request, &set.candidates),
        }
    }
}
