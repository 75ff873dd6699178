use std::sync::Arc;

use depot_domain::{ResolutionRequest, TargetGroup};
use tracing::{debug, warn};

use crate::error::ConfigurationError;
use crate::registry::{RepositoryRegistry, SharedRepository};
use crate::repository::RepositoryKind;

/// Ordered repositories to consult for one request.
///
/// When the set could not be built `candidates` is empty and `issue`
/// says why; resolution then degrades instead of failing mid-walk.
#[derive(Debug, Default)]
pub struct CandidateSet {
    pub candidates: Vec<SharedRepository>,
    pub issue: Option<ConfigurationError>,
}

impl CandidateSet {
    fn unavailable(issue: ConfigurationError) -> Self {
        warn!(%issue, "candidate set unavailable");
        Self {
            candidates: Vec::new(),
            issue: Some(issue),
        }
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.candidates.iter().map(|repo| repo.key()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub struct CandidateSetBuilder {
    registry: Arc<dyn RepositoryRegistry>,
}

impl CandidateSetBuilder {
    pub fn new(registry: Arc<dyn RepositoryRegistry>) -> Self {
        Self { registry }
    }

    /// Locals (or the named target), then caches, then remotes.
    pub fn build(&self, request: &ResolutionRequest) -> CandidateSet {
        let (mut candidates, direct_cache) = match &request.target_group {
            TargetGroup::Any => (self.registry.list_local(), None),
            TargetGroup::Repository(key) => match self.registry.resolve(key) {
                Some(target) => {
                    let direct_cache = target.is_cache().then(|| Arc::clone(&target));
                    (vec![target], direct_cache)
                }
                None => {
                    return CandidateSet::unavailable(ConfigurationError::UnknownRepository {
                        key: key.clone(),
                    })
                }
            },
        };

        if direct_cache.is_none() {
            append_unique(&mut candidates, self.registry.list_caches());
        }

        if request.originates_from_peer_instance {
            debug!(path = %request.path, "peer request, remotes not consulted");
        } else if let Some(cache) = &direct_cache {
            match self.registry.own_remote_of(cache.as_ref()) {
                Some(remote) => append_unique(&mut candidates, vec![remote]),
                None => {
                    return CandidateSet::unavailable(ConfigurationError::MissingRemote {
                        cache: cache.key().to_string(),
                    })
                }
            }
        } else {
            append_unique(&mut candidates, self.registry.list_remotes());
        }

        let tier = |kind: RepositoryKind| candidates.iter().filter(|r| r.kind() == kind).count();
        debug!(
            group = %request.target_group,
            locals = tier(RepositoryKind::Local),
            caches = tier(RepositoryKind::Cache),
            remotes = tier(RepositoryKind::Remote),
            "candidate set built"
        );
        CandidateSet {
            candidates,
            issue: None,
        }
    }
}

fn append_unique(candidates: &mut Vec<SharedRepository>, more: Vec<SharedRepository>) {
    for repo in more {
        if !candidates.iter().any(|existing| existing.key() == repo.key()) {
            candidates.push(repo);
        }
    }
}
