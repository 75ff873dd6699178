#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

mod candidates;
mod clock;
pub mod config;
mod deploy;
mod engine;
mod error;
mod fs;
mod metadata_store;
mod registry;
mod repository;

#[cfg(test)]
mod testing;

pub use candidates::{CandidateSet, CandidateSetBuilder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, Repositories, RepositoryConfig, Settings};
pub use deploy::{BuildNumberAllocator, Deployer, SnapshotPathRewriter};
pub use engine::ResolutionEngine;
pub use error::{
    ConfigurationError, DeployError, MetadataStoreError, ResolveError, StorageError,
};
pub use fs::{FsRepository, MISS_MARKER_SUFFIX};
pub use metadata_store::MetadataStore;
pub use registry::{RepositoryRegistry, SharedRepository, StaticRegistry};
pub use repository::{BackingRepository, RepositoryKind};

pub use depot_domain as domain;
