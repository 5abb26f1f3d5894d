//! Shared types, configuration model, and error catalog for the TIS
//! artifact crawler.
//!
//! This crate has no I/O of its own: it defines the data model shared
//! between the HTTP/fetch layer, the classifier/extractor, the validator,
//! and the aggregator, all of which live in `tis-crawl`.

pub mod config;
pub mod errors;
pub mod ticks;
pub mod types;

pub use config::{ResolvedConfig, load as load_config};
pub use errors::{TisError, TisResult};
pub use types::{
    Artifact, ArtifactCommon, ArtifactExtension, DeviationType, LcoExt, NodeId, ProjectOutput,
    RawAttribute, SoftwareLineOutput, TestExt, TreeNode, ValidationOutcome,
};
