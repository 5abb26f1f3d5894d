//! Library half of the TIS artifact crawler: every collaborator the
//! `tis-crawl` binary wires together, exposed so integration tests can
//! exercise the adaptive-fetch, classify/extract, validate, and
//! aggregate/emit stages directly instead of only black-box through the
//! CLI.

pub mod adaptive_fetcher;
pub mod aggregator;
pub mod classifier;
pub mod emitter;
pub mod extractor;
pub mod http_client;
pub mod orchestrator;
pub mod run_context;
pub mod validator;

pub use adaptive_fetcher::{AdaptiveFetcher, Depth};
pub use http_client::CatalogClient;
pub use orchestrator::{CrawlResult, DryRunSummary, RunStatistics};
pub use run_context::{CancellationToken, RunContext};
