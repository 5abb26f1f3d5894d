//! Adaptive-depth fetch policy layered over [`CatalogClient`].
//!
//! A single node id can require very different fetch depths depending on
//! how large its subtree is; this module narrows the depth for a node as
//! soon as a fetch takes "too long", remembers that narrowing for the rest
//! of the run, and falls back to a bounded sequence of retries before
//! giving up.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tis_common::config::ResolvedConfig;
use tracing::{debug, warn};

use crate::http_client::CatalogClient;

/// A fetch depth, where `-1` means "unlimited".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Depth(pub i64);

impl Depth {
    pub const UNLIMITED: Depth = Depth(-1);

    pub fn is_unlimited(self) -> bool {
        self == Self::UNLIMITED
    }
}

/// Extra seconds of read timeout added per unit of fetch depth when
/// computing the iterative-mode timeout.
const DEPTH_TIMEOUT_SLOPE_SECONDS: f64 = 5.0;

/// Read timeout for the single unlimited-depth probe attempted before
/// falling back to iterative mode.
const UNLIMITED_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AdaptiveFetcher<'a> {
    client: &'a CatalogClient,
    default_depth: i64,
    min_depth: i64,
    depth_step: i64,
    adaptive_timeout_threshold: f64,
    retry_backoff_seconds: Vec<f64>,
    final_timeout_seconds: f64,
    /// Per-node depth override, monotonically non-increasing within a run.
    overrides: Mutex<HashMap<String, i64>>,
    failed_components: Mutex<Vec<String>>,
    /// Count of timeout-driven retries observed across the iterative phase
    /// (§4.2 step 2, "record a timeout retry"); a performance/diagnostics
    /// counter, not used for any control-flow decision.
    timeout_retries: AtomicU64,
    /// Count of depth reductions actually persisted as an override, either
    /// from a timeout (iterative phase) or from a slow-but-successful
    /// fetch.
    depth_reductions: AtomicU64,
}

impl<'a> AdaptiveFetcher<'a> {
    pub fn new(client: &'a CatalogClient, config: &ResolvedConfig) -> Self {
        Self {
            client,
            default_depth: config.optimization.children_level,
            min_depth: config.optimization.min_children_level,
            depth_step: config.optimization.depth_reduction_step,
            adaptive_timeout_threshold: config.optimization.adaptive_timeout_threshold,
            retry_backoff_seconds: config.optimization.retry_backoff_seconds.clone(),
            final_timeout_seconds: config.optimization.final_timeout_seconds,
            overrides: Mutex::new(HashMap::new()),
            failed_components: Mutex::new(Vec::new()),
            timeout_retries: AtomicU64::new(0),
            depth_reductions: AtomicU64::new(0),
        }
    }

    pub fn failed_components(&self) -> Vec<String> {
        self.failed_components.lock().unwrap().clone()
    }

    /// Number of timeout-driven retries observed so far (§4.2 step 2).
    pub fn timeout_retry_count(&self) -> u64 {
        self.timeout_retries.load(Ordering::Relaxed)
    }

    /// Number of depth reductions actually persisted as an override so far.
    pub fn depth_reduction_count(&self) -> u64 {
        self.depth_reductions.load(Ordering::Relaxed)
    }

    /// Current persisted depth override for a node, if any.
    pub fn override_for(&self, node_id: &str) -> Option<i64> {
        self.overrides.lock().unwrap().get(node_id).copied()
    }

    fn store_override(&self, node_id: &str, depth: i64) {
        let mut overrides = self.overrides.lock().unwrap();
        match overrides.get_mut(node_id) {
            // Monotonically non-increasing: never raise an override once set.
            Some(entry) => {
                if depth < *entry {
                    *entry = depth;
                }
            }
            None => {
                overrides.insert(node_id.to_string(), depth);
                drop(overrides);
                self.depth_reductions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Fetch a node's subtree, returning the parsed body and the depth
    /// that was actually used to fetch it.
    pub async fn get_node(&self, node_id: &str) -> (Option<Value>, Depth) {
        if self.default_depth == Depth::UNLIMITED.0 && self.override_for(node_id).is_none() {
            let outcome = self
                .client
                .get_node(node_id, Depth::UNLIMITED.0, Some(UNLIMITED_PROBE_TIMEOUT), false)
                .await;
            if let Some(body) = outcome.body {
                return (Some(body), Depth::UNLIMITED);
            }
            if outcome.timed_out {
                debug!(node_id, "unlimited-depth probe timed out, switching to iterative mode");
                self.store_override(node_id, 1);
            } else {
                self.failed_components.lock().unwrap().push(node_id.to_string());
                return (None, Depth(self.min_depth));
            }
        }

        if let Some((body, depth)) = self.iterative_phase(node_id).await {
            return (Some(body), depth);
        }

        if let Some(body) = self.min_depth_retry_phase(node_id).await {
            return (Some(body), Depth(self.min_depth));
        }

        if let Some(body) = self.final_attempt_phase(node_id).await {
            return (Some(body), Depth(self.min_depth));
        }

        warn!(node_id, "all fetch phases exhausted, treating as failed component");
        self.failed_components.lock().unwrap().push(node_id.to_string());
        (None, Depth(self.min_depth))
    }

    async fn iterative_phase(&self, node_id: &str) -> Option<(Value, Depth)> {
        let mut current_depth = self.override_for(node_id).unwrap_or(self.default_depth);
        if current_depth == Depth::UNLIMITED.0 {
            current_depth = self.default_depth.max(self.min_depth);
        }

        while current_depth >= self.min_depth {
            let read_timeout = Duration::from_secs_f64(
                self.adaptive_timeout_threshold
                    + current_depth as f64 * DEPTH_TIMEOUT_SLOPE_SECONDS,
            );
            let started = Instant::now();
            let outcome = self
                .client
                .get_node(node_id, current_depth, Some(read_timeout), false)
                .await;
            let elapsed = started.elapsed().as_secs_f64();

            if let Some(body) = outcome.body {
                if elapsed > self.adaptive_timeout_threshold && current_depth > self.min_depth {
                    let narrowed = (current_depth - self.depth_step).max(self.min_depth);
                    self.store_override(node_id, narrowed);
                    debug!(node_id, narrowed, "fetch succeeded but was slow, narrowing depth");
                }
                return Some((body, Depth(current_depth)));
            }

            if outcome.timed_out {
                self.timeout_retries.fetch_add(1, Ordering::Relaxed);
                let narrowed = current_depth - self.depth_step;
                debug!(node_id, current_depth, narrowed, "iterative fetch timed out, reducing depth");
                if narrowed >= self.min_depth {
                    self.store_override(node_id, narrowed);
                }
                current_depth = narrowed;
                continue;
            }

            // Non-timeout error: stop this phase, fall through to phase 3.
            return None;
        }

        None
    }

    async fn min_depth_retry_phase(&self, node_id: &str) -> Option<Value> {
        for (attempt, seconds) in self.retry_backoff_seconds.iter().enumerate() {
            tokio::time::sleep(Duration::from_secs_f64(*seconds)).await;
            let read_timeout =
                Duration::from_secs_f64(self.adaptive_timeout_threshold + attempt as f64 * DEPTH_TIMEOUT_SLOPE_SECONDS);
            let outcome = self
                .client
                .get_node(node_id, self.min_depth, Some(read_timeout), true)
                .await;
            if let Some(body) = outcome.body {
                return Some(body);
            }
        }
        None
    }

    async fn final_attempt_phase(&self, node_id: &str) -> Option<Value> {
        let read_timeout = Duration::from_secs_f64(self.final_timeout_seconds);
        let outcome = self
            .client
            .get_node(node_id, self.min_depth, Some(read_timeout), true)
            .await;
        outcome.body
    }
}
