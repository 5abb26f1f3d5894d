//! BFS traversal over the catalog tree: root → projects → software lines →
//! recursive subtrees via the adaptive fetcher, with a bounded worker pool,
//! branch pruning, iterative leaf exploration, cancellation, and rate
//! limiting.

use std::collections::VecDeque;
use std::sync::Arc;

use tis_common::config::ResolvedConfig;
use tis_common::errors::{TisError, TisResult};
use tis_common::types::{Artifact, NodeId, TreeNode};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::adaptive_fetcher::AdaptiveFetcher;
use crate::aggregator::SoftwareLineKey;
use crate::classifier;
use crate::extractor;
use crate::run_context::{CancellationToken, RunContext};

/// Tallies accumulated by the orchestrator's main task only — no worker
/// task mutates shared state directly; folding results back into one
/// accumulator avoids needing a lock beyond the final results.
#[derive(Debug, Default, Clone)]
pub struct RunStatistics {
    pub branches_pruned: u64,
    pub nodes_visited: u64,
    pub failed_components: Vec<String>,
}

impl RunStatistics {
    fn fold(&mut self, other: RunStatistics) {
        self.branches_pruned += other.branches_pruned;
        self.nodes_visited += other.nodes_visited;
        self.failed_components.extend(other.failed_components);
    }
}

pub struct CrawlResult {
    pub known_lines: Vec<SoftwareLineKey>,
    pub artifacts: Vec<Artifact>,
    pub statistics: RunStatistics,
}

/// Connectivity-only counts for `--dry-run`: fetch the root and each
/// included project's direct children, without descending into any
/// software line's own subtree or extracting artifacts.
pub struct DryRunSummary {
    pub project_count: usize,
    pub software_line_count: usize,
}

pub async fn dry_run(fetcher: &AdaptiveFetcher<'_>, config: &ResolvedConfig) -> TisResult<DryRunSummary> {
    let (root_body, _) = fetcher.get_node(&config.api.root_node_id).await;
    let root_body = root_body.ok_or_else(|| TisError::root_fetch_failed(config.api.root_node_id.clone()))?;
    let root: TreeNode = serde_json::from_value(root_body)
        .map_err(|e| TisError::config_invalid(format!("root node response was not a valid tree node: {e}")))?;

    let mut project_count = 0;
    let mut software_line_count = 0;

    for project in root.children.unwrap_or_default() {
        if should_skip_project(&project.name, config) {
            continue;
        }
        project_count += 1;
        if let Ok(project_subtree) = fetch_project_software_lines(fetcher, &project.id).await {
            software_line_count += project_subtree
                .children
                .unwrap_or_default()
                .iter()
                .filter(|line| should_include_software_line(&line.name, config))
                .count();
        }
    }

    Ok(DryRunSummary { project_count, software_line_count })
}

/// Runs the full crawl: root → projects → software lines, each software
/// line processed independently under the bounded semaphore.
pub async fn run(
    fetcher: Arc<AdaptiveFetcher<'_>>,
    config: Arc<ResolvedConfig>,
    ctx: &RunContext,
) -> TisResult<CrawlResult> {
    let (root_body, _) = fetcher.get_node(&config.api.root_node_id).await;
    let root_body = root_body.ok_or_else(|| TisError::root_fetch_failed(config.api.root_node_id.clone()))?;
    let root: TreeNode = serde_json::from_value(root_body)
        .map_err(|e| TisError::config_invalid(format!("root node response was not a valid tree node: {e}")))?;

    let mut known_lines = Vec::new();
    let mut artifacts = Vec::new();
    let mut statistics = RunStatistics::default();

    let projects = root.children.unwrap_or_default();
    let semaphore = Arc::new(Semaphore::new(config.optimization.concurrent_requests.max(1)));

    for project in projects {
        if ctx.is_cancelled() {
            warn!("cancellation observed before project was processed; stopping");
            break;
        }
        if should_skip_project(&project.name, &config) {
            continue;
        }

        let Ok(project_subtree) = fetch_project_software_lines(&fetcher, &project.id).await else {
            continue;
        };

        let software_lines: Vec<TreeNode> = project_subtree.children.unwrap_or_default();
        let mut batch = Vec::new();

        for line in software_lines {
            if !should_include_software_line(&line.name, &config) {
                continue;
            }
            let project_name = project.name.clone();
            let project_id = project.id.clone();
            let fetcher = fetcher.clone();
            let config = config.clone();
            let semaphore = semaphore.clone();
            let cancellation = ctx.cancellation().clone();
            batch.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                process_software_line(&fetcher, &config, &line, &project_name, &project_id, &cancellation).await
            }));
        }

        for handle in batch {
            match handle.await {
                Ok(outcome) => {
                    known_lines.push(outcome.key);
                    artifacts.extend(outcome.artifacts);
                    statistics.fold(outcome.statistics);
                }
                Err(join_error) => {
                    warn!(error = %join_error, "a software-line task panicked; its contribution is dropped");
                }
            }
        }

        tokio::time::sleep(std::time::Duration::from_secs_f64(config.optimization.rate_limit_delay)).await;
    }

    info!(
        projects = known_lines.len(),
        artifacts = artifacts.len(),
        failed = statistics.failed_components.len(),
        "crawl complete"
    );

    Ok(CrawlResult {
        known_lines,
        artifacts,
        statistics,
    })
}

fn should_skip_project(name: &str, config: &ResolvedConfig) -> bool {
    let pruning = &config.branch_pruning;
    if pruning.skip_projects.iter().any(|s| s == name) {
        return true;
    }
    if !pruning.include_projects.is_empty() && !pruning.include_projects.iter().any(|s| s == name) {
        return true;
    }
    false
}

fn should_include_software_line(name: &str, config: &ResolvedConfig) -> bool {
    let pruning = &config.branch_pruning;
    pruning.include_software_lines.is_empty() || pruning.include_software_lines.iter().any(|s| s == name)
}

async fn fetch_project_software_lines(fetcher: &AdaptiveFetcher<'_>, project_id: &NodeId) -> TisResult<TreeNode> {
    let (body, _) = fetcher.get_node(project_id.as_str()).await;
    let body = body.ok_or_else(|| TisError::transport(format!("project {project_id} could not be fetched")))?;
    serde_json::from_value(body)
        .map_err(|e| TisError::transport(format!("project {project_id} response was malformed: {e}")))
}

struct SoftwareLineOutcome {
    key: SoftwareLineKey,
    artifacts: Vec<Artifact>,
    statistics: RunStatistics,
}

/// Fetches one software line's subtree, collects candidate artifacts from
/// it, determines unexplored leaves if the fetch was depth-limited, and
/// iteratively drains those leaves in batches.
async fn process_software_line(
    fetcher: &AdaptiveFetcher<'_>,
    config: &ResolvedConfig,
    line: &TreeNode,
    project_name: &str,
    project_id: &NodeId,
    cancellation: &CancellationToken,
) -> SoftwareLineOutcome {
    let key = SoftwareLineKey {
        project_name: project_name.to_string(),
        project_id: project_id.clone(),
        software_line_name: line.name.clone(),
        software_line_id: line.id.clone(),
    };

    let mut statistics = RunStatistics::default();
    let mut artifacts = Vec::new();

    let (body, depth_used) = fetcher.get_node(line.id.as_str()).await;
    let Some(body) = body else {
        statistics.failed_components.push(line.id.to_string());
        return SoftwareLineOutcome { key, artifacts, statistics };
    };

    let Ok(subtree) = serde_json::from_value::<TreeNode>(body) else {
        statistics.failed_components.push(line.id.to_string());
        return SoftwareLineOutcome { key, artifacts, statistics };
    };

    // `subtree`'s own name equals `line.name`: `ancestors` here is the path
    // to `subtree`'s *parent*, since `walk_subtree` appends `node.name`
    // itself when descending to children. Seeding this with `line.name`
    // already included would double the software-line segment in every
    // descendant's uploadPath.
    let ancestors = vec![project_name.to_string()];
    walk_subtree(&subtree, &ancestors, &mut artifacts, &mut statistics, config);

    let mut unexplored: VecDeque<(NodeId, Vec<String>)> = VecDeque::new();
    if depth_used.0 != -1 {
        collect_unexplored_leaves(&subtree, depth_used.0, &ancestors, &mut unexplored, config);
    }

    while !unexplored.is_empty() {
        if cancellation.is_cancelled() {
            warn!("cancellation observed mid software-line; no further leaf batches will be enqueued");
            break;
        }

        let mut batch_results = Vec::new();
        for _ in 0..unexplored.len() {
            let Some((leaf_id, leaf_ancestors)) = unexplored.pop_front() else { break };
            let (leaf_body, leaf_depth) = fetcher.get_node(leaf_id.as_str()).await;
            batch_results.push((leaf_body, leaf_depth, leaf_ancestors));
        }

        for (body, depth_used, leaf_ancestors) in batch_results {
            let Some(body) = body else {
                continue;
            };
            let Ok(subtree) = serde_json::from_value::<TreeNode>(body) else {
                continue;
            };
            walk_subtree(&subtree, &leaf_ancestors, &mut artifacts, &mut statistics, config);
            if depth_used.0 != -1 {
                collect_unexplored_leaves(&subtree, depth_used.0, &leaf_ancestors, &mut unexplored, config);
            }
        }
    }

    SoftwareLineOutcome { key, artifacts, statistics }
}

fn walk_subtree(
    node: &TreeNode,
    ancestors: &[String],
    artifacts: &mut Vec<Artifact>,
    statistics: &mut RunStatistics,
    config: &ResolvedConfig,
) {
    statistics.nodes_visited += 1;

    if classifier::is_artifact_candidate(node, config) {
        artifacts.push(extractor::extract(node, ancestors, config));
    }

    let Some(children) = &node.children else { return };
    for child in children {
        if classifier::is_pruned(&child.name, config) {
            statistics.branches_pruned += 1;
            continue;
        }
        let mut child_ancestors = ancestors.to_vec();
        child_ancestors.push(node.name.clone());
        walk_subtree(child, &child_ancestors, artifacts, statistics, config);
    }
}

/// Finds children at `depth_used − 1` whose own children exist but were not
/// fetched (depth exhausted), enqueuing them for a follow-up fetch.
fn collect_unexplored_leaves(
    node: &TreeNode,
    depth_used: i64,
    ancestors: &[String],
    out: &mut VecDeque<(NodeId, Vec<String>)>,
    config: &ResolvedConfig,
) {
    fn walk(
        node: &TreeNode,
        remaining_depth: i64,
        ancestors: &[String],
        out: &mut VecDeque<(NodeId, Vec<String>)>,
        config: &ResolvedConfig,
    ) {
        let Some(children) = &node.children else { return };
        for child in children {
            if classifier::is_pruned(&child.name, config) {
                continue;
            }
            let mut child_ancestors = ancestors.to_vec();
            child_ancestors.push(node.name.clone());
            if remaining_depth <= 0 {
                out.push_back((child.id.clone(), child_ancestors));
            } else {
                walk(child, remaining_depth - 1, &child_ancestors, out, config);
            }
        }
    }
    walk(node, depth_used - 1, ancestors, out, config);
}
