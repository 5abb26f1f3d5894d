//! Startup validation for a resolved configuration.
//!
//! Everything here is fatal: a configuration that fails to validate never
//! reaches the fetcher, so a bad regex or a missing root id is always a
//! `TIS-E0xx` error at startup, never a mid-run surprise.

use super::model::ResolvedConfig;
use crate::errors::{TisError, TisResult};

pub fn validate(config: &ResolvedConfig) -> TisResult<()> {
    if config.api.root_node_id.trim().is_empty() {
        return Err(TisError::config_invalid("api.rootNodeId must be set"));
    }
    if config.api.base_url.trim().is_empty() {
        return Err(TisError::config_invalid("api.baseUrl must be set"));
    }
    if config.optimization.concurrent_requests == 0 {
        return Err(TisError::config_invalid(
            "optimization.concurrentRequests must be at least 1",
        ));
    }
    if config.optimization.children_level < -1 {
        return Err(TisError::config_invalid(
            "optimization.childrenLevel must be -1 (unlimited) or a non-negative integer",
        ));
    }
    if config.optimization.min_children_level < 0 {
        return Err(TisError::config_invalid(
            "optimization.minChildrenLevel must be non-negative",
        ));
    }

    for raw in &config.branch_pruning.skip_folders {
        if raw.trim().is_empty() {
            return Err(TisError::config_invalid(
                "branchPruning.skipFolders entries must not be empty",
            ));
        }
    }

    if config.path_convention.enabled && config.path_convention.conventions.is_empty() {
        tracing::warn!(
            "pathConvention.enabled is true but no per-component conventions are configured; \
             every artifact will fall through to the generic Model/HiL/SiL fallback"
        );
    }

    for (name, rule) in &config.naming_convention.patterns {
        if rule.patterns.is_empty() {
            return Err(TisError::config_invalid(format!(
                "namingConvention.patterns.{name} has no valid regular expressions"
            )));
        }
    }

    Ok(())
}
