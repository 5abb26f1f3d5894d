//! Pure predicates over a tree node: whether it is an artifact candidate,
//! and whether a child name should be pruned before descending into it.
//!
//! Nothing here touches the network or the filesystem; every function takes
//! a `&TreeNode` (or a `&str` name) and a `&ResolvedConfig` and returns a
//! plain value, which keeps this module trivially unit-testable.

use chrono::Utc;
use tis_common::config::ResolvedConfig;
use tis_common::types::TreeNode;

/// Whether `node` matches every configured classification predicate.
pub fn is_artifact_candidate(node: &TreeNode, config: &ResolvedConfig) -> bool {
    let filters = &config.artifact_filters;

    if let Some(allowed) = &filters.component_type {
        match node.type_tag() {
            Some(tag) if allowed.iter().any(|a| a == tag) => {}
            _ => return false,
        }
    }

    if let Some(allowed) = &filters.component_name {
        match node.name_tag() {
            Some(tag) if allowed.iter().any(|a| a == tag) => {}
            _ => return false,
        }
    }

    if let Some(required) = &filters.component_grp {
        match node.group_tag() {
            Some(tag) if tag == required => {}
            _ => return false,
        }
    }

    if node.attributes.is_empty() || node.attribute("artifact").is_none() {
        return false;
    }

    if let Some(allowed) = &filters.life_cycle_status {
        if !allowed.is_empty() {
            match node.attribute_str("lifeCycleStatus") {
                Some(status) if allowed.iter().any(|a| a == &status) => {}
                _ => return false,
            }
        }
    }

    if filters.skip_deleted && is_deleted(node) {
        return false;
    }

    true
}

/// Whether `node` is deleted: a `tisFileDeletedDate` attribute that
/// parses to an instant at or before now. A future or unparseable date is
/// not a deletion.
pub fn is_deleted(node: &TreeNode) -> bool {
    match node.attribute_str("tisFileDeletedDate") {
        Some(raw) => tis_common::ticks::is_past_or_now(&raw, Utc::now()),
        None => false,
    }
}

/// Whether `child_name` matches a configured branch-pruning rule: either an
/// exact (anchored-equal) skip-folder literal, or one of the precompiled,
/// case-insensitive, start-anchored skip-pattern regexes.
pub fn is_pruned(child_name: &str, config: &ResolvedConfig) -> bool {
    let pruning = &config.branch_pruning;

    if pruning
        .skip_folders
        .iter()
        .any(|literal| literal.eq_ignore_ascii_case(child_name))
    {
        return true;
    }

    pruning.skip_patterns.iter().any(|re| re.is_match(child_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_with_attributes(attrs: serde_json::Value) -> TreeNode {
        let mut doc = json!({"rId": "1", "name": "n"});
        doc.as_object_mut()
            .unwrap()
            .insert("attributes".to_string(), attrs);
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn requires_artifact_attribute() {
        let config = ResolvedConfig::default();
        let node = node_with_attributes(json!([{"name": "other", "value": "1"}]));
        assert!(!is_artifact_candidate(&node, &config));

        let node = node_with_attributes(json!([{"name": "artifact", "value": "1"}]));
        assert!(is_artifact_candidate(&node, &config));
    }

    #[test]
    fn rejects_deleted_when_skip_deleted_enabled() {
        let mut config = ResolvedConfig::default();
        config.artifact_filters.skip_deleted = true;
        let past_ticks = "638349664128090000";
        let node = node_with_attributes(json!([
            {"name": "artifact", "value": "1"},
            {"name": "tisFileDeletedDate", "value": past_ticks}
        ]));
        assert!(!is_artifact_candidate(&node, &config));
    }

    #[test]
    fn future_deletion_is_not_deleted() {
        let future = Utc::now() + chrono::Duration::days(365);
        let unix_seconds = future.timestamp() as i128;
        let ticks = (unix_seconds + 62_135_596_800) * 10_000_000;
        let mut config = ResolvedConfig::default();
        config.artifact_filters.skip_deleted = true;
        let node = node_with_attributes(json!([
            {"name": "artifact", "value": "1"},
            {"name": "tisFileDeletedDate", "value": ticks.to_string()}
        ]));
        assert!(is_artifact_candidate(&node, &config));
    }

    #[test]
    fn branch_pruning_is_case_insensitive_and_anchored() {
        let mut config = ResolvedConfig::default();
        config.branch_pruning.skip_patterns =
            vec![regex::Regex::new("(?i)^backup").unwrap()];
        assert!(is_pruned("Backup_2023", &config));
        assert!(!is_pruned("old_backup", &config));
    }
}
