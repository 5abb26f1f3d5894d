//! Configuration sections and their defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::Regex;
use serde::Deserialize;

/// Everything found in a configuration file. Every field is optional so a
/// partial document only overrides what it names; absence and explicit
/// `null` are both "use the built-in default".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub debug: Option<RawDebug>,
    pub api: Option<RawApi>,
    pub optimization: Option<RawOptimization>,
    #[serde(rename = "branchPruning")]
    pub branch_pruning: Option<RawBranchPruning>,
    #[serde(rename = "artifactFilters")]
    pub artifact_filters: Option<RawArtifactFilters>,
    #[serde(rename = "pathConvention")]
    pub path_convention: Option<RawPathConvention>,
    #[serde(rename = "namingConvention")]
    pub naming_convention: Option<RawNamingConvention>,
    pub display: Option<RawDisplay>,
    pub output: Option<RawOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDebug {
    #[serde(rename = "debugMode")]
    pub debug_mode: Option<bool>,
    #[serde(rename = "slowMode")]
    pub slow_mode: Option<bool>,
    #[serde(rename = "apiWaitTime")]
    pub api_wait_time: Option<f64>,
    #[serde(rename = "logLevel")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawApi {
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(rename = "linkTemplate")]
    pub link_template: Option<String>,
    #[serde(rename = "connectTimeout")]
    pub connect_timeout: Option<f64>,
    #[serde(rename = "readTimeout")]
    pub read_timeout: Option<f64>,
    #[serde(rename = "maxRetries")]
    pub max_retries: Option<u32>,
    #[serde(rename = "backoffFactor")]
    pub backoff_factor: Option<f64>,
    #[serde(rename = "retryStatusCodes")]
    pub retry_status_codes: Option<Vec<u16>>,
    #[serde(rename = "rootNodeId")]
    pub root_node_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOptimization {
    #[serde(rename = "concurrentRequests")]
    pub concurrent_requests: Option<usize>,
    #[serde(rename = "childrenLevel")]
    pub children_level: Option<i64>,
    #[serde(rename = "rateLimitDelay")]
    pub rate_limit_delay: Option<f64>,
    #[serde(rename = "cacheMaxSize")]
    pub cache_max_size: Option<usize>,
    #[serde(rename = "adaptiveTimeoutThreshold")]
    pub adaptive_timeout_threshold: Option<f64>,
    #[serde(rename = "minChildrenLevel")]
    pub min_children_level: Option<i64>,
    #[serde(rename = "depthReductionStep")]
    pub depth_reduction_step: Option<i64>,
    #[serde(rename = "retryBackoffSeconds")]
    pub retry_backoff_seconds: Option<Vec<f64>>,
    #[serde(rename = "finalTimeoutSeconds")]
    pub final_timeout_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBranchPruning {
    #[serde(rename = "includeProjects")]
    pub include_projects: Option<Vec<String>>,
    #[serde(rename = "includeSoftwareLines")]
    pub include_software_lines: Option<Vec<String>>,
    #[serde(rename = "skipProjects")]
    pub skip_projects: Option<Vec<String>>,
    #[serde(rename = "skipFolders")]
    pub skip_folders: Option<Vec<String>>,
    #[serde(rename = "skipPatterns")]
    pub skip_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArtifactFilters {
    #[serde(rename = "componentType")]
    pub component_type: Option<Vec<String>>,
    #[serde(rename = "componentName")]
    pub component_name: Option<Vec<String>>,
    #[serde(rename = "componentGrp")]
    pub component_grp: Option<String>,
    #[serde(rename = "lifeCycleStatus")]
    pub life_cycle_status: Option<Vec<String>>,
    #[serde(rename = "skipDeleted")]
    pub skip_deleted: Option<bool>,
}

/// Either an exact enumeration or a case-insensitive substring enumeration
/// for a single path-convention placeholder.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConventionRule {
    Exact(Vec<String>),
    Contains(Vec<String>),
}

impl ConventionRule {
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            ConventionRule::Exact(values) => values.iter().any(|v| v == segment),
            ConventionRule::Contains(substrings) => {
                let lower = segment.to_lowercase();
                substrings.iter().any(|s| lower.contains(&s.to_lowercase()))
            }
        }
    }
}

/// One component's expected upload-path structure plus its placeholder
/// rules, keyed by placeholder name without braces (e.g. `"Variant"`, not
/// `"Variant_contains"` — the `_contains` suffix just selects
/// [`ConventionRule::Contains`] at parse time, see [`RawPathConvention`]).
#[derive(Debug, Clone)]
pub struct PathConvention {
    pub expected_structure: String,
    pub rules: BTreeMap<String, ConventionRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPathConvention {
    pub enabled: Option<bool>,
    /// Raw per-component convention documents. Each entry is itself a
    /// loosely-typed JSON object: `expectedStructure` plus `{X}` /
    /// `{X}_contains` keys for placeholder rules, resolved in
    /// [`super::validate::validate`] rather than here, since a malformed
    /// entry is a configuration error, not a silent default.
    pub conventions: Option<BTreeMap<String, serde_json::Value>>,
}

/// A single component's naming patterns, tried in declaration order.
#[derive(Debug, Clone)]
pub struct NamedConventionRule {
    pub component_name: String,
    pub patterns: Vec<Regex>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNamingConvention {
    pub enabled: Option<bool>,
    pub patterns: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDisplay {
    #[serde(rename = "dateFormat")]
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOutput {
    pub directory: Option<String>,
    #[serde(rename = "labcarPlatforms")]
    pub labcar_platforms: Option<Vec<String>>,
    #[serde(rename = "cspSwbSubstrings")]
    pub csp_swb_substrings: Option<Vec<String>>,
}

// ---------------------------------------------------------------------
// Resolved sections
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DebugSection {
    pub debug_mode: bool,
    pub slow_mode: bool,
    pub api_wait_time: f64,
    pub log_level: String,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            debug_mode: false,
            slow_mode: false,
            api_wait_time: 0.5,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiSection {
    pub base_url: String,
    pub link_template: String,
    pub connect_timeout: f64,
    pub read_timeout: f64,
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub retry_status_codes: Vec<u16>,
    pub root_node_id: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            link_template: String::new(),
            connect_timeout: 5.0,
            read_timeout: 30.0,
            max_retries: 3,
            backoff_factor: 0.5,
            retry_status_codes: vec![429, 500, 502, 503, 504],
            root_node_id: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationSection {
    pub concurrent_requests: usize,
    pub children_level: i64,
    pub rate_limit_delay: f64,
    pub cache_max_size: usize,
    pub adaptive_timeout_threshold: f64,
    pub min_children_level: i64,
    pub depth_reduction_step: i64,
    pub retry_backoff_seconds: Vec<f64>,
    pub final_timeout_seconds: f64,
}

impl Default for OptimizationSection {
    fn default() -> Self {
        Self {
            concurrent_requests: 8,
            children_level: -1,
            rate_limit_delay: 0.1,
            cache_max_size: 2048,
            adaptive_timeout_threshold: 10.0,
            min_children_level: 1,
            depth_reduction_step: 1,
            retry_backoff_seconds: vec![1.0, 2.0, 4.0],
            final_timeout_seconds: 60.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BranchPruningSection {
    pub include_projects: Vec<String>,
    pub include_software_lines: Vec<String>,
    pub skip_projects: Vec<String>,
    pub skip_folders: Vec<String>,
    /// Compiled from `skipPatterns`; matched case-insensitively and
    /// anchored at the start of the segment, never searched mid-string.
    pub skip_patterns: Vec<Regex>,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactFiltersSection {
    pub component_type: Option<Vec<String>>,
    pub component_name: Option<Vec<String>>,
    pub component_grp: Option<String>,
    pub life_cycle_status: Option<Vec<String>>,
    pub skip_deleted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PathConventionSection {
    pub enabled: bool,
    pub conventions: BTreeMap<String, PathConvention>,
}

#[derive(Debug, Clone, Default)]
pub struct NamingConventionSection {
    pub enabled: bool,
    pub patterns: BTreeMap<String, NamedConventionRule>,
}

#[derive(Debug, Clone)]
pub struct DisplaySection {
    pub date_format: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            date_format: "%d-%m-%Y %H:%M:%S".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSection {
    pub directory: PathBuf,
    pub labcar_platforms: Vec<String>,
    pub csp_swb_substrings: Vec<String>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./output"),
            labcar_platforms: vec!["VME".to_string(), "PCIe".to_string()],
            csp_swb_substrings: vec!["CSP".to_string(), "SWB".to_string()],
        }
    }
}

/// The fully-resolved, immutable configuration consumed by every
/// collaborator (fetcher, classifier, extractor, validator, aggregator).
///
/// Regex fields are precompiled once here rather than per-artifact, since
/// the same small set of patterns is evaluated against every node in the
/// tree.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub debug: DebugSection,
    pub api: ApiSection,
    pub optimization: OptimizationSection,
    pub branch_pruning: BranchPruningSection,
    pub artifact_filters: ArtifactFiltersSection,
    pub path_convention: PathConventionSection,
    pub naming_convention: NamingConventionSection,
    pub display: DisplaySection,
    pub output: OutputSection,
}

impl ResolvedConfig {
    /// Merge a [`RawConfig`] over the current (default) values. Missing
    /// sections and missing/`null` fields within a present section leave
    /// the existing value untouched.
    ///
    /// A malformed regex in `skipPatterns` or `namingConvention.patterns`
    /// is a configuration error rather than a silently dropped entry, so
    /// this returns `TisResult` instead of `()`.
    pub fn merge(&mut self, raw: RawConfig) -> crate::errors::TisResult<()> {
        if let Some(d) = raw.debug {
            if let Some(v) = d.debug_mode {
                self.debug.debug_mode = v;
            }
            if let Some(v) = d.slow_mode {
                self.debug.slow_mode = v;
            }
            if let Some(v) = d.api_wait_time {
                self.debug.api_wait_time = v;
            }
            if let Some(v) = d.log_level {
                self.debug.log_level = v;
            }
        }
        if let Some(a) = raw.api {
            if let Some(v) = a.base_url {
                self.api.base_url = v;
            }
            if let Some(v) = a.link_template {
                self.api.link_template = v;
            }
            if let Some(v) = a.connect_timeout {
                self.api.connect_timeout = v;
            }
            if let Some(v) = a.read_timeout {
                self.api.read_timeout = v;
            }
            if let Some(v) = a.max_retries {
                self.api.max_retries = v;
            }
            if let Some(v) = a.backoff_factor {
                self.api.backoff_factor = v;
            }
            if let Some(v) = a.retry_status_codes {
                self.api.retry_status_codes = v;
            }
            if let Some(v) = a.root_node_id {
                self.api.root_node_id = v;
            }
        }
        if let Some(o) = raw.optimization {
            if let Some(v) = o.concurrent_requests {
                self.optimization.concurrent_requests = v;
            }
            if let Some(v) = o.children_level {
                self.optimization.children_level = v;
            }
            if let Some(v) = o.rate_limit_delay {
                self.optimization.rate_limit_delay = v;
            }
            if let Some(v) = o.cache_max_size {
                self.optimization.cache_max_size = v;
            }
            if let Some(v) = o.adaptive_timeout_threshold {
                self.optimization.adaptive_timeout_threshold = v;
            }
            if let Some(v) = o.min_children_level {
                self.optimization.min_children_level = v;
            }
            if let Some(v) = o.depth_reduction_step {
                self.optimization.depth_reduction_step = v;
            }
            if let Some(v) = o.retry_backoff_seconds {
                self.optimization.retry_backoff_seconds = v;
            }
            if let Some(v) = o.final_timeout_seconds {
                self.optimization.final_timeout_seconds = v;
            }
        }
        if let Some(b) = raw.branch_pruning {
            if let Some(v) = b.include_projects {
                self.branch_pruning.include_projects = v;
            }
            if let Some(v) = b.include_software_lines {
                self.branch_pruning.include_software_lines = v;
            }
            if let Some(v) = b.skip_projects {
                self.branch_pruning.skip_projects = v;
            }
            if let Some(v) = b.skip_folders {
                self.branch_pruning.skip_folders = v;
            }
            if let Some(patterns) = b.skip_patterns {
                let mut compiled = Vec::with_capacity(patterns.len());
                for p in &patterns {
                    let anchored = Regex::new(&format!("(?i)^{p}")).map_err(|e| {
                        crate::errors::TisError::config_invalid(format!(
                            "branchPruning.skipPatterns entry '{p}' is not a valid regex: {e}"
                        ))
                    })?;
                    compiled.push(anchored);
                }
                self.branch_pruning.skip_patterns = compiled;
            }
        }
        if let Some(f) = raw.artifact_filters {
            if let Some(v) = f.component_type {
                self.artifact_filters.component_type = Some(v);
            }
            if let Some(v) = f.component_name {
                self.artifact_filters.component_name = Some(v);
            }
            if let Some(v) = f.component_grp {
                self.artifact_filters.component_grp = Some(v);
            }
            if let Some(v) = f.life_cycle_status {
                self.artifact_filters.life_cycle_status = Some(v);
            }
            if let Some(v) = f.skip_deleted {
                self.artifact_filters.skip_deleted = v;
            }
        }
        if let Some(p) = raw.path_convention {
            if let Some(v) = p.enabled {
                self.path_convention.enabled = v;
            }
            if let Some(conventions) = p.conventions {
                let mut resolved = BTreeMap::new();
                for (name, doc) in conventions {
                    let pc = parse_path_convention(&doc).ok_or_else(|| {
                        crate::errors::TisError::config_invalid(format!(
                            "pathConvention.conventions.{name} is malformed \
                             (missing expectedStructure or a non-array placeholder rule)"
                        ))
                    })?;
                    resolved.insert(name, pc);
                }
                self.path_convention.conventions = resolved;
            }
        }
        if let Some(n) = raw.naming_convention {
            if let Some(v) = n.enabled {
                self.naming_convention.enabled = v;
            }
            if let Some(patterns) = n.patterns {
                let mut resolved = BTreeMap::new();
                for (name, exprs) in patterns {
                    let mut compiled = Vec::with_capacity(exprs.len());
                    for expr in &exprs {
                        let re = Regex::new(expr).map_err(|e| {
                            crate::errors::TisError::config_invalid(format!(
                                "namingConvention.patterns.{name} contains an invalid \
                                 regex '{expr}': {e}"
                            ))
                        })?;
                        compiled.push(re);
                    }
                    resolved.insert(
                        name.clone(),
                        NamedConventionRule {
                            component_name: name,
                            patterns: compiled,
                        },
                    );
                }
                self.naming_convention.patterns = resolved;
            }
        }
        if let Some(d) = raw.display {
            if let Some(v) = d.date_format {
                self.display.date_format = v;
            }
        }
        if let Some(o) = raw.output {
            if let Some(v) = o.directory {
                self.output.directory = PathBuf::from(v);
            }
            if let Some(v) = o.labcar_platforms {
                self.output.labcar_platforms = v;
            }
            if let Some(v) = o.csp_swb_substrings {
                self.output.csp_swb_substrings = v;
            }
        }

        Ok(())
    }
}

fn parse_path_convention(doc: &serde_json::Value) -> Option<PathConvention> {
    let obj = doc.as_object()?;
    let expected_structure = obj.get("expectedStructure")?.as_str()?.to_string();
    let mut rules = BTreeMap::new();
    for (key, value) in obj {
        if key == "expectedStructure" {
            continue;
        }
        let values: Vec<String> = value
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if let Some(placeholder) = key.strip_suffix("_contains") {
            rules.insert(placeholder.to_string(), ConventionRule::Contains(values));
        } else {
            rules.insert(key.clone(), ConventionRule::Exact(values));
        }
    }
    Some(PathConvention {
        expected_structure,
        rules,
    })
}
