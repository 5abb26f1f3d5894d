//! Core data types shared across the crawler, classifier, validator, and
//! aggregator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a node in the remote catalog tree.
///
/// Comparable as an integer when picking the "latest" artifact in a
/// software line (see [`NodeId::as_integer`]); the catalog otherwise
/// treats ids as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the id as an integer for "latest" comparisons.
    ///
    /// Returns `None` for non-numeric ids rather than erroring; callers
    /// that need a total order (the aggregator's `argmax`) treat `None`
    /// as smaller than any parsed value.
    pub fn as_integer(&self) -> Option<i128> {
        self.0.parse::<i128>().ok()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single `{name, value}` attribute pair as returned by the catalog.
///
/// `value` is left as a raw JSON value: strings, booleans, and
/// JSON-encoded strings (e.g. `execution`, `sources`) all arrive this way
/// and the attribute extractor owns all further parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAttribute {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// A labeled reference used for `componentType` / `component` /
/// `componentGrp`, each of which the catalog represents as `{ "name": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

/// A node from the remote catalog tree, as returned by a single fetch.
///
/// `children` is `None` when the fetch depth was insufficient to reach
/// this node's descendants — callers must not conflate "no children
/// fetched" with "no children exist".
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    #[serde(rename = "rId")]
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "componentType", default)]
    pub component_type: Option<NamedRef>,
    #[serde(default)]
    pub component: Option<NamedRef>,
    #[serde(rename = "componentGrp", default)]
    pub component_grp: Option<NamedRef>,
    #[serde(default)]
    pub created: Option<serde_json::Value>,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
    #[serde(default)]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn type_tag(&self) -> Option<&str> {
        self.component_type.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn name_tag(&self) -> Option<&str> {
        self.component.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn group_tag(&self) -> Option<&str> {
        self.component_grp.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_ref())
    }

    pub fn attribute_str(&self, name: &str) -> Option<String> {
        match self.attribute(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Fields common to every emitted artifact record, regardless of category.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactCommon {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "componentName")]
    pub component_name: String,
    #[serde(rename = "componentCategory")]
    pub component_category: String,
    #[serde(rename = "componentGroup")]
    pub component_group: String,
    pub user: Option<String>,
    #[serde(rename = "lifecycleStatus")]
    pub lifecycle_status: Option<String>,
    #[serde(rename = "releaseTimestamp")]
    pub release_timestamp: Option<String>,
    #[serde(rename = "createdTimestamp")]
    pub created_timestamp: Option<String>,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
    #[serde(rename = "deletedTimestamp")]
    pub deleted_timestamp: Option<String>,
    #[serde(rename = "uploadPath")]
    pub upload_path: String,
}

/// Extension fields populated only for LCO-model artifacts
/// (`componentName == "vVeh_LCO"` by default configuration).
#[derive(Debug, Clone, Default, Serialize)]
pub struct LcoExt {
    #[serde(rename = "simulationType")]
    pub simulation_type: Option<String>,
    #[serde(rename = "softwareType")]
    pub software_type: Option<String>,
    #[serde(rename = "labcarType")]
    pub labcar_type: Option<String>,
    #[serde(rename = "lcoVersion")]
    pub lco_version: Option<String>,
    #[serde(rename = "vemoxVersion")]
    pub vemox_version: Option<String>,
    #[serde(rename = "isGenuineBuild")]
    pub is_genuine_build: Option<bool>,
}

/// Extension fields populated only for test artifacts
/// (`componentName == "test_ECU-TEST"` by default configuration).
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestExt {
    #[serde(rename = "testType")]
    pub test_type: Option<String>,
    #[serde(rename = "testTypePath")]
    pub test_type_path: Option<String>,
    #[serde(rename = "testTypeMismatch")]
    pub test_type_mismatch: bool,
    #[serde(rename = "testVersion")]
    pub test_version: Option<String>,
    #[serde(rename = "ecuTestVersion")]
    pub ecu_test_version: Option<String>,
    #[serde(rename = "testConfiguration")]
    pub test_configuration: Option<String>,
    #[serde(rename = "testbenchConfiguration")]
    pub testbench_configuration: Option<String>,
}

/// Discriminated union over the disjoint category extensions. Flattened
/// into the emitted JSON so category-less
/// artifacts simply omit the extra fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ArtifactExtension {
    None,
    Lco(LcoExt),
    Test(TestExt),
}

/// A fully extracted, typed artifact record.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    #[serde(flatten)]
    pub common: ArtifactCommon,
    #[serde(flatten)]
    pub extension: ArtifactExtension,
}

impl Artifact {
    pub fn lco_ext(&self) -> Option<&LcoExt> {
        match &self.extension {
            ArtifactExtension::Lco(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn test_ext(&self) -> Option<&TestExt> {
        match &self.extension {
            ArtifactExtension::Test(ext) => Some(ext),
            _ => None,
        }
    }
}

/// One software line's artifacts plus its precomputed "latest" pointer.
#[derive(Debug, Clone, Serialize)]
pub struct SoftwareLineOutput {
    #[serde(rename = "softwareLineId")]
    pub software_line_id: NodeId,
    pub artifacts: Vec<Artifact>,
    #[serde(rename = "latestArtifact", skip_serializing_if = "Option::is_none")]
    pub latest_artifact: Option<Artifact>,
}

/// One project's software lines.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOutput {
    #[serde(rename = "projectId")]
    pub project_id: NodeId,
    #[serde(rename = "softwareLines")]
    pub software_lines: BTreeMap<String, SoftwareLineOutput>,
}

/// Project name → aggregated output, the top-level emitted shape.
pub type AggregatedOutput = BTreeMap<String, ProjectOutput>;

/// Closed enum of path/name validation deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviationType {
    Valid,
    MissingModel,
    MissingHil,
    MissingSil,
    MissingCspSwb,
    CspSwbUnderModel,
    WrongLocation,
    InvalidSubfolder,
    InvalidNameFormat,
    NameMismatch,
    TestTypeMismatch,
    TestConfigSwLineMismatch,
}

impl DeviationType {
    pub fn is_valid(self) -> bool {
        matches!(self, DeviationType::Valid)
    }
}

/// Result of validating a single artifact's path and/or name.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub tag: DeviationType,
    pub detail: String,
    pub hint: String,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            tag: DeviationType::Valid,
            detail: String::new(),
            hint: String::new(),
        }
    }

    pub fn new(tag: DeviationType, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            tag,
            detail: detail.into(),
            hint: hint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_parses_integer() {
        assert_eq!(NodeId::new("101").as_integer(), Some(101));
        assert_eq!(NodeId::new("abc").as_integer(), None);
    }

    #[test]
    fn tree_node_reads_tags_and_attributes() {
        let json = serde_json::json!({
            "rId": "42",
            "name": "vVeh_LCO",
            "componentType": {"name": "vVeh"},
            "component": {"name": "vVeh_LCO"},
            "componentGrp": {"name": "TIS Artifact Container"},
            "attributes": [
                {"name": "artifact", "value": "1"},
                {"name": "user", "value": "Jdoe"}
            ]
        });
        let node: TreeNode = serde_json::from_value(json).unwrap();
        assert_eq!(node.type_tag(), Some("vVeh"));
        assert_eq!(node.name_tag(), Some("vVeh_LCO"));
        assert_eq!(node.group_tag(), Some("TIS Artifact Container"));
        assert_eq!(node.attribute_str("user"), Some("Jdoe".to_string()));
        assert!(node.attribute("artifact").is_some());
        assert!(node.children.is_none());
    }
}
