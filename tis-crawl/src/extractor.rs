//! Converts a matched tree node plus its ancestor path into a typed
//! [`Artifact`] record.
//!
//! Every derived field is tolerant: a malformed or absent source value
//! yields `None` for that one field rather than failing the whole
//! extraction.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tis_common::config::ResolvedConfig;
use tis_common::types::{Artifact, ArtifactCommon, ArtifactExtension, LcoExt, NodeId, TestExt, TreeNode};

/// Component-name markers for the two extension categories. These are not
/// part of the closed configuration option set; the catalog hardcodes them
/// as literal component names.
const LCO_COMPONENT_NAME: &str = "vVeh_LCO";
const TEST_COMPONENT_NAME: &str = "test_ECU-TEST";

/// Path suffix (normalized to forward slashes, compared case-insensitively)
/// that an SVN external's `path` must end with to be considered a VeMoX
/// source. Not part of the closed config set; fixed rather than configurable.
const VEMOX_EXTERNAL_SEARCH_SUFFIX: &str = "externals/vemox";

static VEMOX_SVN_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vemox(\d+)\.(\d+)\.(\d+)\.(\d+)\.(\d+)").unwrap());
static VEMOX_CONAN_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)VeMoX/(\d+)\.(\d+)\.(\d+)\.(\d+)\.(\d+)@VeMoX_classic/release").unwrap());

pub fn extract(node: &TreeNode, ancestor_path: &[String], config: &ResolvedConfig) -> Artifact {
    let mut upload_path_segments = ancestor_path.to_vec();
    upload_path_segments.push(node.name.clone());
    let upload_path = upload_path_segments.join("/");

    let created_timestamp = node
        .created
        .as_ref()
        .and_then(value_to_raw_string)
        .and_then(|raw| tis_common::ticks::format_instant(&raw, &config.display.date_format));

    let deleted_raw = node.attribute_str("tisFileDeletedDate");
    let is_deleted = deleted_raw
        .as_deref()
        .is_some_and(|raw| tis_common::ticks::is_past_or_now(raw, chrono::Utc::now()));
    let deleted_timestamp = deleted_raw
        .as_deref()
        .and_then(|raw| tis_common::ticks::format_instant(raw, &config.display.date_format));

    let component_name = node
        .name_tag()
        .map(str::to_string)
        .unwrap_or_else(|| node.name.clone());

    let common = ArtifactCommon {
        id: node.id.clone(),
        name: node.name.clone(),
        component_category: node.type_tag().unwrap_or_default().to_string(),
        component_group: node.group_tag().unwrap_or_default().to_string(),
        user: node.attribute_str("user").map(|s| s.to_lowercase()),
        lifecycle_status: node.attribute_str("lifeCycleStatus"),
        release_timestamp: node
            .attribute_str("releaseDateTime")
            .and_then(|raw| tis_common::ticks::format_instant(&raw, &config.display.date_format)),
        created_timestamp,
        is_deleted,
        deleted_timestamp,
        upload_path: upload_path.clone(),
        component_name,
    };

    let extension = if common.component_name == LCO_COMPONENT_NAME {
        ArtifactExtension::Lco(extract_lco(node, &upload_path_segments, config))
    } else if common.component_name == TEST_COMPONENT_NAME {
        ArtifactExtension::Test(extract_test(node, &upload_path_segments))
    } else {
        ArtifactExtension::None
    };

    Artifact { common, extension }
}

fn extract_lco(node: &TreeNode, path_segments: &[String], config: &ResolvedConfig) -> LcoExt {
    let software_type = path_segments
        .iter()
        .find(|seg| config.output.csp_swb_substrings.iter().any(|s| seg.contains(s.as_str())))
        .cloned();

    let labcar_type = path_segments
        .iter()
        .find(|seg| config.output.labcar_platforms.iter().any(|p| *seg == p))
        .cloned()
        .or_else(|| node.attribute_str("lcType"));

    let simulation_type = path_segments
        .iter()
        .find(|seg| seg.as_str() == "HiL" || seg.as_str() == "SiL")
        .cloned();

    let lco_version = node
        .attribute("execution")
        .and_then(parse_dependency_list)
        .and_then(|deps| first_version_for_dependency(&deps, "LCO"));

    let vemox_version = node.attribute("sources").and_then(find_vemox_version);

    let is_genuine_build = node.attribute("isGenuineBuild").and_then(value_to_bool);

    LcoExt {
        simulation_type,
        software_type,
        labcar_type,
        lco_version,
        vemox_version,
        is_genuine_build,
    }
}

fn extract_test(node: &TreeNode, path_segments: &[String]) -> TestExt {
    let test_type = node.attribute_str("testType");
    let test_type_path = path_segments
        .iter()
        .position(|seg| seg == "Test")
        .and_then(|idx| path_segments.get(idx + 1))
        .cloned();
    let test_type_mismatch = match (&test_type, &test_type_path) {
        (Some(declared), Some(path_segment)) => declared != path_segment,
        _ => false,
    };

    let ecu_test_version = node
        .attribute("execution")
        .and_then(parse_dependency_list)
        .and_then(|deps| first_version_for_dependency(&deps, "ECU-TEST"));

    TestExt {
        test_type,
        test_type_path,
        test_type_mismatch,
        test_version: node.attribute_str("testVersion"),
        ecu_test_version,
        test_configuration: node.attribute_str("testConfiguration"),
        testbench_configuration: node.attribute_str("testbenchConfiguration"),
    }
}

/// Parses the `execution` attribute, which may arrive as a JSON-encoded
/// string or an already-decoded array, into a list of
/// `{dependency, version: [first, ...]}` entries. `None` on any malformed
/// shape rather than erroring.
fn parse_dependency_list(value: &Value) -> Option<Vec<Value>> {
    let parsed = match value {
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        other => other.clone(),
    };
    parsed.as_array().cloned()
}

fn first_version_for_dependency(entries: &[Value], dependency: &str) -> Option<String> {
    entries.iter().find_map(|entry| {
        let obj = entry.as_object()?;
        let dep = obj.get("dependency")?.as_str()?;
        if dep != dependency {
            return None;
        }
        obj.get("version")?.as_array()?.first()?.as_str().map(str::to_string)
    })
}

fn find_vemox_version(value: &Value) -> Option<String> {
    let parsed = match value {
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        other => other.clone(),
    };
    let items: Vec<Value> = match parsed {
        Value::Array(items) => items,
        Value::Object(_) => vec![parsed],
        _ => return None,
    };

    let mut versions: Vec<String> = Vec::new();

    for item in &items {
        let obj = item.as_object()?;
        let source_type = obj.get("type").and_then(Value::as_str).unwrap_or_default().to_uppercase();
        if source_type == "SVN" {
            if let Some(externals) = obj.get("externals").and_then(Value::as_array) {
                for external in externals {
                    let Some(ext_obj) = external.as_object() else { continue };
                    let path = ext_obj
                        .get("path")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_lowercase()
                        .replace('\\', "/");
                    if !path.ends_with(VEMOX_EXTERNAL_SEARCH_SUFFIX) {
                        continue;
                    }
                    let url = ext_obj.get("url").and_then(Value::as_str).unwrap_or_default();
                    if let Some(v) = format_svn_vemox(url) {
                        versions.push(v);
                    }
                }
            }
        } else if source_type == "CONAN" {
            let package = obj.get("package").and_then(Value::as_str).unwrap_or_default();
            if let Some(v) = format_conan_vemox(package) {
                versions.push(v);
            }
        }
    }

    versions.sort();
    versions.dedup();
    versions.into_iter().next()
}

fn format_svn_vemox(url: &str) -> Option<String> {
    for part in url.split('/') {
        if let Some(caps) = VEMOX_SVN_VERSION.captures(part) {
            return Some(format!(
                "VeMox{}{}{}R{}{}",
                &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
            ));
        }
    }
    None
}

fn format_conan_vemox(package: &str) -> Option<String> {
    let caps = VEMOX_CONAN_VERSION.captures(package)?;
    Some(format!(
        "VeMox{}{}{}R{}{}",
        &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
    ))
}

fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse::<bool>().ok(),
        _ => None,
    }
}

fn value_to_raw_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
