//! Declarative path and name convention checks.
//!
//! Every check here is pure and idempotent: running the validator twice on
//! the same artifact yields the same tag. Checks run in a fixed order and
//! the first deviation found wins; an artifact that passes every
//! configured check is `VALID`.

use regex::Regex;
use std::sync::LazyLock;
use tis_common::config::model::{ConventionRule, NamedConventionRule, PathConvention};
use tis_common::config::ResolvedConfig;
use tis_common::types::{Artifact, DeviationType, ValidationOutcome};

static P_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[Pp](\d{4})").unwrap());

/// Runs every applicable check against `artifact` and returns the first
/// deviation found, or `VALID` if none apply.
pub fn validate(artifact: &Artifact, software_line_name: &str, config: &ResolvedConfig) -> ValidationOutcome {
    if config.path_convention.enabled {
        let outcome = validate_path(artifact, config);
        if !outcome.tag.is_valid() {
            return outcome;
        }
    }

    if config.naming_convention.enabled {
        let outcome = validate_name(artifact, config);
        if !outcome.tag.is_valid() {
            return outcome;
        }
    }

    if let Some(test_ext) = artifact.test_ext() {
        if test_ext.test_type_mismatch {
            return ValidationOutcome::new(
                DeviationType::TestTypeMismatch,
                format!(
                    "declared testType '{}' does not match path segment '{}'",
                    test_ext.test_type.as_deref().unwrap_or(""),
                    test_ext.test_type_path.as_deref().unwrap_or("")
                ),
                "testType attribute must equal the path segment following 'Test'",
            );
        }

        if let Some(outcome) = validate_test_config_matches_software_line(test_ext, software_line_name) {
            return outcome;
        }
    }

    ValidationOutcome::valid()
}

fn validate_path(artifact: &Artifact, config: &ResolvedConfig) -> ValidationOutcome {
    let segments: Vec<&str> = artifact.common.upload_path.split('/').collect();
    if segments.len() < 2 {
        return ValidationOutcome::new(
            DeviationType::WrongLocation,
            format!("uploadPath '{}' has fewer than 2 segments", artifact.common.upload_path),
            "[Project]/[SWLine]/...",
        );
    }

    let convention = find_convention(&artifact.common.component_name, config);
    match convention {
        Some(convention) => validate_against_convention(&segments, convention),
        None => validate_generic_fallback(&segments, config),
    }
}

fn find_convention<'a>(component_name: &str, config: &'a ResolvedConfig) -> Option<&'a PathConvention> {
    if let Some(exact) = config.path_convention.conventions.get(component_name) {
        return Some(exact);
    }
    config
        .path_convention
        .conventions
        .iter()
        .filter(|(key, _)| component_name.starts_with(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, convention)| convention)
}

const STRUCTURAL_PLACEHOLDERS: &[&str] = &["Project", "SoftwareLine", "artifact"];

fn validate_against_convention(segments: &[&str], convention: &PathConvention) -> ValidationOutcome {
    let tokens: Vec<&str> = convention.expected_structure.split('/').collect();
    let mut cursor = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if *token == "..." {
            // Free-form remainder: only meaningful when something concrete
            // follows; otherwise positional tracking simply stops here.
            continue;
        }

        let placeholder_name = token.strip_prefix('{').and_then(|t| t.strip_suffix('}'));

        match placeholder_name {
            Some(name) if STRUCTURAL_PLACEHOLDERS.contains(&name) => {
                cursor += 1;
            }
            Some(name) => {
                let Some(rule) = convention.rules.get(name) else {
                    cursor += 1;
                    continue;
                };
                let Some(actual) = segments.get(cursor) else {
                    return ValidationOutcome::new(
                        DeviationType::InvalidSubfolder,
                        format!("uploadPath is too short to contain placeholder '{name}'"),
                        format!("expected structure: {}", expected_structure_of(&tokens)),
                    );
                };
                if !rule.matches(actual) {
                    return ValidationOutcome::new(
                        DeviationType::InvalidSubfolder,
                        format!("segment '{actual}' does not satisfy placeholder '{name}'"),
                        format!("expected structure: {}", expected_structure_of(&tokens)),
                    );
                }
                cursor += 1;
            }
            None => {
                // Literal folder name: must appear at the cursor, or be
                // found further along the path (structural placeholders
                // upstream may have already advanced the cursor past it).
                match segments.get(cursor) {
                    Some(actual) if *actual == *token => cursor += 1,
                    _ => match segments.iter().skip(cursor).position(|s| s == token) {
                        Some(offset) => cursor += offset + 1,
                        None => {
                            return ValidationOutcome::new(
                                DeviationType::WrongLocation,
                                format!("required folder '{token}' not found in uploadPath"),
                                format!("expected structure: {}", expected_structure_of(&tokens)),
                            );
                        }
                    },
                }
            }
        }

        let _ = i;
    }

    ValidationOutcome::valid()
}

fn expected_structure_of(tokens: &[&str]) -> String {
    tokens.join("/")
}

fn validate_generic_fallback(segments: &[&str], config: &ResolvedConfig) -> ValidationOutcome {
    let hint = "[Project]/[SWLine]/Model/HiL|SiL/[CSP|SWB]/...";

    let Some(model_idx) = segments.iter().position(|s| *s == "Model") else {
        return ValidationOutcome::new(DeviationType::MissingModel, "no 'Model' segment in uploadPath", hint);
    };

    let Some(hil_sil_offset) = segments[model_idx + 1..].iter().position(|s| *s == "HiL" || *s == "SiL") else {
        return ValidationOutcome::new(
            DeviationType::MissingHil,
            "no 'HiL' or 'SiL' segment after 'Model' in uploadPath",
            hint,
        );
    };
    let hil_sil_idx = model_idx + 1 + hil_sil_offset;

    match segments.get(hil_sil_idx + 1) {
        Some(seg) if config.output.csp_swb_substrings.iter().any(|s| seg.contains(s.as_str())) => {
            ValidationOutcome::valid()
        }
        _ => ValidationOutcome::new(
            DeviationType::MissingCspSwb,
            "no CSP/SWB-bearing segment after the HiL/SiL segment",
            hint,
        ),
    }
}

fn validate_name(artifact: &Artifact, config: &ResolvedConfig) -> ValidationOutcome {
    let rule = find_naming_rule(&artifact.common.component_name, config);
    let Some(rule) = rule else {
        return ValidationOutcome::valid();
    };

    if rule.patterns.iter().any(|re| re.is_match(&artifact.common.name)) {
        ValidationOutcome::valid()
    } else {
        ValidationOutcome::new(
            DeviationType::InvalidNameFormat,
            format!("name '{}' matches none of the configured patterns", artifact.common.name),
            format!("component '{}' requires one of its configured name patterns", rule.component_name),
        )
    }
}

fn find_naming_rule<'a>(component_name: &str, config: &'a ResolvedConfig) -> Option<&'a NamedConventionRule> {
    if let Some(exact) = config.naming_convention.patterns.get(component_name) {
        return Some(exact);
    }
    config
        .naming_convention
        .patterns
        .iter()
        .filter(|(key, _)| component_name.starts_with(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, rule)| rule)
}

fn validate_test_config_matches_software_line(
    test_ext: &tis_common::types::TestExt,
    software_line_name: &str,
) -> Option<ValidationOutcome> {
    let config_path = test_ext
        .test_configuration
        .as_deref()
        .or(test_ext.testbench_configuration.as_deref())?;

    let config_p_number = P_NUMBER.captures(config_path).map(|c| c[1].to_string())?;
    let sw_line_p_number = clean_software_line_p_number(software_line_name)?;

    if config_p_number == sw_line_p_number {
        None
    } else {
        Some(ValidationOutcome::new(
            DeviationType::TestConfigSwLineMismatch,
            format!(
                "test configuration P-number '{config_p_number}' does not match software line '{sw_line_p_number}'"
            ),
            "testConfiguration/testbenchConfiguration must reference the same P-number as the software line name",
        ))
    }
}

/// Cleans a software-line name down to its trailing 4-digit P-number:
/// strip parenthesized suffixes, take the prefix before `_`, drop
/// non-alphanumeric characters, then take the trailing 4 digits.
fn clean_software_line_p_number(name: &str) -> Option<String> {
    let without_parens = match name.find('(') {
        Some(idx) => &name[..idx],
        None => name,
    };
    let before_underscore = without_parens.split('_').next().unwrap_or(without_parens);
    let alnum: String = before_underscore.chars().filter(|c| c.is_alphanumeric()).collect();
    let digits: String = alnum.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    Some(digits[digits.len() - 4..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tis_common::types::{ArtifactCommon, ArtifactExtension, NodeId, TestExt};

    fn artifact_with_path(upload_path: &str, component_name: &str) -> Artifact {
        Artifact {
            common: ArtifactCommon {
                id: NodeId::new("1"),
                name: "x.zip".to_string(),
                component_name: component_name.to_string(),
                component_category: String::new(),
                component_group: String::new(),
                user: None,
                lifecycle_status: None,
                release_timestamp: None,
                created_timestamp: None,
                is_deleted: false,
                deleted_timestamp: None,
                upload_path: upload_path.to_string(),
            },
            extension: ArtifactExtension::None,
        }
    }

    #[test]
    fn placeholder_validation_accepts_and_rejects() {
        let mut rules = BTreeMap::new();
        rules.insert(
            "CSP_SWB".to_string(),
            ConventionRule::Contains(vec!["CSP".to_string(), "SWB".to_string()]),
        );
        rules.insert(
            "LabcarType".to_string(),
            ConventionRule::Exact(vec!["VME".to_string(), "PCIe".to_string()]),
        );
        let convention = PathConvention {
            expected_structure: "{Project}/{SoftwareLine}/Model/SiL/vVeh/{CSP_SWB}/{LabcarType}/.../{artifact}"
                .to_string(),
            rules,
        };

        let mut config = ResolvedConfig::default();
        config.path_convention.enabled = true;
        config.path_convention.conventions.insert("vVeh_LCO".to_string(), convention);

        let good = artifact_with_path("P1/SW1/Model/SiL/vVeh/CSP Foo/VME/x.zip", "vVeh_LCO");
        assert!(validate(&good, "SW1", &config).tag.is_valid());

        let bad = artifact_with_path("P1/SW1/Model/SiL/vVeh/Other/VME/x.zip", "vVeh_LCO");
        let outcome = validate(&bad, "SW1", &config);
        assert_eq!(outcome.tag, DeviationType::InvalidSubfolder);
        assert!(outcome.detail.contains("CSP_SWB"));
    }

    #[test]
    fn generic_fallback_requires_model_before_hil_before_csp_swb() {
        let mut config = ResolvedConfig::default();
        config.path_convention.enabled = true;

        let artifact = artifact_with_path("P1/SW1/Model/HiL/CSP_variant", "unknown_component");
        assert!(validate(&artifact, "SW1", &config).tag.is_valid());

        let missing_model = artifact_with_path("P1/SW1/HiL/CSP_variant", "unknown_component");
        assert_eq!(validate(&missing_model, "SW1", &config).tag, DeviationType::MissingModel);
    }

    #[test]
    fn test_config_p_number_cross_check() {
        let mut common = ArtifactCommon {
            id: NodeId::new("1"),
            name: "x".to_string(),
            component_name: "test_ECU-TEST".to_string(),
            component_category: String::new(),
            component_group: String::new(),
            user: None,
            lifecycle_status: None,
            release_timestamp: None,
            created_timestamp: None,
            is_deleted: false,
            deleted_timestamp: None,
            upload_path: "P1/SW1/Test/Regression/x".to_string(),
        };
        common.upload_path = "P1/SW1/Test/Regression/x".to_string();
        let test_ext = TestExt {
            test_type: Some("Regression".to_string()),
            test_type_path: Some("Regression".to_string()),
            test_type_mismatch: false,
            test_version: None,
            ecu_test_version: None,
            test_configuration: Some("bench_P2405_cfg".to_string()),
            testbench_configuration: None,
        };
        let artifact = Artifact {
            common,
            extension: ArtifactExtension::Test(test_ext),
        };

        let config = ResolvedConfig::default();
        assert!(validate(&artifact, "P2405_Legacy(old)", &config).tag.is_valid());
        assert_eq!(
            validate(&artifact, "P9999_Legacy", &config).tag,
            DeviationType::TestConfigSwLineMismatch
        );
    }
}
