//! Error catalog for the TIS artifact crawler.
//!
//! Each error carries a unique code and a human-readable message, grouped
//! by subsystem so a code alone tells you where to look.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                            |
//! |------------|-------------|-----------------------------------------|
//! | E001-E099  | Config      | Configuration loading and validation     |
//! | E100-E199  | Network     | Catalog fetch and transport failures     |
//! | E200-E299  | Classify    | Classification and attribute extraction  |
//! | E300-E399  | Validate    | Path and naming convention checks        |
//! | E400-E499  | Emit        | Aggregation and output emission          |
//! | E500-E599  | Internal    | Unexpected internal errors               |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering all TIS crawler error scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Config (001-099)
    /// Configuration file not found
    ConfigNotFound,
    /// Configuration file could not be read
    ConfigReadError,
    /// Configuration file contains invalid JSON
    ConfigParseError,
    /// Configuration contains invalid values
    ConfigValidationError,
    /// Environment variable override has an invalid value
    ConfigEnvError,
    /// A configured regex pattern failed to compile
    ConfigPatternInvalid,

    // Network (100-199)
    /// Root node of the catalog tree could not be reached
    NetworkRootUnreachable,
    /// Request to the catalog service timed out
    NetworkTimeout,
    /// Catalog service returned a non-success status after retries
    NetworkStatusError,
    /// Generic transport-level failure (DNS, connection reset, TLS, ...)
    NetworkTransportError,
    /// Catalog service response body was not valid JSON
    NetworkMalformedResponse,

    // Classify/Extract (200-299)
    /// A node matched more than one mutually exclusive category
    ClassifyAmbiguousCategory,
    /// An attribute value contained JSON that failed to parse
    ExtractAttributeParseFailed,
    /// The VeMoX version string did not match the expected pattern
    ExtractVemoxParseFailed,
    /// A required timestamp attribute was missing or unparseable
    ExtractTimestampInvalid,

    // Validate (300-399)
    /// Upload path did not match any configured convention
    ValidatePathNoMatch,
    /// Upload path placeholder could not be resolved to a concrete segment
    ValidatePlaceholderUnresolved,
    /// Artifact name did not match any configured naming pattern
    ValidateNameNoMatch,
    /// Declared test type did not match the path-derived test type
    ValidateTestTypeMismatch,

    // Emit (400-499)
    /// Output directory could not be created
    EmitDirCreateFailed,
    /// Output file could not be written
    EmitWriteFailed,
    /// An aggregated record failed to serialize
    EmitSerializeFailed,

    // Internal (500-599)
    /// Unexpected internal state (bug)
    InternalStateError,
    /// A background task panicked or was cancelled unexpectedly
    InternalTaskFailed,
}

impl ErrorCode {
    /// Returns the numeric error code (without prefix).
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::ConfigNotFound => 1,
            Self::ConfigReadError => 2,
            Self::ConfigParseError => 3,
            Self::ConfigValidationError => 4,
            Self::ConfigEnvError => 5,
            Self::ConfigPatternInvalid => 6,

            Self::NetworkRootUnreachable => 100,
            Self::NetworkTimeout => 101,
            Self::NetworkStatusError => 102,
            Self::NetworkTransportError => 103,
            Self::NetworkMalformedResponse => 104,

            Self::ClassifyAmbiguousCategory => 200,
            Self::ExtractAttributeParseFailed => 201,
            Self::ExtractVemoxParseFailed => 202,
            Self::ExtractTimestampInvalid => 203,

            Self::ValidatePathNoMatch => 300,
            Self::ValidatePlaceholderUnresolved => 301,
            Self::ValidateNameNoMatch => 302,
            Self::ValidateTestTypeMismatch => 303,

            Self::EmitDirCreateFailed => 400,
            Self::EmitWriteFailed => 401,
            Self::EmitSerializeFailed => 402,

            Self::InternalStateError => 500,
            Self::InternalTaskFailed => 501,
        }
    }

    /// Returns the formatted error code string (e.g., "TIS-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("TIS-E{:03}", self.code_number())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Network,
            200..=299 => ErrorCategory::Classify,
            300..=399 => ErrorCategory::Validate,
            400..=499 => ErrorCategory::Emit,
            _ => ErrorCategory::Internal,
        }
    }

    /// Returns the error message template.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Configuration file not found",
            Self::ConfigReadError => "Failed to read configuration file",
            Self::ConfigParseError => "Configuration file contains invalid JSON",
            Self::ConfigValidationError => "Configuration contains invalid values",
            Self::ConfigEnvError => "Environment variable override has an invalid value",
            Self::ConfigPatternInvalid => "A configured regex pattern failed to compile",

            Self::NetworkRootUnreachable => "Root node of the catalog tree could not be reached",
            Self::NetworkTimeout => "Request to the catalog service timed out",
            Self::NetworkStatusError => {
                "Catalog service returned a non-success status after retries"
            }
            Self::NetworkTransportError => "Transport-level failure reaching the catalog service",
            Self::NetworkMalformedResponse => "Catalog service response body was not valid JSON",

            Self::ClassifyAmbiguousCategory => {
                "Node matched more than one mutually exclusive category"
            }
            Self::ExtractAttributeParseFailed => {
                "Attribute value contained JSON that failed to parse"
            }
            Self::ExtractVemoxParseFailed => {
                "VeMoX version string did not match the expected pattern"
            }
            Self::ExtractTimestampInvalid => "Required timestamp attribute was unparseable",

            Self::ValidatePathNoMatch => "Upload path did not match any configured convention",
            Self::ValidatePlaceholderUnresolved => {
                "Upload path placeholder could not be resolved to a concrete segment"
            }
            Self::ValidateNameNoMatch => "Artifact name did not match any configured pattern",
            Self::ValidateTestTypeMismatch => {
                "Declared test type did not match the path-derived test type"
            }

            Self::EmitDirCreateFailed => "Output directory could not be created",
            Self::EmitWriteFailed => "Output file could not be written",
            Self::EmitSerializeFailed => "Aggregated record failed to serialize",

            Self::InternalStateError => "Unexpected internal state",
            Self::InternalTaskFailed => "A background task panicked or was cancelled",
        }
    }

    /// Returns remediation steps for this error.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigNotFound => &[
                "Pass --config <path> pointing at a valid configuration file",
                "Check that the default config path exists",
            ],
            Self::ConfigReadError => &[
                "Check file permissions on the configuration file",
                "Verify the file is not locked by another process",
            ],
            Self::ConfigParseError => &[
                "Validate the file against a JSON linter",
                "Check for trailing commas or unescaped characters",
            ],
            Self::ConfigValidationError => &[
                "Review the reported field and compare against the schema",
                "Check that numeric fields are within their allowed ranges",
            ],
            Self::ConfigEnvError => &[
                "Check the value of the offending TIS_* environment variable",
                "Unset the variable to fall back to the config file value",
            ],
            Self::ConfigPatternInvalid => &[
                "Check the regex syntax of the offending pattern field",
                "Test the pattern in isolation before adding it to configuration",
            ],
            Self::NetworkRootUnreachable => &[
                "Verify the configured base URL is reachable",
                "Check VPN/network connectivity to the catalog service",
            ],
            Self::NetworkTimeout => &[
                "Increase the request timeout in configuration",
                "Check for catalog-service-side load issues",
            ],
            Self::NetworkStatusError => &[
                "Check the catalog service's health/status page",
                "Review the retry and backoff configuration",
            ],
            Self::NetworkTransportError => &[
                "Check DNS resolution for the configured base URL",
                "Verify TLS certificates are valid if using HTTPS",
            ],
            Self::NetworkMalformedResponse => &[
                "Capture the raw response body for the offending node id",
                "Check whether the catalog service API version changed",
            ],
            Self::ClassifyAmbiguousCategory => &[
                "Review the componentName patterns in configuration for overlap",
                "Tighten the pattern distinguishing the two categories",
            ],
            Self::ExtractAttributeParseFailed => &[
                "This is tolerated and logged; the field is left unset",
                "Inspect the raw attribute value if extraction looks wrong downstream",
            ],
            Self::ExtractVemoxParseFailed => &[
                "Confirm the source string matches VeMox<major><minor><patch>R<build><rev>",
                "Check the SVN externals / CONAN reference format upstream",
            ],
            Self::ExtractTimestampInvalid => &[
                "This is tolerated and logged; the field is left unset",
                "Check whether the catalog emitted ticks or ISO-8601 unexpectedly",
            ],
            Self::ValidatePathNoMatch => &[
                "Add a pathConvention entry for this componentName",
                "Check for a typo in the existing convention pattern",
            ],
            Self::ValidatePlaceholderUnresolved => &[
                "Check the anchor segment used to locate the placeholder",
                "Verify the path actually contains the expected number of segments",
            ],
            Self::ValidateNameNoMatch => &[
                "Add a namingConvention entry for this componentName",
                "Check the artifact name against the configured regex",
            ],
            Self::ValidateTestTypeMismatch => &[
                "Compare the path-derived test type against the testType attribute",
                "Check for stale attributes left over from a renamed test",
            ],
            Self::EmitDirCreateFailed => &[
                "Check filesystem permissions on the output directory's parent",
                "Verify available disk space",
            ],
            Self::EmitWriteFailed => &[
                "Check filesystem permissions and available disk space",
                "Verify no other process is holding the output file open",
            ],
            Self::EmitSerializeFailed => &[
                "Report this as a bug; the in-memory model should always serialize",
                "Check for non-UTF-8 data that slipped through attribute extraction",
            ],
            Self::InternalStateError => &[
                "Report this as a bug along with the run log",
                "Retry the run; this should not happen in steady state",
            ],
            Self::InternalTaskFailed => &[
                "Check the run log for the panic message",
                "Reduce concurrentRequests if this correlates with resource exhaustion",
            ],
        }
    }

    /// Returns all error codes.
    #[must_use]
    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigNotFound,
            Self::ConfigReadError,
            Self::ConfigParseError,
            Self::ConfigValidationError,
            Self::ConfigEnvError,
            Self::ConfigPatternInvalid,
            Self::NetworkRootUnreachable,
            Self::NetworkTimeout,
            Self::NetworkStatusError,
            Self::NetworkTransportError,
            Self::NetworkMalformedResponse,
            Self::ClassifyAmbiguousCategory,
            Self::ExtractAttributeParseFailed,
            Self::ExtractVemoxParseFailed,
            Self::ExtractTimestampInvalid,
            Self::ValidatePathNoMatch,
            Self::ValidatePlaceholderUnresolved,
            Self::ValidateNameNoMatch,
            Self::ValidateTestTypeMismatch,
            Self::EmitDirCreateFailed,
            Self::EmitWriteFailed,
            Self::EmitSerializeFailed,
            Self::InternalStateError,
            Self::InternalTaskFailed,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Configuration loading and validation (E001-E099)
    Config,
    /// Catalog fetch and transport failures (E100-E199)
    Network,
    /// Classification and attribute extraction (E200-E299)
    Classify,
    /// Path and naming convention checks (E300-E399)
    Validate,
    /// Aggregation and output emission (E400-E499)
    Emit,
    /// Unexpected internal errors (E500-E599)
    Internal,
}

impl ErrorCategory {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::Network => "Network",
            Self::Classify => "Classify",
            Self::Validate => "Validate",
            Self::Emit => "Emit",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_numbers_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::all() {
            assert!(
                seen.insert(code.code_number()),
                "duplicate error code number for {code:?}"
            );
        }
    }

    #[test]
    fn error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.code_string(), "TIS-E001");
        assert_eq!(ErrorCode::NetworkRootUnreachable.code_string(), "TIS-E100");
        assert_eq!(ErrorCode::ClassifyAmbiguousCategory.code_string(), "TIS-E200");
        assert_eq!(ErrorCode::ValidatePathNoMatch.code_string(), "TIS-E300");
        assert_eq!(ErrorCode::EmitDirCreateFailed.code_string(), "TIS-E400");
        assert_eq!(ErrorCode::InternalStateError.code_string(), "TIS-E500");
    }

    #[test]
    fn error_code_categories() {
        assert_eq!(ErrorCode::ConfigNotFound.category(), ErrorCategory::Config);
        assert_eq!(
            ErrorCode::NetworkTimeout.category(),
            ErrorCategory::Network
        );
        assert_eq!(
            ErrorCode::ExtractVemoxParseFailed.category(),
            ErrorCategory::Classify
        );
        assert_eq!(
            ErrorCode::ValidateNameNoMatch.category(),
            ErrorCategory::Validate
        );
        assert_eq!(ErrorCode::EmitWriteFailed.category(), ErrorCategory::Emit);
        assert_eq!(
            ErrorCode::InternalTaskFailed.category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn every_code_has_remediation() {
        for code in ErrorCode::all() {
            assert!(!code.remediation().is_empty(), "{code:?} has no remediation");
        }
    }
}
