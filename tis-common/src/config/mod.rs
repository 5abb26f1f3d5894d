//! Configuration system for the TIS artifact crawler.
//!
//! - [`RawConfig`] mirrors the on-disk JSON document; every field is
//!   optional so a partial file only overrides what it names.
//! - [`ResolvedConfig`] is the immutable, fully-defaulted configuration
//!   actually consumed by the rest of the crate, built by merging
//!   [`RawConfig`] over [`ResolvedConfig::default`] and then applying a
//!   narrow environment-variable allow-list.
//! - [`validate`] rejects anything that would otherwise fail later, so
//!   configuration problems are always a startup error, never a mid-run
//!   surprise.

pub mod env;
pub mod model;
pub mod validate;

pub use env::apply_env_overrides;
pub use model::{
    ConventionRule, NamedConventionRule, PathConvention, RawConfig, ResolvedConfig,
};
pub use validate::validate;

use crate::errors::TisResult;
use std::path::Path;

/// Load and resolve configuration from a JSON file on disk.
///
/// Implements the load order from the external-interfaces section of the
/// crawler's design: built-in defaults, deep-merged file contents (absent
/// or `null` fields fall back to the default), environment overrides, then
/// validation. Validation failures abort before any network activity.
pub fn load(path: &Path) -> TisResult<ResolvedConfig> {
    let raw = read_raw(path)?;
    let mut resolved = ResolvedConfig::default();
    resolved.merge(raw)?;
    apply_env_overrides(&mut resolved)?;
    validate(&resolved)?;
    Ok(resolved)
}

fn read_raw(path: &Path) -> TisResult<RawConfig> {
    use crate::errors::TisError;

    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TisError::config_not_found(path.display().to_string())
        } else {
            TisError::Io(source)
        }
    })?;
    serde_json::from_str(&text).map_err(|e| TisError::config_parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_config_not_found() {
        let err = load(Path::new("/nonexistent/tis-config.json")).unwrap_err();
        assert!(matches!(err, crate::errors::TisError::ConfigNotFound { .. }));
    }

    #[test]
    fn minimal_file_resolves_against_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api": {"rootNodeId": "100"}}"#).unwrap();
        let resolved = load(&path).unwrap();
        assert_eq!(resolved.api.root_node_id, "100");
        assert_eq!(resolved.optimization.concurrent_requests, 8);
    }
}
