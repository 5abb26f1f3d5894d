//! Filesystem-facing half of aggregation and emission.
//!
//! Kept separate from [`crate::aggregator`] so the grouping/latest logic
//! stays a pure, easily-tested function and only this module touches the
//! filesystem.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tis_common::errors::TisResult;
use tis_common::types::AggregatedOutput;
use tracing::info;

use crate::aggregator;

/// Writes one grouped-artifacts file and one latest-artifacts file per
/// component category found in `output`.
pub fn emit_all(output: &AggregatedOutput, run_dir: &Path, timestamp: &str) -> TisResult<()> {
    for component_name in aggregator::component_names(output) {
        let sanitized = aggregator::sanitize_component_name(&component_name);
        let partitioned = aggregator::partition_by_component(output, &component_name);

        let grouped_path = run_dir.join(format!("{sanitized}_artifacts_{timestamp}.json"));
        write_json(&grouped_path, &partitioned)?;
        info!(file = %grouped_path.display(), "wrote grouped artifacts");

        let latest_path = run_dir.join(format!("latest_{sanitized}_artifacts_{timestamp}.json"));
        write_json(&latest_path, &aggregator::latest_only(&partitioned))?;
        info!(file = %latest_path.display(), "wrote latest artifacts");
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> TisResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .map_err(|source| tis_common::errors::TisError::Json { code: tis_common::errors::catalog::ErrorCode::EmitWriteFailed, source })?;
    Ok(())
}
