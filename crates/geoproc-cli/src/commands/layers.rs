//! Reading input layers and reporting execution results

use crate::output::OutputWriter;
use crate::output_types::{ExecutionOutput, LayerRow, StepRow};
use anyhow::{Context, Result};
use geojson::{FeatureCollection, GeoJson};
use geoproc_executor::{ExecutionResult, LayerSummary};
use std::fs;
use std::path::{Path, PathBuf};

pub fn read_layers(paths: &[PathBuf]) -> Result<Vec<GeoJson>> {
    paths
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            content
                .parse::<GeoJson>()
                .with_context(|| format!("{} is not valid GeoJSON", path.display()))
        })
        .collect()
}

/// Output file for layer `index`: `out.geojson`, `out_1.geojson`, ...
pub fn numbered_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, index, ext),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(name)
}

fn write_layers(base: &Path, layers: &[FeatureCollection]) -> Result<Vec<String>> {
    layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            let path = numbered_path(base, index);
            let json = serde_json::to_string_pretty(layer)?;
            fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(path.display().to_string())
        })
        .collect()
}

/// Write or print the result layers, then report what ran.
///
/// Without an output path stdout carries the GeoJSON alone: one FeatureCollection, or
/// an array when there are several layers.
pub fn emit_result(
    output: &OutputWriter,
    result: &ExecutionResult,
    destination: Option<&Path>,
) -> Result<()> {
    for skipped in &result.skipped {
        output.warning(format!("Skipped unknown operation '{}'", skipped));
    }

    let Some(destination) = destination else {
        let json = match result.layers.as_slice() {
            [single] => serde_json::to_string(single)?,
            layers => serde_json::to_string(layers)?,
        };
        println!("{}", json);
        return Ok(());
    };

    let written = write_layers(destination, &result.layers)?;
    let summaries = result
        .layers
        .iter()
        .enumerate()
        .map(|(i, fc)| {
            LayerSummary::from_layer(format!("output_{}", i), &GeoJson::FeatureCollection(fc.clone()))
        })
        .collect::<geoproc_core::Result<Vec<_>>>()?;

    if output.is_json() {
        output.result(ExecutionOutput {
            executed: result.executed.clone(),
            skipped: result.skipped.clone(),
            layers: summaries,
            written,
        })?;
    } else {
        output.section("Executed Steps");
        output.table(
            result.executed.iter().enumerate().map(|(i, s)| StepRow::executed(i + 1, s)).collect(),
        )?;
        output.section("Output Layers");
        output.table(summaries.iter().map(LayerRow::from).collect())?;
        for path in &written {
            output.success(format!("Wrote {}", path));
        }
    }
    Ok(())
}
