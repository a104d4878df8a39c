//! Writing a run's artifacts to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::pipeline::PipelineOutcome;

pub const REPORT_FILE: &str = "report.json";

/// Write every produced output of `outcome` under `dir`.
///
/// Layout:
/// - `plan.json`, `advice.json`, `review.json`, `insights.json`, `theme.json`
/// - `flowchart.svg`, `image.txt` (the data URI or placeholder URL)
/// - `code/<fileName>` for each generated file, `code/globals.css`
/// - `report.json` with the run spec, stage statuses and notifications
///
/// Fallback outputs are written too; `report.json` tells them apart.
/// Generated file names are checked before anything touches the disk, so a
/// bad name leaves `dir` untouched. Returns the paths written, report last.
pub fn export_outcome(outcome: &PipelineOutcome, dir: &Path) -> Result<Vec<PathBuf>> {
    let state = &outcome.state;
    let code_paths = match state.code.output() {
        Some(code) => code
            .relative_paths()
            .context("Refusing to export generated code")?,
        None => Vec::new(),
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();

    if let Some(plan) = state.plan.output() {
        written.push(write_json(dir, "plan.json", plan)?);
    }
    if let Some(flowchart) = state.flowchart.output() {
        written.push(write_text(dir, "flowchart.svg", flowchart.as_str())?);
    }
    if let Some(advice) = state.advice.output() {
        written.push(write_json(dir, "advice.json", advice)?);
    }
    if let Some(code) = state.code.output() {
        let code_dir = dir.join("code");
        for (relative, file) in code_paths.iter().zip(&code.files) {
            let path = code_dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, &file.file_content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), "Exported generated file");
            written.push(path);
        }
        if let Some(styles) = &code.global_styles {
            fs::create_dir_all(&code_dir)
                .with_context(|| format!("Failed to create {}", code_dir.display()))?;
            written.push(write_text(&code_dir, "globals.css", styles)?);
        }
    }
    if let Some(image) = state.image.output() {
        written.push(write_text(dir, "image.txt", image.as_str())?);
    }
    if let Some(insights) = state.insights.output() {
        written.push(write_json(dir, "insights.json", insights)?);
    }
    if let Some(review) = state.review.output() {
        written.push(write_json(dir, "review.json", review)?);
    }
    if let Some(theme) = state.theme.output() {
        written.push(write_json(dir, "theme.json", theme)?);
    }

    written.push(write_json(dir, REPORT_FILE, outcome)?);

    info!(dir = %dir.display(), files = written.len(), "Exported run artifacts");
    Ok(written)
}

fn write_text(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {name}"))?;
    write_text(dir, name, &json)
}
