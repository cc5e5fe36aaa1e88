//! File-level glue for the `lottie-studio` binary: project and Lottie
//! document I/O plus SVG import.

pub mod svg;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use studio_core::Project;
use studio_lottie::ImportedProject;

pub fn read_project(path: &Path) -> Result<Project> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project {}", path.display()))?;
    let project: Project = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse project {}", path.display()))?;
    project
        .validate()
        .with_context(|| format!("Invalid project {}", path.display()))?;
    Ok(project)
}

pub fn read_lottie(path: &Path) -> Result<ImportedProject> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read Lottie file {}", path.display()))?;
    studio_lottie::import_str(&text)
        .with_context(|| format!("Failed to import Lottie file {}", path.display()))
}

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Write `value` as JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>, pretty: bool) -> Result<()> {
    let text = to_json(value, pretty)?;
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
