//! Survey extract discovery within a source family directory

use std::path::{Path, PathBuf};

use super::config::SourceFamily;
use super::error::{PipelineError, Result};
use super::loader::SourceFormat;

/// Files of a source family, sorted by file name.
///
/// Only regular files directly inside the directory are considered. Files
/// with an unsupported extension are skipped with a warning; transport-only
/// families skip everything that is not `.xpt`.
pub fn discover_sources(family: &SourceFamily) -> Result<Vec<PathBuf>> {
    let dir = &family.dir;
    if !dir.is_dir() {
        return Err(PipelineError::config(
            dir,
            format!("{} source directory not found", family.name),
        ));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| PipelineError::config(dir, e.to_string()))? {
        let path = entry
            .map_err(|e| PipelineError::config(dir, e.to_string()))?
            .path();
        if !path.is_file() {
            continue;
        }
        if accepts(family, &path) {
            files.push(path);
        } else if !family.xpt_only {
            log::warn!("Skipping unsupported file: {}", path.display());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        log::info!("No survey files found in {}", dir.display());
    } else {
        log::info!("Found {} {} file(s) in {}", files.len(), family.name, dir.display());
    }
    Ok(files)
}

fn accepts(family: &SourceFamily, path: &Path) -> bool {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Xpt) => true,
        Some(_) => !family.xpt_only,
        None => false,
    }
}
