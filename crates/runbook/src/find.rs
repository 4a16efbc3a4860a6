// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discover and load `.hcl` job definitions from a directory.

use crate::parser::{parse_definition, ParseError};
use quaero_core::JobDefinition;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FindError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// List every `.hcl` file directly under `dir`, sorted by filename so load
/// order is deterministic.
pub fn find_definition_files(dir: &Path) -> Result<Vec<PathBuf>, FindError> {
    let entries = std::fs::read_dir(dir).map_err(|source| FindError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("hcl"))
        .collect();
    files.sort();
    Ok(files)
}

/// Parse every `.hcl` file directly under `dir` into a [`JobDefinition`].
pub fn load_definitions(dir: &Path) -> Result<Vec<JobDefinition>, FindError> {
    find_definition_files(dir)?
        .into_iter()
        .map(|path| {
            let content = std::fs::read_to_string(&path).map_err(|source| FindError::ReadFile {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), "loading job definition");
            parse_definition(&content).map_err(|source| FindError::Parse { path, source })
        })
        .collect()
}

#[cfg(test)]
#[path = "find_tests.rs"]
mod tests;
