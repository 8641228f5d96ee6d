// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Disk plumbing for the command line: load selected files into memory,
// persist finished outputs.

use std::fs;
use std::path::{Path, PathBuf};

use filewerk_core::error::{FilewerkError, Result};
use filewerk_core::types::{FileKind, InputFile, OutputFile, TagRule};
use tracing::{debug, info};

/// Read every path into an [`InputFile`], rejecting anything that is not of
/// the `expected` kind.
pub fn read_inputs(paths: &[PathBuf], expected: FileKind) -> Result<Vec<InputFile>> {
    paths.iter().map(|path| read_input(path, expected)).collect()
}

fn read_input(path: &Path, expected: FileKind) -> Result<InputFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FilewerkError::UnsupportedFile(path.display().to_string()))?;

    let input = InputFile::new(name, fs::read(path)?);
    if input.kind() != Some(expected) {
        return Err(FilewerkError::UnsupportedFile(format!(
            "{} is not a {expected:?} file",
            input.name
        )));
    }

    debug!(file = %input.name, bytes = input.size(), "Input loaded");
    Ok(input)
}

/// Load a JSON array of tag rules.
pub fn read_rules(path: &Path) -> Result<Vec<TagRule>> {
    let contents = fs::read_to_string(path)?;
    let rules: Vec<TagRule> = serde_json::from_str(&contents)?;
    debug!(count = rules.len(), "Tag rules loaded");
    Ok(rules)
}

/// Write `output` into `dir`, creating the directory when needed.
pub fn write_output(dir: &Path, output: &OutputFile) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&output.name);
    fs::write(&path, &output.bytes)?;
    info!(path = %path.display(), bytes = output.bytes.len(), "Output written");
    Ok(path)
}
