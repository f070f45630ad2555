//! Static asset copying.
//!
//! Static trees are mirrored into the output root in the order given. The
//! theme's `static/` goes first so the site's own `static/` can overwrite any
//! file of the same name.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Copy every file under each of `sources` into `dest`, later sources
/// winning. Missing sources are skipped.
///
/// Returns the number of distinct files written.
pub fn copy_static(sources: &[PathBuf], dest: &Path) -> Result<usize, AssetError> {
    let mut written = BTreeSet::new();
    for source in sources {
        if !source.is_dir() {
            tracing::debug!(dir = %source.display(), "No static directory");
            continue;
        }
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry?;
            let Ok(rel) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = dest.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else if entry.file_type().is_file() {
                fs::copy(entry.path(), &target)?;
                written.insert(rel.to_path_buf());
            }
        }
    }
    Ok(written.len())
}
