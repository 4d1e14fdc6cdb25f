//! One-file-per-row prediction writer.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name for the prediction of the 1-based row `index`.
pub fn prediction_file_name(index: usize) -> String {
    format!("problem_id_{}.txt", index)
}

/// Write each label to its own file `problem_id_<i>.txt` in `dir`.
///
/// Files contain exactly the label bytes. Writing stops at the first failure;
/// files written before it are left in place.
pub fn write_prediction_files<P: AsRef<Path>>(dir: P, labels: &[String]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut written = Vec::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        let path = dir.join(prediction_file_name(i + 1));
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create prediction file: {}", path.display()))?;
        file.write_all(label.as_bytes())
            .with_context(|| format!("Failed to write prediction file: {}", path.display()))?;
        written.push(path);
    }
    log::info!("Wrote {} prediction files to {}", written.len(), dir.display());
    Ok(written)
}
