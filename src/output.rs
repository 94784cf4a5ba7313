//! Result file writer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Q5Error, Result};
use crate::join::ResultMap;

pub const RESULT_FILE: &str = "query5_result.txt";

/// Rows by revenue, highest first; equal revenue falls back to name order.
pub fn sorted_rows(results: &ResultMap) -> Vec<(&str, f64)> {
    let mut rows: Vec<(&str, f64)> = results.iter().map(|(n, v)| (n.as_str(), *v)).collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

/// Writes `NATION|revenue` lines to `dir/query5_result.txt`, creating `dir` if needed.
pub fn write_results(dir: &Path, results: &ResultMap) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(RESULT_FILE);
    let file = File::create(&path).map_err(|source| Q5Error::Open {
        path: path.clone(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    for (name, revenue) in sorted_rows(results) {
        writeln!(out, "{name}|{revenue:.2}")?;
    }
    out.flush()?;
    tracing::info!(path = %path.display(), rows = results.len(), "wrote results");
    Ok(path)
}
