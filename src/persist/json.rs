use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use tracing::info;

use crate::hotel::MatchResult;

/// Writes `results` as a pretty-printed JSON array, creating parent directories as needed.
pub fn write_results(path: &Path, results: &[MatchResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.flush()?;

    info!("wrote {} results to {}", results.len(), path.display());
    Ok(())
}
