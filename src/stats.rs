//! Summary of what has accumulated in a download directory.

use std::path::Path;

use ignore::WalkBuilder;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadStats {
    pub total_files: usize,
    pub jar_files: usize,
    pub source_jars: usize,
    pub javadoc_jars: usize,
    pub pom_files: usize,
    pub other_files: usize,
    pub total_bytes: u64,
}

impl DownloadStats {
    fn record(&mut self, name: &str, size: u64) {
        self.total_files += 1;
        self.total_bytes += size;
        if name.ends_with(".jar") {
            self.jar_files += 1;
            if name.contains("-sources.jar") {
                self.source_jars += 1;
            } else if name.contains("-javadoc.jar") {
                self.javadoc_jars += 1;
            }
        } else if name.ends_with(".pom") {
            self.pom_files += 1;
        } else {
            self.other_files += 1;
        }
    }

    /// Total size in MiB, rounded to two decimals.
    pub fn total_size_mb(&self) -> f64 {
        (self.total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// Counts the files under `dir`. Source and javadoc JARs are also counted
/// as JARs. Returns `None` when `dir` does not exist.
pub fn download_stats(dir: &Path) -> Result<Option<DownloadStats>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut stats = DownloadStats::default();
    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();
    for entry in walker {
        let entry = entry.map_err(|e| Error::io(dir, std::io::Error::other(e)))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let size = entry
            .metadata()
            .map_err(|e| Error::io(entry.path(), std::io::Error::other(e)))?
            .len();
        stats.record(&entry.file_name().to_string_lossy(), size);
    }
    Ok(Some(stats))
}
