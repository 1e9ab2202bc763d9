//! Operations shared by the CLI and the MCP server.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::cfr::{Cfr, java_sources, package_sources};
use crate::config::Repository;
use crate::coordinate::{ArtifactKind, Coordinate, GroupArtifact};
use crate::downloader::Downloader;
use crate::error::Result;
use crate::metadata::{self, SearchHit};
use crate::resolver::{Availability, DownloadResult, ResolveMode, Resolver, Strategy};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub coordinate: Coordinate,
    pub strategy: Strategy,
    pub output_dir: PathBuf,
    pub include_javadoc: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    #[serde(flatten)]
    pub result: DownloadResult,
    pub javadoc_path: Option<PathBuf>,
    pub java_files: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecompileReport {
    pub jar_path: PathBuf,
    pub output_dir: PathBuf,
    pub java_files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub artifact: String,
    pub repositories: Vec<Availability>,
    pub available_in: Vec<String>,
}

pub struct Fetcher<T> {
    downloader: Downloader<T>,
    cfr: Cfr<T>,
}

impl<T: Transport + Clone> Fetcher<T> {
    pub fn new(transport: T, cfr_jar: PathBuf) -> Self {
        Self {
            cfr: Cfr::new(cfr_jar, transport.clone()),
            downloader: Downloader::new(transport),
        }
    }

    pub fn with_java(mut self, java: impl Into<String>) -> Self {
        self.cfr = self.cfr.with_java(java);
        self
    }

    /// Resolves and downloads a coordinate. A binary-only result is
    /// decompiled next to the JAR and repackaged as a sources JAR.
    pub fn download(
        &self,
        repositories: &[Repository],
        request: &DownloadRequest,
    ) -> Result<DownloadReport> {
        let resolver = Resolver::new(&self.downloader, repositories);
        let coordinate = &request.coordinate;
        let mut result = resolver.resolve(coordinate, request.strategy, &request.output_dir)?;
        let mut java_files = None;

        if result.mode == ResolveMode::Binary {
            let layout = coordinate.layout_dir(&request.output_dir);
            let tree = layout.join(format!(
                "{}-{}-decompiled",
                coordinate.artifact, coordinate.version
            ));
            self.cfr.decompile(&result.artifact_path, &tree)?;

            let sources_jar = coordinate.layout_path(&request.output_dir, ArtifactKind::Sources);
            java_files = Some(package_sources(&tree, &sources_jar)?);
            result.sources_path = Some(sources_jar);
            result.decompiled_dir = Some(tree);
        }

        let javadoc_path = if request.include_javadoc {
            let fetched = resolver.fetch_first(coordinate, ArtifactKind::Javadoc, &request.output_dir);
            if fetched.is_none() {
                warn!(%coordinate, "javadoc JAR not found");
            }
            fetched.map(|f| f.saved.path)
        } else {
            None
        };

        info!(%coordinate, mode = ?result.mode, repository = %result.used_repository, "download complete");
        Ok(DownloadReport {
            result,
            javadoc_path,
            java_files,
        })
    }

    pub fn decompile(&self, jar_path: &Path, output_dir: &Path) -> Result<DecompileReport> {
        let tree = self.cfr.decompile(jar_path, output_dir)?;
        Ok(DecompileReport {
            jar_path: jar_path.to_path_buf(),
            java_files: java_sources(&tree).len(),
            output_dir: tree,
        })
    }

    pub fn versions(&self, repositories: &[Repository], coordinate: &GroupArtifact) -> Vec<String> {
        metadata::find_versions(self.downloader.transport(), repositories, coordinate)
    }

    pub fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        metadata::search(self.downloader.transport(), query, max_results)
    }

    pub fn check(&self, repositories: &[Repository], coordinate: &Coordinate) -> AvailabilityReport {
        let resolver = Resolver::new(&self.downloader, repositories);
        let report = resolver.availability(coordinate, ArtifactKind::Binary);
        let available_in = report
            .iter()
            .filter(|a| a.available)
            .map(|a| a.repository.clone())
            .collect();
        AvailabilityReport {
            artifact: coordinate.to_string(),
            repositories: report,
            available_in,
        }
    }
}

/// Default destination for decompiling a local JAR through MCP: a
/// `<stem>-decompiled` directory beside it.
pub fn default_decompile_dir(jar_path: &Path) -> PathBuf {
    let stem = jar_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "jar".to_string());
    let parent = jar_path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}-decompiled"))
}
