//! Sequential fallback across repositories.
//!
//! Repositories are scanned strictly in the order given and the first one
//! that both answers the existence probe and serves the file wins. A
//! repository that times out, refuses the connection, answers 404/5xx, or
//! fails mid-download counts as "not here" and the scan moves on; only
//! exhausting the list is reported to the caller.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Repository;
use crate::coordinate::{ArtifactKind, Coordinate};
use crate::downloader::{Downloader, SavedFile};
use crate::error::{Error, Result};
use crate::transport::{Probe, Transport, join_url};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    Sources,
    Binary,
}

/// Which JARs resolution is allowed to settle on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Sources first, binary if no repository has sources.
    Auto,
    SourcesOnly,
    BinaryOnly,
}

impl Strategy {
    pub fn from_flags(sources_only: bool, force_binary: bool) -> Result<Self> {
        match (sources_only, force_binary) {
            (true, true) => Err(Error::InvalidArguments(
                "sources-only and force-binary cannot be combined".into(),
            )),
            (true, false) => Ok(Strategy::SourcesOnly),
            (false, true) => Ok(Strategy::BinaryOnly),
            (false, false) => Ok(Strategy::Auto),
        }
    }

    fn kinds(self) -> &'static [ArtifactKind] {
        match self {
            Strategy::Auto => &[ArtifactKind::Sources, ArtifactKind::Binary],
            Strategy::SourcesOnly => &[ArtifactKind::Sources],
            Strategy::BinaryOnly => &[ArtifactKind::Binary],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub coordinate: Coordinate,
    pub mode: ResolveMode,
    /// The JAR that was downloaded: the sources JAR in sources mode, the
    /// binary JAR otherwise.
    pub artifact_path: PathBuf,
    /// Sources JAR, either downloaded or packaged from decompiled output.
    pub sources_path: Option<PathBuf>,
    pub decompiled_dir: Option<PathBuf>,
    pub used_repository: String,
    pub url: String,
    pub size: u64,
    pub sha256: String,
}

/// A file that was found and saved by [`Resolver::fetch_first`].
#[derive(Debug, Clone)]
pub struct Fetched {
    pub repository: Repository,
    pub url: String,
    pub saved: SavedFile,
}

#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub repository: String,
    pub url: String,
    pub available: bool,
}

pub struct Resolver<'a, T> {
    downloader: &'a Downloader<T>,
    repositories: &'a [Repository],
}

impl<'a, T: Transport> Resolver<'a, T> {
    pub fn new(downloader: &'a Downloader<T>, repositories: &'a [Repository]) -> Self {
        Self {
            downloader,
            repositories,
        }
    }

    pub fn resolve(
        &self,
        coordinate: &Coordinate,
        strategy: Strategy,
        output_dir: &Path,
    ) -> Result<DownloadResult> {
        for &kind in strategy.kinds() {
            let Some(fetched) = self.fetch_first(coordinate, kind, output_dir) else {
                info!(%coordinate, ?kind, "not found in any repository");
                continue;
            };

            let mode = match kind {
                ArtifactKind::Sources => ResolveMode::Sources,
                _ => ResolveMode::Binary,
            };
            let sources_path = (mode == ResolveMode::Sources).then(|| fetched.saved.path.clone());
            return Ok(DownloadResult {
                coordinate: coordinate.clone(),
                mode,
                artifact_path: fetched.saved.path,
                sources_path,
                decompiled_dir: None,
                used_repository: fetched.repository.name,
                url: fetched.url,
                size: fetched.saved.size,
                sha256: fetched.saved.sha256,
            });
        }

        Err(Error::ArtifactNotFound {
            coordinate: coordinate.to_string(),
        })
    }

    /// Scans repositories in order and saves `kind` from the first one that
    /// has it into the Maven layout under `output_dir`.
    pub fn fetch_first(
        &self,
        coordinate: &Coordinate,
        kind: ArtifactKind,
        output_dir: &Path,
    ) -> Option<Fetched> {
        let target = coordinate.layout_path(output_dir, kind);
        let path = coordinate.repository_path(kind);

        for repo in self.repositories {
            let url = match join_url(&repo.url, &path) {
                Ok(url) => url,
                Err(e) => {
                    warn!(repository = %repo.name, error = %e, "skipping repository");
                    continue;
                }
            };

            match self.downloader.transport().probe(&url) {
                Probe::Found => {}
                Probe::Missing(status) => {
                    debug!(repository = %repo.name, %url, status, "not present");
                    continue;
                }
                Probe::Failed(reason) => {
                    warn!(repository = %repo.name, %url, %reason, "probe failed");
                    continue;
                }
            }

            match self.downloader.download(&url, &target) {
                Ok(saved) => {
                    return Some(Fetched {
                        repository: repo.clone(),
                        url,
                        saved,
                    });
                }
                Err(e) => warn!(repository = %repo.name, error = %e, "download failed"),
            }
        }
        None
    }

    /// Probes every repository for `kind` without short-circuiting.
    pub fn availability(&self, coordinate: &Coordinate, kind: ArtifactKind) -> Vec<Availability> {
        let path = coordinate.repository_path(kind);
        self.repositories
            .iter()
            .map(|repo| {
                let (url, available) = match join_url(&repo.url, &path) {
                    Ok(url) => {
                        let found = self.downloader.transport().probe(&url).is_found();
                        (url, found)
                    }
                    Err(_) => (format!("{}{path}", repo.url), false),
                };
                Availability {
                    repository: repo.name.clone(),
                    url,
                    available,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use tempfile::TempDir;

    const GSON_SOURCES: &str = "com/google/gson/gson/2.8.9/gson-2.8.9-sources.jar";
    const GSON_BINARY: &str = "com/google/gson/gson/2.8.9/gson-2.8.9.jar";

    fn repos() -> Vec<Repository> {
        vec![
            Repository::new("first", "https://one.example/m2/"),
            Repository::new("second", "https://two.example/m2/"),
            Repository::new("third", "https://three.example/m2/"),
        ]
    }

    fn gson() -> Coordinate {
        Coordinate::new("com.google.gson", "gson", "2.8.9")
    }

    fn heads(transport: &FakeTransport) -> Vec<String> {
        transport
            .requests()
            .into_iter()
            .filter(|r| r.starts_with("HEAD "))
            .collect()
    }

    #[test]
    fn sources_preferred_when_present() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new()
            .serve(&format!("https://one.example/m2/{GSON_SOURCES}"), b"sources")
            .serve(&format!("https://one.example/m2/{GSON_BINARY}"), b"binary");
        let downloader = Downloader::new(&transport);
        let repos = repos()[..1].to_vec();

        let result = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::Auto, dir.path())
            .unwrap();

        assert_eq!(result.mode, ResolveMode::Sources);
        assert_eq!(result.used_repository, "first");
        let expected = dir
            .path()
            .join("com/google/gson/gson/2.8.9/gson-2.8.9-sources.jar");
        assert_eq!(result.artifact_path, expected);
        assert_eq!(result.sources_path.as_deref(), Some(expected.as_path()));
        assert_eq!(std::fs::read(expected).unwrap(), b"sources");
    }

    #[test]
    fn hand_edited_config_url_resolves_under_its_path() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(
            &config,
            r#"{"repositories": [{"name": "corp", "url": "https://corp.example/maven2"}]}"#,
        )
        .unwrap();
        let registry = crate::registry::RepositoryRegistry::open(config).unwrap();

        let transport = FakeTransport::new();
        let downloader = Downloader::new(&transport);
        let err = Resolver::new(&downloader, registry.list())
            .resolve(&Coordinate::new("g", "a", "1"), Strategy::SourcesOnly, dir.path())
            .unwrap_err();

        assert!(matches!(err, Error::ArtifactNotFound { .. }));
        assert_eq!(
            transport.requests(),
            vec!["HEAD https://corp.example/maven2/g/a/1/a-1-sources.jar".to_string()]
        );
    }

    #[test]
    fn sources_found_in_second_repository_after_first_probed() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new()
            .serve(&format!("https://two.example/m2/{GSON_SOURCES}"), b"sources");
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let result = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::Auto, dir.path())
            .unwrap();

        assert_eq!(result.mode, ResolveMode::Sources);
        assert_eq!(result.used_repository, "second");
        assert_eq!(
            transport.requests(),
            vec![
                format!("HEAD https://one.example/m2/{GSON_SOURCES}"),
                format!("HEAD https://two.example/m2/{GSON_SOURCES}"),
                format!("GET https://two.example/m2/{GSON_SOURCES}"),
            ]
        );
    }

    #[test]
    fn absent_everywhere_probes_every_repository_in_order() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new();
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let err = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::Auto, dir.path())
            .unwrap_err();

        assert!(matches!(err, Error::ArtifactNotFound { coordinate } if coordinate == "com.google.gson:gson:2.8.9"));
        let mut expected = Vec::new();
        for path in [GSON_SOURCES, GSON_BINARY] {
            for host in ["one", "two", "three"] {
                expected.push(format!("HEAD https://{host}.example/m2/{path}"));
            }
        }
        assert_eq!(transport.requests(), expected);
        assert_eq!(transport.requests().len(), 6);
    }

    #[test]
    fn falls_back_to_binary_when_no_sources() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new()
            .serve(&format!("https://three.example/m2/{GSON_BINARY}"), b"binary");
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let result = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::Auto, dir.path())
            .unwrap();

        assert_eq!(result.mode, ResolveMode::Binary);
        assert_eq!(result.used_repository, "third");
        assert!(result.sources_path.is_none());
        assert_eq!(heads(&transport).len(), 6);
    }

    #[test]
    fn sources_only_never_touches_binary() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new()
            .serve(&format!("https://one.example/m2/{GSON_BINARY}"), b"binary");
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let err = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::SourcesOnly, dir.path())
            .unwrap_err();

        assert!(matches!(err, Error::ArtifactNotFound { .. }));
        assert!(transport.requests().iter().all(|r| r.ends_with("-sources.jar")));
    }

    #[test]
    fn binary_only_skips_sources() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new()
            .serve(&format!("https://one.example/m2/{GSON_SOURCES}"), b"sources")
            .serve(&format!("https://one.example/m2/{GSON_BINARY}"), b"binary");
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let result = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::BinaryOnly, dir.path())
            .unwrap();

        assert_eq!(result.mode, ResolveMode::Binary);
        assert_eq!(
            transport.requests(),
            vec![
                format!("HEAD https://one.example/m2/{GSON_BINARY}"),
                format!("GET https://one.example/m2/{GSON_BINARY}"),
            ]
        );
    }

    #[test]
    fn network_failures_are_absorbed_into_the_scan() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new()
            .unreachable("https://one.example/")
            .broken_body(&format!("https://two.example/m2/{GSON_SOURCES}"), b"")
            .serve(&format!("https://three.example/m2/{GSON_SOURCES}"), b"sources");
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let result = Resolver::new(&downloader, &repos)
            .resolve(&gson(), Strategy::Auto, dir.path())
            .unwrap();

        assert_eq!(result.used_repository, "third");
        assert_eq!(
            std::fs::read(&result.artifact_path).unwrap(),
            b"sources".to_vec()
        );
    }

    #[test]
    fn availability_probes_all_repositories() {
        let transport = FakeTransport::new()
            .serve(&format!("https://one.example/m2/{GSON_BINARY}"), b"binary")
            .serve(&format!("https://three.example/m2/{GSON_BINARY}"), b"binary");
        let downloader = Downloader::new(&transport);
        let repos = repos();

        let report = Resolver::new(&downloader, &repos).availability(&gson(), ArtifactKind::Binary);
        let flags: Vec<(String, bool)> = report
            .into_iter()
            .map(|a| (a.repository, a.available))
            .collect();
        assert_eq!(
            flags,
            vec![
                ("first".to_string(), true),
                ("second".to_string(), false),
                ("third".to_string(), true),
            ]
        );
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn strategy_flags_conflict() {
        assert!(Strategy::from_flags(true, true).is_err());
        assert_eq!(Strategy::from_flags(false, false).unwrap(), Strategy::Auto);
    }
}
