//! The ordered list of repositories that resolution falls back across.
//!
//! The registry is loaded once from the config file and handed by reference
//! to whatever needs it. Every mutation is written back immediately;
//! concurrent writers are not coordinated and the last save wins.

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::config::{AppConfig, Repository, default_repositories};
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct RepositoryRegistry {
    path: PathBuf,
    config: AppConfig,
}

impl RepositoryRegistry {
    pub fn open(path: PathBuf) -> Result<Self> {
        let config = AppConfig::load(&path)?;
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn list(&self) -> &[Repository] {
        &self.config.repositories
    }

    /// Adds or overwrites `name`. An overwritten entry keeps its priority.
    pub fn add(&mut self, name: &str, url: &str) -> Result<Repository> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArguments("repository name must not be empty".into()));
        }
        let url = normalize_url(url)?;
        let repo = Repository::new(name, url);

        match self.config.repositories.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.url = repo.url.clone(),
            None => self.config.repositories.push(repo.clone()),
        }
        self.config.save(&self.path)?;
        info!(name = %repo.name, url = %repo.url, "added repository");
        Ok(repo)
    }

    pub fn remove(&mut self, name: &str) -> Result<Repository> {
        let name = name.trim();
        let idx = self
            .config
            .repositories
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::RepositoryNotFound {
                name: name.to_string(),
            })?;
        let removed = self.config.repositories.remove(idx);
        self.config.save(&self.path)?;
        info!(name = %removed.name, "removed repository");
        Ok(removed)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.config.repositories = default_repositories();
        self.config.save(&self.path)?;
        info!("reset repositories to defaults");
        Ok(())
    }

    /// Picks repositories by name, in the order the names are given.
    pub fn select(&self, names: &[String]) -> Result<Vec<Repository>> {
        names
            .iter()
            .map(|name| {
                let name = name.trim();
                self.config
                    .repositories
                    .iter()
                    .find(|r| r.name == name)
                    .cloned()
                    .ok_or_else(|| Error::RepositoryNotFound {
                        name: name.to_string(),
                    })
            })
            .collect()
    }

    /// The repositories a command should use: explicit URLs, named
    /// entries, or the full registry, in that precedence.
    pub fn effective(&self, names: &[String], urls: &[String]) -> Result<Vec<Repository>> {
        match (names.is_empty(), urls.is_empty()) {
            (false, false) => Err(Error::InvalidArguments(
                "repository names and repository URLs cannot be combined".into(),
            )),
            (true, false) => custom_repositories(urls),
            (false, true) => self.select(names),
            (true, true) => Ok(self.config.repositories.clone()),
        }
    }
}

/// Validates an http(s) base URL and gives it a trailing slash so that
/// relative joins land underneath it.
pub fn normalize_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    let mut url = parsed.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

pub fn custom_repositories(urls: &[String]) -> Result<Vec<Repository>> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| Ok(Repository::new(format!("custom-{}", i + 1), normalize_url(url)?)))
        .collect()
}
