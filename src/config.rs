use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::downloader::write_atomically;
use crate::error::{Error, Result};
use crate::registry::normalize_url;

pub const CONFIG_ENV: &str = "JAR_FETCH_CONFIG";
pub const CFR_ENV: &str = "CFR_JAR";

/// A named repository base URL. Registry order is fallback priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

pub fn default_repositories() -> Vec<Repository> {
    vec![
        Repository::new("maven-central", "https://repo1.maven.org/maven2/"),
        Repository::new("apache-maven", "https://repo.maven.apache.org/maven2/"),
        Repository::new("google-maven", "https://maven.google.com/"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_repositories")]
    pub repositories: Vec<Repository>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repositories: default_repositories(),
            default_output_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`. A missing or unreadable file yields the
    /// defaults; the file on disk is left alone until the next save. An
    /// explicitly empty repository list stays empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = match serde_json::from_str::<AppConfig>(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                return Ok(Self::default());
            }
        };

        for repo in &mut config.repositories {
            match normalize_url(&repo.url) {
                Ok(url) => repo.url = url,
                Err(e) => warn!(name = %repo.name, error = %e, "keeping malformed repository URL"),
            }
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomically(path, json.as_bytes())?;
        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    pub fn output_dir(&self, requested: Option<&Path>) -> PathBuf {
        requested
            .map(Path::to_path_buf)
            .or_else(|| self.default_output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }
}

pub fn tool_home() -> Result<PathBuf> {
    tool_home_in(dirs::home_dir())
}

fn tool_home_in(home: Option<PathBuf>) -> Result<PathBuf> {
    Ok(home.ok_or(Error::HomeDirUnavailable)?.join(".jar-fetch"))
}

pub fn resolve_config_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.config.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(p));
    }

    Ok(tool_home()?.join("config.json"))
}

/// Where the CFR jar lives. The file may not exist yet; the decompiler
/// downloads it on first use.
pub fn resolve_cfr_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.cfr.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(CFR_ENV) {
        return Ok(PathBuf::from(p));
    }

    Ok(tool_home()?.join("tools").join("cfr.jar"))
}
