//! HTTP access to repositories.
//!
//! Everything that talks to the network goes through [`Transport`], so the
//! resolution logic can be driven by an in-memory fake in tests.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Outcome of an existence check against a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found,
    Missing(u16),
    Failed(String),
}

impl Probe {
    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found)
    }
}

pub trait Transport {
    /// Checks whether `url` exists. Never fails: network errors come back
    /// as [`Probe::Failed`].
    fn probe(&self, url: &str) -> Probe;

    /// Downloads the full body of `url`. Any non-2xx status is an error.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn probe(&self, url: &str) -> Probe {
        (**self).probe(url)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jar-fetch/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::http("<client>", e))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn probe(&self, url: &str) -> Probe {
        let outcome = match self.client.head(url).timeout(PROBE_TIMEOUT).send() {
            Ok(resp) if resp.status().is_success() => Probe::Found,
            Ok(resp) => Probe::Missing(resp.status().as_u16()),
            Err(e) => Probe::Failed(e.to_string()),
        };
        debug!(%url, ?outcome, "probe");
        outcome
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "fetch");
        let resp = self.client.get(url).send().map_err(|e| Error::http(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::http(url, format!("unexpected status {status}")));
        }
        let body = resp.bytes().map_err(|e| Error::http(url, e))?;
        Ok(body.to_vec())
    }
}

/// Resolves `path` underneath a repository base URL. The base is treated
/// as a directory whether or not it ends in `/`.
pub fn join_url(base: &str, path: &str) -> Result<String> {
    let mut base = Url::parse(base).map_err(|e| Error::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    let joined = base.join(path).map_err(|e| Error::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })?;
    Ok(joined.to_string())
}
