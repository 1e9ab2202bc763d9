//! Version listing from `maven-metadata.xml` and Maven Central search.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::Repository;
use crate::coordinate::GroupArtifact;
use crate::error::{Error, Result};
use crate::transport::{Transport, join_url};

pub const SEARCH_URL: &str = "https://search.maven.org/solrsearch/select";

static VERSIONS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<versions>(.*?)</versions>").unwrap());
static VERSION_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<version>\s*([^<\s]+)\s*</version>").unwrap());

/// Versions listed by every repository that answers, newest first. Failing
/// repositories are skipped.
pub fn find_versions<T: Transport>(
    transport: &T,
    repositories: &[Repository],
    coordinate: &GroupArtifact,
) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();
    let path = coordinate.metadata_path();

    for repo in repositories {
        let fetched = join_url(&repo.url, &path).and_then(|url| transport.fetch(&url));
        match fetched {
            Ok(body) => {
                let text = String::from_utf8_lossy(&body);
                let found = parse_metadata_versions(&text);
                debug!(repository = %repo.name, count = found.len(), "metadata versions");
                for v in found {
                    if !versions.contains(&v) {
                        versions.push(v);
                    }
                }
            }
            Err(e) => warn!(repository = %repo.name, error = %e, "failed to read metadata"),
        }
    }

    versions.sort_by(|a, b| compare_versions(b, a));
    versions
}

pub fn parse_metadata_versions(xml: &str) -> Vec<String> {
    let Some(block) = VERSIONS_BLOCK.captures(xml).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    VERSION_ENTRY
        .captures_iter(block.as_str())
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Orders version strings segment by segment: numeric segments compare as
/// numbers and rank above textual ones (`1.0` > `1.0-beta`), textual ones
/// compare case-insensitively, and a longer version wins a shared prefix.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let split = |s: &str| -> Vec<String> {
        s.split(['.', '-', '_'])
            .filter(|p| !p.is_empty())
            .map(str::to_ascii_lowercase)
            .collect()
    };
    let (left, right) = (split(a), split(b));

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    match left.len().cmp(&right.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Greater => tail_order(&left[right.len()..]),
        Ordering::Less => tail_order(&right[left.len()..]).reverse(),
    }
}

/// Extra trailing segments: a numeric tail is a newer release, a textual
/// tail is a qualifier on the shorter release and sorts before it.
fn tail_order(tail: &[String]) -> Ordering {
    match tail.first() {
        Some(seg) if seg.parse::<u64>().is_ok() => Ordering::Greater,
        _ => Ordering::Less,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct SolrResponse {
    response: SolrBody,
}

#[derive(Debug, Deserialize)]
struct SolrBody {
    #[serde(default)]
    docs: Vec<SolrDoc>,
}

#[derive(Debug, Deserialize)]
struct SolrDoc {
    #[serde(default)]
    g: String,
    #[serde(default)]
    a: String,
    #[serde(default, rename = "latestVersion")]
    latest_version: String,
    #[serde(default)]
    description: String,
}

pub fn search_url(query: &str, max_results: usize) -> Result<String> {
    let rows = max_results.to_string();
    let url = Url::parse_with_params(SEARCH_URL, [("q", query), ("rows", &rows), ("wt", "json")])
        .map_err(|e| Error::InvalidUrl {
            url: SEARCH_URL.to_string(),
            reason: e.to_string(),
        })?;
    Ok(url.to_string())
}

pub fn search<T: Transport>(transport: &T, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let url = search_url(query, max_results)?;
    let body = transport.fetch(&url)?;
    parse_search_response(&body)
}

pub fn parse_search_response(body: &[u8]) -> Result<Vec<SearchHit>> {
    let parsed: SolrResponse = serde_json::from_slice(body)?;
    Ok(parsed
        .response
        .docs
        .into_iter()
        .map(|d| SearchHit {
            group: d.g,
            artifact: d.a,
            version: d.latest_version,
            description: d.description,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;

    const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.google.gson</groupId>
  <artifactId>gson</artifactId>
  <versioning>
    <latest>2.10.1</latest>
    <release>2.10.1</release>
    <versions>
      <version>2.8.9</version>
      <version>2.10.1</version>
      <version>2.9.0</version>
    </versions>
    <lastUpdated>20230106000000</lastUpdated>
  </versioning>
</metadata>"#;

    #[test]
    fn parses_versions_block_only() {
        assert_eq!(parse_metadata_versions(METADATA), vec!["2.8.9", "2.10.1", "2.9.0"]);
        assert!(parse_metadata_versions("<metadata><version>1.0</version></metadata>").is_empty());
    }

    #[test]
    fn compares_numerically_and_ranks_qualifiers_lower() {
        assert_eq!(compare_versions("2.10.1", "2.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("31.1-jre", "31.1-android"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-beta", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn merges_repositories_and_sorts_newest_first() {
        let transport = FakeTransport::new()
            .serve(
                "https://one.example/com/google/gson/gson/maven-metadata.xml",
                METADATA.as_bytes(),
            )
            .serve(
                "https://three.example/com/google/gson/gson/maven-metadata.xml",
                b"<metadata><versioning><versions><version>2.11.0</version><version>2.9.0</version></versions></versioning></metadata>",
            )
            .unreachable("https://two.example/");
        let repos = vec![
            Repository::new("one", "https://one.example/"),
            Repository::new("two", "https://two.example/"),
            Repository::new("three", "https://three.example/"),
        ];
        let ga = GroupArtifact::parse("com.google.gson:gson").unwrap();

        let versions = find_versions(&transport, &repos, &ga);
        assert_eq!(versions, vec!["2.11.0", "2.10.1", "2.9.0", "2.8.9"]);
    }

    #[test]
    fn search_url_encodes_query() {
        let url = search_url("google gson", 5).unwrap();
        assert_eq!(
            url,
            "https://search.maven.org/solrsearch/select?q=google+gson&rows=5&wt=json"
        );
    }

    #[test]
    fn parses_solr_docs() {
        let body = br#"{"responseHeader":{"status":0},"response":{"numFound":1,"start":0,"docs":[
            {"id":"com.google.code.gson:gson","g":"com.google.code.gson","a":"gson","latestVersion":"2.10.1","p":"jar"}
        ]}}"#;
        let hits = parse_search_response(body).unwrap();
        assert_eq!(
            hits,
            vec![SearchHit {
                group: "com.google.code.gson".into(),
                artifact: "gson".into(),
                version: "2.10.1".into(),
                description: String::new(),
            }]
        );
    }

    #[test]
    fn search_propagates_transport_failure() {
        let transport = FakeTransport::new();
        assert!(search(&transport, "gson", 10).is_err());
    }
}
