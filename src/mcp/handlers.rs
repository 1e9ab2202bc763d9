//! Tool call handlers. Each takes the JSON `arguments` object and returns
//! the JSON value that is rendered into the tool result text.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Value, json};

use super::server::McpServer;
use crate::coordinate::{Coordinate, GroupArtifact};
use crate::error::{Error, Result};
use crate::resolver::Strategy;
use crate::service::{DownloadRequest, default_decompile_dir};
use crate::stats::download_stats;
use crate::transport::Transport;

pub fn handle_tool_call<T: Transport + Clone>(
    server: &McpServer<T>,
    tool_name: &str,
    arguments: Value,
) -> Result<Value> {
    match tool_name {
        "download_artifact" => download_artifact(server, arguments),
        "decompile_jar" => decompile_jar(server, arguments),
        "search_versions" => search_versions(server, arguments),
        "search_artifacts" => search_artifacts(server, arguments),
        "check_artifact_exists" => check_artifact_exists(server, arguments),
        "get_download_stats" => get_download_stats(arguments),
        "list_repositories" => list_repositories(server),
        "add_repository" => add_repository(server, arguments),
        "remove_repository" => remove_repository(server, arguments),
        "reset_repositories" => reset_repositories(server),
        _ => Err(Error::InvalidArguments(format!("unknown tool: {tool_name}"))),
    }
}

fn parse_args<A: for<'de> Deserialize<'de>>(arguments: Value) -> Result<A> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidArguments(e.to_string()))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DownloadArgs {
    artifact: String,
    #[serde(default)]
    repo_names: Vec<String>,
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    include_sources: bool,
    #[serde(default)]
    include_javadoc: bool,
    #[serde(default)]
    force_binary: bool,
}

fn download_artifact<T: Transport + Clone>(server: &McpServer<T>, arguments: Value) -> Result<Value> {
    let args: DownloadArgs = parse_args(arguments)?;
    let coordinate = Coordinate::parse(&args.artifact)?;
    let (repositories, output_dir) = server.with_registry(|registry| {
        let repos = registry.effective(&args.repo_names, &args.repositories)?;
        Ok((repos, registry.config().output_dir(args.output_dir.as_deref())))
    })?;

    let strategy = if args.force_binary || !args.include_sources {
        Strategy::BinaryOnly
    } else {
        Strategy::Auto
    };
    let request = DownloadRequest {
        coordinate,
        strategy,
        output_dir,
        include_javadoc: args.include_javadoc,
    };
    let report = server.fetcher().download(&repositories, &request)?;
    Ok(serde_json::to_value(report)?)
}

#[derive(Debug, Deserialize)]
struct DecompileArgs {
    jar_path: PathBuf,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

fn decompile_jar<T: Transport + Clone>(server: &McpServer<T>, arguments: Value) -> Result<Value> {
    let args: DecompileArgs = parse_args(arguments)?;
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| default_decompile_dir(&args.jar_path));
    let report = server.fetcher().decompile(&args.jar_path, &output_dir)?;
    Ok(serde_json::to_value(report)?)
}

#[derive(Debug, Deserialize)]
struct VersionsArgs {
    group_id: String,
    artifact_id: String,
    #[serde(default)]
    repo_names: Vec<String>,
}

fn search_versions<T: Transport + Clone>(server: &McpServer<T>, arguments: Value) -> Result<Value> {
    let args: VersionsArgs = parse_args(arguments)?;
    let coordinate = GroupArtifact::parse(&format!("{}:{}", args.group_id, args.artifact_id))?;
    let repositories = server.with_registry(|r| r.effective(&args.repo_names, &[]))?;

    let versions = server.fetcher().versions(&repositories, &coordinate);
    Ok(json!({
        "group_id": coordinate.group,
        "artifact_id": coordinate.artifact,
        "total_versions": versions.len(),
        "versions": versions,
    }))
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    10
}

fn search_artifacts<T: Transport + Clone>(server: &McpServer<T>, arguments: Value) -> Result<Value> {
    let args: SearchArgs = parse_args(arguments)?;
    let hits = server.fetcher().search(&args.query, args.max_results.max(1))?;
    Ok(json!({ "query": args.query, "results": hits }))
}

#[derive(Debug, Deserialize)]
struct CheckArgs {
    artifact: String,
    #[serde(default)]
    repo_names: Vec<String>,
}

fn check_artifact_exists<T: Transport + Clone>(
    server: &McpServer<T>,
    arguments: Value,
) -> Result<Value> {
    let args: CheckArgs = parse_args(arguments)?;
    let coordinate = Coordinate::parse(&args.artifact)?;
    let repositories = server.with_registry(|r| r.effective(&args.repo_names, &[]))?;
    Ok(serde_json::to_value(server.fetcher().check(&repositories, &coordinate))?)
}

#[derive(Debug, Deserialize)]
struct StatsArgs {
    #[serde(default = "default_download_dir")]
    download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn get_download_stats(arguments: Value) -> Result<Value> {
    let args: StatsArgs = parse_args(arguments)?;
    let Some(stats) = download_stats(&args.download_dir)? else {
        return Ok(json!({
            "exists": false,
            "message": format!("Download directory does not exist: {}", args.download_dir.display()),
        }));
    };
    Ok(json!({
        "exists": true,
        "directory": args.download_dir,
        "total_files": stats.total_files,
        "jar_files": stats.jar_files,
        "source_jars": stats.source_jars,
        "javadoc_jars": stats.javadoc_jars,
        "pom_files": stats.pom_files,
        "other_files": stats.other_files,
        "total_size_mb": stats.total_size_mb(),
    }))
}

fn list_repositories<T: Transport + Clone>(server: &McpServer<T>) -> Result<Value> {
    let repos = server.with_registry(|r| Ok(r.list().to_vec()))?;
    Ok(serde_json::to_value(repos)?)
}

#[derive(Debug, Deserialize)]
struct AddRepositoryArgs {
    name: String,
    url: String,
}

fn add_repository<T: Transport + Clone>(server: &McpServer<T>, arguments: Value) -> Result<Value> {
    let args: AddRepositoryArgs = parse_args(arguments)?;
    let repo = server.with_registry(|r| r.add(&args.name, &args.url))?;
    Ok(json!({
        "success": true,
        "message": format!("Added repository {}", repo.name),
        "repository": repo,
    }))
}

#[derive(Debug, Deserialize)]
struct RemoveRepositoryArgs {
    name: String,
}

fn remove_repository<T: Transport + Clone>(server: &McpServer<T>, arguments: Value) -> Result<Value> {
    let args: RemoveRepositoryArgs = parse_args(arguments)?;
    let removed = server.with_registry(|r| r.remove(&args.name))?;
    Ok(json!({
        "success": true,
        "message": format!("Removed repository {}", removed.name),
    }))
}

fn reset_repositories<T: Transport + Clone>(server: &McpServer<T>) -> Result<Value> {
    let repos = server.with_registry(|r| {
        r.reset()?;
        Ok(r.list().to_vec())
    })?;
    Ok(json!({ "success": true, "repositories": repos }))
}
