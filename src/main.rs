use anyhow::{Context, Result};
use clap::Parser;
use jar_fetch::cli::{Cli, Commands, OutputFormat, RepoCommands};
use jar_fetch::config::{resolve_cfr_path, resolve_config_path};
use jar_fetch::coordinate::{Coordinate, GroupArtifact};
use jar_fetch::logging;
use jar_fetch::mcp::{McpServer, http};
use jar_fetch::registry::RepositoryRegistry;
use jar_fetch::resolver::{ResolveMode, Strategy};
use jar_fetch::service::{AvailabilityReport, DecompileReport, DownloadReport, DownloadRequest, Fetcher};
use jar_fetch::transport::HttpTransport;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::process::ExitCode;

const MAX_LISTED_VERSIONS: usize = 20;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose, cli.log_file.as_deref())?;
    let config_path = resolve_config_path(&cli)?;

    match cli.command.clone() {
        Commands::Download {
            coordinate,
            output_dir,
            repo_names,
            repositories,
            sources_only,
            force_binary,
            javadoc,
            format,
        } => {
            let coordinate = Coordinate::parse(&coordinate)?;
            let strategy = Strategy::from_flags(sources_only, force_binary)?;
            let registry = RepositoryRegistry::open(config_path)?;
            let repos = registry.effective(&repo_names, &repositories)?;
            let request = DownloadRequest {
                output_dir: registry.config().output_dir(output_dir.as_deref()),
                coordinate,
                strategy,
                include_javadoc: javadoc,
            };

            let report = fetcher(&cli)?
                .download(&repos, &request)
                .with_context(|| format!("failed to download {}", request.coordinate))?;
            emit(&report, format, print_download)?;
        }
        Commands::Search {
            query,
            max_results,
            format,
        } => {
            let hits = fetcher(&cli)?.search(&query, max_results.max(1))?;
            emit(&hits, format, |hits| {
                if hits.is_empty() {
                    println!("No artifacts found for '{query}'");
                }
                for hit in hits {
                    println!("{}:{}:{}", hit.group, hit.artifact, hit.version);
                    if !hit.description.is_empty() {
                        println!("    {}", hit.description);
                    }
                }
            })?;
        }
        Commands::Versions {
            coordinate,
            repo_names,
            format,
        } => {
            let coordinate = GroupArtifact::parse(&coordinate)?;
            let registry = RepositoryRegistry::open(config_path)?;
            let repos = registry.effective(&repo_names, &[])?;
            let versions = fetcher(&cli)?.versions(&repos, &coordinate);
            emit(&versions, format, |versions| {
                if versions.is_empty() {
                    println!("No versions found for {}:{}", coordinate.group, coordinate.artifact);
                }
                for line in version_lines(versions, MAX_LISTED_VERSIONS) {
                    println!("{line}");
                }
            })?;
        }
        Commands::Check {
            coordinate,
            repo_names,
            format,
        } => {
            let coordinate = Coordinate::parse(&coordinate)?;
            let registry = RepositoryRegistry::open(config_path)?;
            let repos = registry.effective(&repo_names, &[])?;
            let report = fetcher(&cli)?.check(&repos, &coordinate);
            emit(&report, format, print_availability)?;
        }
        Commands::Decompile {
            jar_path,
            output_dir,
            format,
        } => {
            let report = fetcher(&cli)?
                .decompile(&jar_path, &output_dir)
                .with_context(|| format!("failed to decompile {}", jar_path.display()))?;
            emit(&report, format, print_decompile)?;
        }
        Commands::Repo { command } => {
            let mut registry = RepositoryRegistry::open(config_path)?;
            run_repo(&mut registry, command)?;
        }
        Commands::Mcp { stdio, host, port } => {
            let registry = RepositoryRegistry::open(config_path)?;
            let server = McpServer::new(HttpTransport::new()?, registry, resolve_cfr_path(&cli)?);
            if stdio {
                server.run_stdio()?;
            } else {
                http::serve(server, &host, port)?;
            }
        }
    }

    Ok(())
}

fn fetcher(cli: &Cli) -> Result<Fetcher<HttpTransport>> {
    Ok(Fetcher::new(HttpTransport::new()?, resolve_cfr_path(cli)?))
}

fn run_repo(registry: &mut RepositoryRegistry, command: RepoCommands) -> Result<()> {
    match command {
        RepoCommands::List { format } => {
            emit(registry.list(), format, |repos| {
                for (i, repo) in repos.iter().enumerate() {
                    println!("{}. {:<20} {}", i + 1, repo.name, repo.url);
                }
            })?;
        }
        RepoCommands::Add { name, url } => {
            let repo = registry.add(&name, &url)?;
            println!("Added repository {} -> {}", repo.name, repo.url);
        }
        RepoCommands::Remove { name } => {
            let repo = registry.remove(&name)?;
            println!("Removed repository {}", repo.name);
        }
        RepoCommands::Reset { yes } => {
            let stdin = std::io::stdin();
            let confirmed = yes
                || confirm(
                    "Reset repositories to the defaults? [y/N] ",
                    stdin.lock(),
                    std::io::stderr(),
                )?;
            if confirmed {
                registry.reset()?;
                println!("Repositories reset to defaults");
            } else {
                println!("Aborted");
            }
        }
    }
    Ok(())
}

fn emit<V: Serialize + ?Sized>(value: &V, format: OutputFormat, text: impl FnOnce(&V)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

fn confirm(prompt: &str, mut input: impl BufRead, mut out: impl Write) -> Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).context("failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn version_lines(versions: &[String], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = versions.iter().take(limit).cloned().collect();
    if versions.len() > limit {
        lines.push(format!("... and {} more", versions.len() - limit));
    }
    lines
}

fn print_download(report: &DownloadReport) {
    let result = &report.result;
    match result.mode {
        ResolveMode::Sources => println!("Downloaded sources for {}", result.coordinate),
        ResolveMode::Binary => println!("Downloaded and decompiled {}", result.coordinate),
    }
    println!("  repository: {} ({})", result.used_repository, result.url);
    println!("  jar:        {}", result.artifact_path.display());
    println!("  size:       {} bytes", result.size);
    println!("  sha256:     {}", result.sha256);
    if let Some(sources) = &result.sources_path {
        println!("  sources:    {}", sources.display());
    }
    if let Some(tree) = &result.decompiled_dir {
        println!("  decompiled: {}", tree.display());
    }
    if let Some(count) = report.java_files {
        println!("  java files: {count}");
    }
    if let Some(javadoc) = &report.javadoc_path {
        println!("  javadoc:    {}", javadoc.display());
    }
}

fn print_availability(report: &AvailabilityReport) {
    println!("{}", report.artifact);
    for entry in &report.repositories {
        let mark = if entry.available { "found" } else { "missing" };
        println!("  {:<20} {:<8} {}", entry.repository, mark, entry.url);
    }
    if report.available_in.is_empty() {
        println!("Not available in any repository");
    }
}

fn print_decompile(report: &DecompileReport) {
    println!(
        "Decompiled {} into {} ({} java files)",
        report.jar_path.display(),
        report.output_dir.display(),
        report.java_files
    );
}
