use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "jar-fetch", version)]
#[command(about = "Download Java sources from Maven repositories, decompiling with CFR when none are published")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: $JAR_FETCH_CONFIG or ~/.jar-fetch/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// CFR jar (default: $CFR_JAR or ~/.jar-fetch/tools/cfr.jar, downloaded on first use)
    #[arg(long, global = true, value_name = "FILE")]
    pub cfr: Option<PathBuf>,

    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Download sources for an artifact (group:artifact:version)
    Download {
        coordinate: String,

        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Configured repositories to use, in order
        #[arg(long, value_name = "NAMES", value_delimiter = ',', conflicts_with = "repositories")]
        repo_names: Vec<String>,

        /// Ad-hoc repository URLs, in order
        #[arg(short = 'r', long, value_name = "URL", num_args = 1..)]
        repositories: Vec<String>,

        #[arg(long, conflicts_with = "force_binary")]
        sources_only: bool,

        #[arg(long)]
        force_binary: bool,

        #[arg(long)]
        javadoc: bool,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Search Maven Central
    Search {
        query: String,

        #[arg(short = 'n', long, value_name = "N", default_value_t = 10)]
        max_results: usize,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List versions of group:artifact, newest first
    Versions {
        coordinate: String,

        #[arg(long, value_name = "NAMES", value_delimiter = ',')]
        repo_names: Vec<String>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Report which repositories host an artifact's binary JAR
    Check {
        coordinate: String,

        #[arg(long, value_name = "NAMES", value_delimiter = ',')]
        repo_names: Vec<String>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Decompile a local JAR
    Decompile {
        jar_path: PathBuf,

        #[arg(short = 'o', long, value_name = "DIR", default_value = "decompiled")]
        output_dir: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Manage configured repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },
    /// Run the MCP server
    Mcp {
        /// Serve on stdin/stdout instead of HTTP
        #[arg(long)]
        stdio: bool,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RepoCommands {
    List {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    Add {
        name: String,
        url: String,
    },
    Remove {
        name: String,
    },
    /// Restore the default repositories
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
