//! # jar-fetch
//!
//! Downloads Java sources from Maven repositories, falling back to CFR
//! decompilation when only a binary JAR is published.
//!
//! ## Architecture
//!
//! - **coordinate**: Maven coordinate parsing and repository/local layout paths
//! - **config**: Persistent configuration file and path resolution
//! - **registry**: Ordered, named repository list with add/remove/reset
//! - **transport**: HTTP probe/fetch behind a trait
//! - **downloader**: Atomic file writes with size and SHA-256 reporting
//! - **resolver**: Sequential repository fallback (sources first, then binary)
//! - **metadata**: Version listing from `maven-metadata.xml` and Maven Central search
//! - **cfr**: CFR decompiler integration and sources JAR packaging
//! - **service**: Operations shared by the CLI and the MCP server
//! - **stats**: File counts and size of a download directory
//! - **logging**: tracing subscriber setup
//! - **mcp**: Model Context Protocol server over stdio or HTTP

pub mod cfr;
pub mod cli;
pub mod config;
pub mod coordinate;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod metadata;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod stats;
pub mod transport;

pub use error::{Error, Result};
