use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Error, Result};

/// Installs the global subscriber. Logs go to stderr so stdout stays clean
/// for command output and the MCP stdio protocol; `log_file` additionally
/// receives an uncoloured copy.
///
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    // A second init (embedding) keeps the first subscriber.
    let _ = subscriber(verbose, log_file)?.try_init();
    Ok(())
}

fn subscriber(verbose: bool, log_file: Option<&Path>) -> Result<impl Subscriber + Send + Sync + 'static> {
    let default_level = if verbose { "jar_fetch=debug" } else { "jar_fetch=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::io(path, e))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer))
}
