//! Shared plumbing for the `vaultdb-index` and `vaultdb-search` binaries.
use tracing_subscriber::EnvFilter;

use vaultdb_core::config::{Config, Settings};

/// Log to stderr, `warn` and above unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

/// Print `Exiting...` and leave with status 0 on Ctrl-C. The handler runs on
/// its own thread so a blocking stdin read does not hold it up.
pub fn exit_on_interrupt() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    std::thread::Builder::new().name("interrupt".into()).spawn(move || {
        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    println!("\n{}", vaultdb_pipeline::repl::EXITING);
                    std::process::exit(0);
                }
                Err(e) => tracing::warn!(error = %e, "could not listen for Ctrl-C"),
            }
        })
    })?;
    Ok(())
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    Ok(config.settings()?)
}

/// What `vaultdb-search` was asked to do, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    Interactive,
    ListFiles,
    FilePattern(String),
    Directory { directory: String, query: String },
    Query(String),
    Help,
}

impl SearchMode {
    pub fn select(
        interactive: bool,
        list_files: bool,
        file_pattern: Option<&str>,
        directory: Option<&str>,
        query: Option<&str>,
    ) -> Self {
        if interactive {
            Self::Interactive
        } else if list_files {
            Self::ListFiles
        } else if let Some(pattern) = file_pattern {
            Self::FilePattern(pattern.to_string())
        } else if let Some(directory) = directory {
            Self::Directory { directory: directory.to_string(), query: query.unwrap_or_default().to_string() }
        } else if let Some(query) = query {
            Self::Query(query.to_string())
        } else {
            Self::Help
        }
    }
}
