//! Taskgraph HTTP service binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taskgraph::config::{CONFIG_FILE_NAME, TaskgraphConfig};
use taskgraph::snapshot::FileSnapshotSource;
use taskgraph_server::TaskgraphServer;
use tracing_subscriber::EnvFilter;

/// Taskgraph HTTP service
///
/// Answers circular dependency checks over a task snapshot file.
#[derive(Parser, Debug)]
#[command(name = "taskgraph-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML); defaults apply if it does not exist
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Address to listen on, overrides `server.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Snapshot file, overrides `snapshot.path`
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Request body limit in bytes, overrides `server.max-body-bytes`
    #[arg(long)]
    max_body_bytes: Option<usize>,
}

impl Args {
    async fn resolve_config(&self) -> Result<TaskgraphConfig> {
        let mut config = TaskgraphConfig::load_or_default(&self.config)
            .await
            .with_context(|| format!("Failed to load config {}", self.config.display()))?;

        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot.path.clone_from(snapshot);
        }
        if let Some(limit) = self.max_body_bytes {
            config.server.max_body_bytes = limit;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskgraph=info,taskgraph_server=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting taskgraph-server");

    let args = Args::parse();
    let config = args.resolve_config().await?;

    let source = Arc::new(FileSnapshotSource::new(&config.snapshot.path));
    let server =
        TaskgraphServer::bind(&config.server.bind, source, config.server.max_body_bytes)?;

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("taskgraph-server stopped");
    Ok(())
}
