//! HTTP service for taskgraph.
//!
//! Answers circular dependency checks and graph queries over task snapshots.
//! The request handling in [`api`] and the path routing in [`router`] know
//! nothing about sockets; [`server`] adapts them to `tiny_http`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskgraph::snapshot::FileSnapshotSource;
//! use taskgraph_server::TaskgraphServer;
//!
//! # async fn run() -> Result<(), taskgraph_server::Error> {
//! let source = Arc::new(FileSnapshotSource::new("tasks.jsonl"));
//! let server = TaskgraphServer::bind("127.0.0.1:8080", source, 64 * 1024)?;
//! server.run(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod error;
pub mod router;
pub mod server;

pub use error::{Error, Result};
pub use router::{Reply, dispatch};
pub use server::TaskgraphServer;
