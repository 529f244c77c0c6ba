//! tiny_http adapter.
//!
//! The listener is polled from a blocking thread with a short receive
//! timeout so the loop can notice shutdown. Every accepted request gets its
//! own tokio task, which reads the body, routes it, and writes the response.
//! Shutdown stops accepting and then waits for those tasks.
//! Handlers share nothing but the read-only snapshot source.

use std::future::Future;
use std::io::{self, Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use taskgraph::snapshot::SnapshotSource;
use tokio::task::{JoinError, JoinSet};
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

use crate::api::ApiError;
use crate::error::{Error, Result};
use crate::router::{self, Reply};

/// How long one blocking receive waits before checking for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// HTTP listener serving the taskgraph API.
pub struct TaskgraphServer {
    listener: Arc<Server>,
    source: Arc<dyn SnapshotSource>,
    max_body_bytes: usize,
}

impl std::fmt::Debug for TaskgraphServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskgraphServer")
            .field("addr", &self.local_addr())
            .field("source", &self.source.describe())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl TaskgraphServer {
    /// Bind a listener. Port `0` picks a free port; see
    /// [`TaskgraphServer::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Bind` if the address cannot be bound.
    pub fn bind(
        addr: &str,
        source: Arc<dyn SnapshotSource>,
        max_body_bytes: usize,
    ) -> Result<Self> {
        let listener = Server::http(addr).map_err(|e| Error::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            listener: Arc::new(listener),
            source,
            max_body_bytes,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.server_addr().to_ip()
    }

    /// Serve requests until `shutdown` completes.
    ///
    /// Once `shutdown` fires no new requests are accepted, but requests
    /// already accepted are answered before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            addr = ?self.local_addr(),
            source = %self.source.describe(),
            "Serving taskgraph API"
        );
        tokio::pin!(shutdown);
        let mut in_flight = JoinSet::new();

        loop {
            while let Some(finished) = in_flight.try_join_next() {
                log_join_failure(finished);
            }

            let listener = Arc::clone(&self.listener);
            let next = tokio::task::spawn_blocking(move || listener.recv_timeout(POLL_INTERVAL));

            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }
                received = next => match received.map_err(io::Error::other)? {
                    Ok(Some(request)) => {
                        in_flight.spawn(handle_request(
                            Arc::clone(&self.source),
                            self.max_body_bytes,
                            request,
                        ));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(error = %e, "Listener failed");
                        return Err(e.into());
                    }
                },
            }
        }

        self.listener.unblock();

        if !in_flight.is_empty() {
            info!(requests = in_flight.len(), "Waiting for in-flight requests");
        }
        while let Some(finished) = in_flight.join_next().await {
            log_join_failure(finished);
        }
        Ok(())
    }
}

fn log_join_failure(finished: std::result::Result<(), JoinError>) {
    if let Err(e) = finished {
        error!(error = %e, "Request task failed");
    }
}

async fn handle_request(source: Arc<dyn SnapshotSource>, max_body_bytes: usize, request: Request) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();

    let read = tokio::task::spawn_blocking(move || {
        let mut request = request;
        let body = read_body(&mut request, max_body_bytes);
        (request, body)
    })
    .await;
    let (request, body) = match read {
        Ok(pair) => pair,
        Err(e) => {
            error!(%method, path = %url, error = %e, "Request task failed");
            return;
        }
    };

    let reply = match body {
        Ok(body) => router::dispatch(source.as_ref(), &method, &url, &body).await,
        Err(e) => {
            warn!(%method, path = %url, error = %e, "Rejected request body");
            Reply::error(&e)
        }
    };
    let status = reply.status;
    let response = into_response(&reply);

    match tokio::task::spawn_blocking(move || request.respond(response)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(%method, path = %url, error = %e, "Client went away"),
        Err(e) => error!(%method, path = %url, error = %e, "Response task failed"),
    }

    info!(%method, path = %url, status, elapsed = ?started.elapsed(), "Handled request");
}

/// Read the request body, refusing more than `limit` bytes.
fn read_body(request: &mut Request, limit: usize) -> std::result::Result<Vec<u8>, ApiError> {
    let too_large = || ApiError::bad_request(format!("Request body exceeds {limit} bytes"));

    if request.body_length().is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut body = Vec::new();
    request
        .as_reader()
        .take(cap)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;

    if body.len() > limit {
        return Err(too_large());
    }
    Ok(body)
}

fn into_response(reply: &Reply) -> Response<Cursor<Vec<u8>>> {
    let json = serde_json::to_vec(&reply.body).unwrap_or_else(|_| b"{}".to_vec());
    let response = Response::from_data(json).with_status_code(StatusCode(reply.status));

    match Header::from_bytes("Content-Type", "application/json") {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
