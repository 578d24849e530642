use super::handler::handle_mock;
use super::router::route_admin;
use super::state::ServerState;
use super::types::ADMIN_PREFIX;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// HTTP server answering mock requests and the admin API.
pub struct MockServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl MockServer {
    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, state: Arc<ServerState>) -> Self {
        Self { listener, state }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.listener.local_addr()?;
        info!(
            directory = %self.state.directory().display(),
            endpoints = self.state.snapshot().len(),
            "mockdir listening on http://{}",
            addr
        );
        info!("Admin API available at http://{}{}", addr, ADMIN_PREFIX);

        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { handle_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error: {}", e);
                }
            });
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    if path == ADMIN_PREFIX || path.starts_with(&format!("{ADMIN_PREFIX}/")) {
        let method = req.method().clone();
        return Ok(route_admin(&method, &path, state).await);
    }
    Ok(handle_mock(req, state).await)
}
