//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and feeds HTTP/1.1 requests into a
//! [`RouterService`]. Connections are persistent unless the client asks
//! otherwise.

use std::future::Future;
use std::net::SocketAddr;

use bytes::BytesMut;
use serde_json::json;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};
use crate::router::RouterService;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Largest request, head and body together, buffered before answering `413`.
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

const INITIAL_BUF_SIZE: usize = 4096;

/// The fontdeck HTTP server.
///
/// # Examples
///
/// ```rust,no_run
/// use fontdeck::router::Router;
/// use fontdeck::server::Server;
/// use fontdeck::http::{Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut router = Router::new();
///     router.get("/health", |_ctx| async { Response::new(StatusCode::Ok) });
///
///     let server = Server::bind("127.0.0.1:5000").await?;
///     server.run_until(router.into_service(), async {
///         let _ = tokio::signal::ctrl_c().await;
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until the process is terminated.
    pub async fn run(self, service: RouterService) -> Result<(), ServerError> {
        self.run_until(service, std::future::pending::<()>()).await
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep running on their own tasks; only the
    /// accept loop stops.
    pub async fn run_until<S>(self, service: RouterService, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        info!(address = %self.local_addr, "fontdeck listening");
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                () = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let service = service.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, service).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    Response::json(status, &json!({ "error": message })).keep_alive(false)
}

/// Serves one connection, one request per loop iteration, until the peer
/// closes it or a response carries `Connection: close`.
///
/// Buffered bytes are parsed before the socket is read again, so pipelined
/// requests that arrived in a single segment are all answered.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    service: RouterService,
) -> Result<(), std::io::Error> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        let parsed = if buf.is_empty() {
            Err(RequestError::Incomplete)
        } else {
            Request::parse(&buf)
        };

        let (request, body_offset) = match parsed {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                if buf.len() > MAX_REQUEST_SIZE {
                    warn!(peer = %peer_addr, size = buf.len(), "request too large, sending 413");
                    let response =
                        error_response(StatusCode::PayloadTooLarge, "Request entity too large");
                    stream.write_all(&response.into_bytes()).await?;
                    break;
                }
                if !read_more(&mut stream, &mut buf).await? {
                    debug!(peer = %peer_addr, "connection closed by peer");
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request, sending 400");
                let response = error_response(StatusCode::BadRequest, "Bad request");
                stream.write_all(&response.into_bytes()).await?;
                break;
            }
        };

        // Content-Length validity was checked by the parser.
        let content_length = request.content_length().ok().flatten().unwrap_or(0);
        let total_needed = body_offset + content_length;
        if total_needed > MAX_REQUEST_SIZE {
            warn!(peer = %peer_addr, content_length, "declared body too large, sending 413");
            let response = error_response(StatusCode::PayloadTooLarge, "Request entity too large");
            stream.write_all(&response.into_bytes()).await?;
            break;
        }
        if buf.len() < total_needed {
            if !read_more(&mut stream, &mut buf).await? {
                debug!(peer = %peer_addr, "connection closed mid-body");
                break;
            }
            continue;
        }

        let keep_alive = request.is_keep_alive();
        let response = service.route(request).await.keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close, shutting down");
            break;
        }
    }

    Ok(())
}

/// Appends whatever the peer sent next; `false` once it has closed.
async fn read_more(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<bool, std::io::Error> {
    Ok(stream.read_buf(buf).await? != 0)
}
