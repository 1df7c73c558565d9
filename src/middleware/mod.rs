//! Middleware pipeline run around every routed request.
//!
//! - [`Middleware`]: trait implemented by every layer.
//! - [`Next`]: cursor into the rest of the chain; the last step is the
//!   matched route handler.
//! - [`RequestLogger`]: one `tracing` event per request.
//! - [`Cors`]: cross-origin headers and preflight answers.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    context::Context,
    http::Response,
    router::{Handler, ResponseFuture},
};

mod cors;

pub use cors::Cors;

/// Type-erased middleware function, cheap to clone.
pub type MiddlewareHandler = Arc<dyn Fn(Context, Next) -> ResponseFuture + Send + Sync + 'static>;

/// Wraps a [`Middleware`] into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// The remainder of the chain for one request.
///
/// Consumed by [`Next::run`], so a layer can forward at most once.
pub struct Next {
    chain: Arc<[MiddlewareHandler]>,
    index: usize,
    endpoint: Handler,
}

impl Next {
    pub fn new(chain: Arc<[MiddlewareHandler]>, endpoint: Handler) -> Self {
        Self {
            chain,
            index: 0,
            endpoint,
        }
    }

    /// Runs the next layer, or the endpoint once every layer has run.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(layer) => {
                self.index += 1;
                layer(ctx, self).await
            }
            None => (self.endpoint)(ctx).await,
        }
    }
}

/// A layer around the rest of the chain. It may answer the request itself
/// instead of calling [`Next::run`].
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: Context, next: Next) -> ResponseFuture;
}

/// Logs method, path, status and latency once the response is ready.
///
/// Server errors are logged at `warn`, everything else at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn handle(&self, ctx: Context, next: Next) -> ResponseFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().to_string();
            let path = ctx.request().path().to_owned();

            let response = next.run(ctx).await;

            let status = response.status().as_u16();
            let elapsed = start.elapsed();
            if response.status().is_server_error() {
                warn!(%method, %path, status, ?elapsed, "request failed");
            } else {
                info!(%method, %path, status, ?elapsed, "request served");
            }

            response
        })
    }
}
