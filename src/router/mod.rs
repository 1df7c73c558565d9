//! Request routing: map method + path patterns to handlers.
//!
//! | Pattern                          | Example match                          | Captured params        |
//! |----------------------------------|----------------------------------------|------------------------|
//! | `/api/fonts/local`               | `/api/fonts/local`                     | *(none)*               |
//! | `/api/fonts/google/family/:name` | `/api/fonts/google/family/Open%20Sans` | `name → "Open Sans"`   |
//!
//! Trailing slashes are ignored on both sides. Routes are tried in
//! registration order and the first one whose method and pattern match wins.
//! A path that matches some route under a different method gets `405`; a path
//! that matches nothing gets `404`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde_json::json;

use crate::context::{Context, PathParams};
use crate::http::{Method, Request, Response, StatusCode};
use crate::middleware::{Middleware, MiddlewareHandler, Next, from_middleware};

/// Boxed response future shared by handlers and middleware.
pub type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Type-erased async route handler.
pub type Handler = Arc<dyn Fn(Context) -> ResponseFuture + Send + Sync + 'static>;

/// Any `Fn(Context) -> impl Future<Output = Response>` usable as a route.
pub trait IntoHandler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> ResponseFuture;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> ResponseFuture {
        Box::pin((self)(ctx))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Static(String),
    Param(String),
}

/// Compiled route pattern: one entry per `/`-separated segment.
#[derive(Debug, Clone)]
struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Static(s.to_owned()),
            })
            .collect();
        Self { segments }
    }

    fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(s) if s == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    let value = percent_decode_str(part).decode_utf8().ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }
        Some(params)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

struct Route {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

/// Dispatches requests to registered handlers through the middleware chain.
///
/// # Examples
///
/// ```rust,no_run
/// use fontdeck::context::Context;
/// use fontdeck::router::Router;
/// use fontdeck::http::{Response, StatusCode};
/// use fontdeck::middleware::RequestLogger;
///
/// let mut router = Router::new();
/// router.layer(RequestLogger);
/// router.get("/health", |_ctx| async { Response::new(StatusCode::Ok) });
/// router.get("/api/fonts/google/family/:family", |ctx: Context| async move {
///     let family = ctx.param("family").unwrap_or_default().to_owned();
///     Response::new(StatusCode::Ok).body(family)
/// });
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    layers: Vec<MiddlewareHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Appends a middleware layer. The first layer added is the outermost.
    pub fn layer<M: Middleware + 'static>(&mut self, middleware: M) {
        self.layers.push(from_middleware(Arc::new(middleware)));
    }

    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx: Context| handler.call(ctx));
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(path),
            handler,
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freezes the router into a cheaply cloneable dispatcher.
    pub fn into_service(self) -> RouterService {
        RouterService {
            routes: Arc::from(self.routes),
            layers: Arc::from(self.layers),
        }
    }
}

/// Immutable, shareable form of a [`Router`].
#[derive(Clone)]
pub struct RouterService {
    routes: Arc<[Route]>,
    layers: Arc<[MiddlewareHandler]>,
}

impl RouterService {
    /// Runs `request` through the middleware chain into the matching route.
    pub async fn route(&self, request: Request) -> Response {
        let (endpoint, params) = self.resolve(request.method(), request.path());
        let ctx = Context::with_params(request, params);
        Next::new(Arc::clone(&self.layers), endpoint).run(ctx).await
    }

    fn resolve(&self, method: &Method, path: &str) -> (Handler, PathParams) {
        let mut path_known = false;

        for route in self.routes.iter() {
            if let Some(params) = route.pattern.matches(path) {
                if &route.method == method {
                    return (Arc::clone(&route.handler), params);
                }
                path_known = true;
            }
        }

        let fallback: Handler = if path_known {
            Arc::new(|_ctx: Context| error_future(StatusCode::MethodNotAllowed, "Method not allowed"))
        } else {
            Arc::new(|_ctx: Context| error_future(StatusCode::NotFound, "Not found"))
        };
        (fallback, PathParams::new())
    }
}

fn error_future(status: StatusCode, message: &'static str) -> ResponseFuture {
    Box::pin(async move { Response::json(status, &json!({ "error": message })) })
}
