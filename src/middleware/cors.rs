//! Cross-Origin Resource Sharing for the browser client.

use std::sync::Arc;

use super::{Middleware, Next};
use crate::{
    context::Context,
    http::{Method, Response, StatusCode},
    router::ResponseFuture,
};

/// Adds `Access-Control-*` headers and answers preflight requests.
///
/// - No `Origin` header, or an origin outside the allow-list: the request
///   passes through untouched.
/// - `OPTIONS` from an allowed origin: answered here with `204`, the route is
///   never reached.
/// - Anything else from an allowed origin: the route runs and the headers are
///   added to its response. `Vary: Origin` is set unless the policy is `*`.
///
/// # Examples
///
/// ```rust
/// use fontdeck::middleware::Cors;
///
/// let permissive = Cors::permissive();
/// let strict = Cors::for_origins(["http://localhost:5173"]);
/// ```
#[derive(Debug, Clone)]
pub struct Cors {
    inner: Arc<Policy>,
}

#[derive(Debug)]
struct Policy {
    origins: Vec<String>,
    methods: String,
    headers: String,
    max_age_secs: u32,
}

impl Cors {
    /// Any origin, the methods the catalog serves.
    pub fn permissive() -> Self {
        Self::for_origins(["*"])
    }

    pub fn for_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(Policy {
                origins: origins.into_iter().map(Into::into).collect(),
                methods: "GET, OPTIONS".to_owned(),
                headers: "Content-Type, Authorization".to_owned(),
                max_age_secs: 3600,
            }),
        }
    }

    fn allow_origin(&self, origin: &str) -> Option<String> {
        if self.inner.origins.iter().any(|o| o == "*") {
            Some("*".to_owned())
        } else if self.inner.origins.iter().any(|o| o == origin) {
            Some(origin.to_owned())
        } else {
            None
        }
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self::permissive()
    }
}

impl Middleware for Cors {
    fn handle(&self, ctx: Context, next: Next) -> ResponseFuture {
        let policy = Arc::clone(&self.inner);
        let allowed = ctx
            .request()
            .headers()
            .get("origin")
            .and_then(|origin| self.allow_origin(origin));

        Box::pin(async move {
            let Some(allow_origin) = allowed else {
                return next.run(ctx).await;
            };

            let mut response = if ctx.request().method() == &Method::Options {
                Response::new(StatusCode::NoContent)
                    .header("Access-Control-Allow-Headers", policy.headers.as_str())
                    .header("Access-Control-Max-Age", policy.max_age_secs.to_string())
            } else {
                next.run(ctx).await
            };

            if allow_origin != "*" {
                response.set_header("Vary", "Origin");
            }
            response.set_header("Access-Control-Allow-Origin", allow_origin);
            response.set_header("Access-Control-Allow-Methods", policy.methods.as_str());
            response
        })
    }
}
