//! HTTP surface of the catalog.
//!
//! | Route                                 | Handler                         |
//! |---------------------------------------|---------------------------------|
//! | `GET /api/fonts/google`               | [`handlers::google_fonts`]      |
//! | `GET /api/fonts/google/family/:family`| [`handlers::google_family`]     |
//! | `GET /api/fonts/google/css2`          | [`handlers::css2_url`]          |
//! | `GET /api/fonts/local`                | [`handlers::local_fonts`]       |
//! | `GET /api/fonts/combined`             | [`handlers::combined_fonts`]    |
//! | `GET /health`                         | [`handlers::health`]            |

use std::future::Future;
use std::sync::Arc;

mod error;
pub mod handlers;

pub use error::ApiError;

use crate::catalog::CatalogService;
use crate::context::Context;
use crate::http::Response;
use crate::middleware::{Cors, RequestLogger};
use crate::router::{IntoHandler, Router};

/// Mount point of the catalog routes.
pub const API_PREFIX: &str = "/api/fonts";

/// Builds the full router: request logging outermost, then CORS, then routes.
pub fn router(catalog: Arc<CatalogService>, cors: Cors) -> Router {
    let mut router = Router::new();
    router.layer(RequestLogger);
    router.layer(cors);

    router.get("/health", endpoint(&catalog, handlers::health));
    router.get(
        &format!("{API_PREFIX}/google"),
        endpoint(&catalog, handlers::google_fonts),
    );
    router.get(
        &format!("{API_PREFIX}/google/css2"),
        endpoint(&catalog, handlers::css2_url),
    );
    router.get(
        &format!("{API_PREFIX}/google/family/:family"),
        endpoint(&catalog, handlers::google_family),
    );
    router.get(
        &format!("{API_PREFIX}/local"),
        endpoint(&catalog, handlers::local_fonts),
    );
    router.get(
        &format!("{API_PREFIX}/combined"),
        endpoint(&catalog, handlers::combined_fonts),
    );
    router
}

/// Adapts a fallible catalog handler into a route handler.
fn endpoint<F, Fut>(catalog: &Arc<CatalogService>, handler: F) -> impl IntoHandler
where
    F: Fn(Arc<CatalogService>, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    let catalog = Arc::clone(catalog);
    move |ctx: Context| {
        let pending = handler(Arc::clone(&catalog), ctx);
        async move { pending.await.unwrap_or_else(ApiError::into_response) }
    }
}
