//! # fontdeck
//!
//! Backend of a font-discovery app: an HTTP/1.1 JSON service that caches the
//! Google Fonts catalog per sort mode and serves filtered, paginated and
//! derived views of it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use fontdeck::api;
//! use fontdeck::catalog::{CatalogService, GoogleFontsClient, DEFAULT_API_URL};
//! use fontdeck::middleware::Cors;
//! use fontdeck::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GoogleFontsClient::new(
//!         DEFAULT_API_URL,
//!         std::env::var("GOOGLE_FONTS_API_KEY").ok(),
//!         Duration::from_secs(15),
//!     )?;
//!     let catalog = Arc::new(CatalogService::new(
//!         Arc::new(client),
//!         Duration::from_secs(12 * 60 * 60),
//!         Vec::new(),
//!     ));
//!
//!     let server = Server::bind("127.0.0.1:5000").await?;
//!     server.run(api::router(catalog, Cors::permissive()).into_service()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

pub use http::{Headers, Method, Request, Response, StatusCode};
pub use server::{Server, ServerError};
