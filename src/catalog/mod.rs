//! The font catalog: upstream listings, their cache, and the views derived
//! from them.
//!
//! - [`CatalogService`]: cached listing per [`SortMode`], filtered pages,
//!   single-family lookup, local and combined views.
//! - [`GoogleFontsClient`]: the upstream [`FontSource`].
//! - [`build_css2_url`]: stylesheet URL for a family and weight set.

mod css;
mod local;
mod model;
mod query;
mod service;
mod upstream;

pub use css::{CSS2_BASE_URL, CssUrlError, build_css2_url};
pub use local::{LocalFontsError, load_local_fonts};
pub use model::{
    FontOrigin, FontRecord, FontSummary, Listing, SortMode, TaggedFields, TaggedFont, UnknownSortMode,
};
pub use query::{
    DEFAULT_PAGE_SIZE, FilterCriteria, MAX_PAGE_SIZE, Page, PageRequest, filter, paginate,
};
pub use service::{COMBINED_GOOGLE_LIMIT, CatalogError, CatalogService, Collection, DEFAULT_CACHE_TTL};
pub use upstream::{
    BoxFuture, DEFAULT_API_URL, DEFAULT_TIMEOUT, FontSource, GoogleFontsClient, UpstreamError,
};
