use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use super::model::{FontOrigin, FontRecord, Listing, SortMode, TaggedFont};
use super::query::{FilterCriteria, Page, PageRequest, filter, paginate};
use super::upstream::{FontSource, UpstreamError};
use crate::cache::{Clock, SystemClock, TtlCache};

/// How long a fetched listing is served before it is fetched again.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Google records included in the combined view.
pub const COMBINED_GOOGLE_LIMIT: usize = 150;

/// Cloneable so that one failed fetch can be handed to every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("GOOGLE_FONTS_API_KEY not set in backend")]
    MissingConfiguration,

    #[error("font listing unavailable")]
    UpstreamUnavailable(#[source] Arc<UpstreamError>),

    #[error("family '{family}' not found")]
    NotFound { family: String },
}

impl From<UpstreamError> for CatalogError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::MissingApiKey => Self::MissingConfiguration,
            other => Self::UpstreamUnavailable(Arc::new(other)),
        }
    }
}

/// `{ total, items }` view over a whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection<T> {
    pub total: usize,
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// The catalog pipeline: cached upstream listings plus the local record set.
///
/// One instance per process, shared by the route handlers behind an `Arc`.
pub struct CatalogService {
    source: Arc<dyn FontSource>,
    listings: TtlCache<SortMode, Listing, CatalogError>,
    local: Arc<Vec<FontRecord>>,
}

impl CatalogService {
    pub fn new(source: Arc<dyn FontSource>, ttl: Duration, local: Vec<FontRecord>) -> Self {
        Self::with_clock(source, ttl, local, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn FontSource>,
        ttl: Duration,
        local: Vec<FontRecord>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            ttl_secs = ttl.as_secs(),
            local_fonts = local.len(),
            "catalog ready"
        );
        Self {
            source,
            listings: TtlCache::with_clock(ttl, clock),
            local: Arc::new(local),
        }
    }

    /// Full listing for `sort`, from cache while fresh, otherwise upstream.
    pub async fn listing(&self, sort: SortMode) -> Result<Listing, CatalogError> {
        if !self.source.is_configured() {
            return Err(CatalogError::MissingConfiguration);
        }

        let source = Arc::clone(&self.source);
        self.listings
            .get_or_try_insert_with(sort, || async move {
                match source.fetch_listing(sort).await {
                    Ok(records) => {
                        info!(%sort, families = records.len(), "font listing cached");
                        Ok(Arc::new(records))
                    }
                    Err(err) => {
                        error!(%sort, error = %err, "font listing fetch failed");
                        Err(CatalogError::from(err))
                    }
                }
            })
            .await
    }

    /// Filters then paginates the listing for `sort`.
    pub async fn search(
        &self,
        sort: SortMode,
        criteria: &FilterCriteria,
        page: PageRequest,
    ) -> Result<Page<FontRecord>, CatalogError> {
        let listing = self.listing(sort).await?;
        let matched = filter(&listing, criteria);
        Ok(paginate(matched, page).map(FontRecord::clone))
    }

    /// Record whose family equals `family` ignoring case.
    pub async fn lookup_family(
        &self,
        sort: SortMode,
        family: &str,
    ) -> Result<FontRecord, CatalogError> {
        let listing = self.listing(sort).await?;
        let wanted = family.to_lowercase();
        listing
            .iter()
            .find(|r| r.family.to_lowercase() == wanted)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                family: family.to_owned(),
            })
    }

    pub fn local(&self) -> Arc<Vec<FontRecord>> {
        Arc::clone(&self.local)
    }

    /// Local records followed by the head of the popularity listing.
    /// Families present in both appear twice.
    pub async fn combined(&self) -> Result<Collection<TaggedFont>, CatalogError> {
        let google = self.listing(SortMode::Popularity).await?;
        let local = self.local();

        let items = local
            .iter()
            .map(|r| r.tagged(FontOrigin::Local))
            .chain(
                google
                    .iter()
                    .take(COMBINED_GOOGLE_LIMIT)
                    .map(|r| r.tagged(FontOrigin::Google)),
            )
            .collect::<Vec<_>>();
        Ok(Collection::from(items))
    }
}
