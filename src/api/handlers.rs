//! Route handlers for the catalog endpoints.

use std::sync::Arc;

use serde_json::json;

use super::error::ApiError;
use crate::catalog::{
    CatalogService, Collection, FilterCriteria, FontRecord, FontSummary, Page, PageRequest,
    SortMode, build_css2_url,
};
use crate::context::Context;
use crate::http::{Response, StatusCode};

const LIST_FAILED: &str = "Failed to fetch Google Fonts list";
const FAMILY_FAILED: &str = "Failed to fetch family details";
const COMBINED_FAILED: &str = "Failed to fetch combined fonts";

type ApiResult = Result<Response, ApiError>;

fn sort_mode(ctx: &Context) -> Result<SortMode, ApiError> {
    Ok(ctx
        .query("sort")
        .map(str::parse::<SortMode>)
        .transpose()?
        .unwrap_or_default())
}

/// `GET /api/fonts/google`
pub async fn google_fonts(catalog: Arc<CatalogService>, ctx: Context) -> ApiResult {
    let sort = sort_mode(&ctx)?;
    let criteria = FilterCriteria::from_params(
        ctx.query("categories"),
        ctx.query("subset"),
        ctx.query("search"),
        ctx.query("variant"),
    );
    let page = PageRequest::parse(ctx.query("page"), ctx.query("pageSize"));

    let result = catalog
        .search(sort, &criteria, page)
        .await
        .map_err(|e| ApiError::catalog(e, LIST_FAILED))?;

    let summaries: Page<FontSummary<'_>> = Page {
        total: result.total,
        page: result.page,
        page_size: result.page_size,
        items: result.items.iter().map(FontRecord::summary).collect(),
    };
    Ok(Response::json(StatusCode::Ok, &summaries))
}

/// `GET /api/fonts/google/family/:family`
pub async fn google_family(catalog: Arc<CatalogService>, ctx: Context) -> ApiResult {
    let sort = sort_mode(&ctx)?;
    let family = ctx.param("family").unwrap_or_default();

    let record = catalog
        .lookup_family(sort, family)
        .await
        .map_err(|e| ApiError::catalog(e, FAMILY_FAILED))?;
    Ok(Response::json(StatusCode::Ok, &record))
}

/// `GET /api/fonts/google/css2`
pub async fn css2_url(_catalog: Arc<CatalogService>, ctx: Context) -> ApiResult {
    let url = build_css2_url(
        ctx.query("family").unwrap_or_default(),
        ctx.query("weights"),
        ctx.query("ital"),
        ctx.query("display"),
    )?;
    Ok(Response::json(StatusCode::Ok, &json!({ "cssUrl": url })))
}

/// `GET /api/fonts/local`
pub async fn local_fonts(catalog: Arc<CatalogService>, _ctx: Context) -> ApiResult {
    let local = catalog.local();
    let collection = Collection::from(local.iter().collect::<Vec<_>>());
    Ok(Response::json(StatusCode::Ok, &collection))
}

/// `GET /api/fonts/combined`
pub async fn combined_fonts(catalog: Arc<CatalogService>, _ctx: Context) -> ApiResult {
    let combined = catalog
        .combined()
        .await
        .map_err(|e| ApiError::catalog(e, COMBINED_FAILED))?;
    Ok(Response::json(StatusCode::Ok, &combined))
}

/// `GET /health`
pub async fn health(_catalog: Arc<CatalogService>, _ctx: Context) -> ApiResult {
    Ok(Response::json(StatusCode::Ok, &json!({ "status": "ok" })))
}
