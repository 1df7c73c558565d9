//! End-to-end route behaviour against a stub upstream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use fontdeck::api;
use fontdeck::catalog::{
    BoxFuture, CatalogService, FontRecord, FontSource, SortMode, UpstreamError,
};
use fontdeck::http::{Request, StatusCode};
use fontdeck::middleware::Cors;
use fontdeck::router::RouterService;

struct StubUpstream {
    records: Vec<FontRecord>,
    calls: AtomicUsize,
    down: AtomicBool,
    has_key: bool,
}

impl StubUpstream {
    fn new(records: Vec<FontRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            calls: AtomicUsize::new(0),
            down: AtomicBool::new(false),
            has_key: true,
        })
    }
}

impl FontSource for StubUpstream {
    fn fetch_listing(&self, sort: SortMode) -> BoxFuture<'_, Result<Vec<FontRecord>, UpstreamError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if self.down.load(Ordering::SeqCst) {
                return Err(UpstreamError::Status { status: 503 });
            }
            let mut records = self.records.clone();
            if sort == SortMode::Alpha {
                records.sort_by(|a, b| a.family.cmp(&b.family));
            }
            Ok(records)
        })
    }

    fn is_configured(&self) -> bool {
        self.has_key
    }
}

fn font(family: &str, category: &str, subsets: &[&str], variants: &[&str]) -> FontRecord {
    serde_json::from_value(json!({
        "kind": "webfonts#webfont",
        "family": family,
        "category": category,
        "variants": variants,
        "subsets": subsets,
        "version": "v1",
        "lastModified": "2024-01-01",
        "files": { "regular": format!("https://fonts.gstatic.com/{family}.ttf") },
        "menu": format!("https://fonts.gstatic.com/{family}-menu.ttf"),
    }))
    .unwrap()
}

fn catalog_fonts() -> Vec<FontRecord> {
    vec![
        font("Roboto", "sans-serif", &["latin", "cyrillic"], &["regular", "700"]),
        font("Lora", "serif", &["latin"], &["regular", "italic"]),
        font("Roboto Slab", "serif", &["latin", "greek"], &["regular", "700"]),
        font("Open Sans", "sans-serif", &["latin"], &["regular"]),
    ]
}

fn app(upstream: Arc<StubUpstream>, local: Vec<FontRecord>) -> RouterService {
    let catalog = Arc::new(CatalogService::new(
        upstream,
        Duration::from_secs(12 * 60 * 60),
        local,
    ));
    api::router(catalog, Cors::permissive()).into_service()
}

async fn get(service: &RouterService, target: &str) -> (StatusCode, Value) {
    let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    let (request, _) = Request::parse(raw.as_bytes()).unwrap();
    let response = service.route(request).await;
    let body = serde_json::from_slice(response.body_slice()).unwrap_or(Value::Null);
    (response.status(), body)
}

fn families(body: &Value) -> Vec<&str> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["family"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn listing_defaults_and_projection() {
    let service = app(StubUpstream::new(catalog_fonts()), vec![]);
    let (status, body) = get(&service, "/api/fonts/google").await;

    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["total"], 4);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 40);
    assert_eq!(families(&body), ["Roboto", "Lora", "Roboto Slab", "Open Sans"]);

    let first = &body["items"][0];
    assert_eq!(first["lastModified"], "2024-01-01");
    assert!(first.get("menu").is_none());
    assert!(first.get("kind").is_none());
}

#[tokio::test]
async fn listing_filters_conjunctively() {
    let service = app(StubUpstream::new(catalog_fonts()), vec![]);
    let (_, body) = get(
        &service,
        "/api/fonts/google?categories=serif&subset=latin&search=ro",
    )
    .await;
    assert_eq!(families(&body), ["Roboto Slab"]);

    let (_, body) = get(&service, "/api/fonts/google?categories=SERIF,sans-serif&variant=700").await;
    assert_eq!(families(&body), ["Roboto", "Roboto Slab"]);
}

#[tokio::test]
async fn listing_search_is_form_decoded() {
    let service = app(StubUpstream::new(catalog_fonts()), vec![]);
    for target in ["/api/fonts/google?search=open+sans", "/api/fonts/google?search=Open%20Sans"] {
        let (_, body) = get(&service, target).await;
        assert_eq!(families(&body), ["Open Sans"], "{target}");
    }
}

#[tokio::test]
async fn listing_paginates_and_clamps() {
    let service = app(StubUpstream::new(catalog_fonts()), vec![]);

    let (_, body) = get(&service, "/api/fonts/google?page=2&pageSize=3").await;
    assert_eq!(body["total"], 4);
    assert_eq!(families(&body), ["Open Sans"]);

    let (_, body) = get(&service, "/api/fonts/google?page=9&pageSize=3").await;
    assert_eq!(body["total"], 4);
    assert!(families(&body).is_empty());

    let (_, body) = get(&service, "/api/fonts/google?pageSize=500").await;
    assert_eq!(body["pageSize"], 100);

    let (_, body) = get(&service, "/api/fonts/google?page=abc&pageSize=0").await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["pageSize"], 40);
}

#[tokio::test]
async fn listing_is_cached_per_sort_mode() {
    let upstream = StubUpstream::new(catalog_fonts());
    let service = app(upstream.clone(), vec![]);

    get(&service, "/api/fonts/google").await;
    get(&service, "/api/fonts/google?sort=popularity&page=2").await;
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);

    let (_, body) = get(&service, "/api/fonts/google?sort=alpha").await;
    assert_eq!(families(&body), ["Lora", "Open Sans", "Roboto", "Roboto Slab"]);
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_sort_is_rejected() {
    let upstream = StubUpstream::new(catalog_fonts());
    let service = app(upstream.clone(), vec![]);
    let (status, body) = get(&service, "/api/fonts/google?sort=newest").await;

    assert_eq!(status, StatusCode::BadRequest);
    assert!(body["error"].as_str().unwrap().contains("newest"));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_outage_is_500_and_not_cached() {
    let upstream = StubUpstream::new(catalog_fonts());
    upstream.down.store(true, Ordering::SeqCst);
    let service = app(upstream.clone(), vec![]);

    let (status, body) = get(&service, "/api/fonts/google").await;
    assert_eq!(status, StatusCode::InternalServerError);
    assert_eq!(body, json!({ "error": "Failed to fetch Google Fonts list" }));

    let (status, body) = get(&service, "/api/fonts/google/family/Lora").await;
    assert_eq!(status, StatusCode::InternalServerError);
    assert_eq!(body["error"], "Failed to fetch family details");

    upstream.down.store(false, Ordering::SeqCst);
    let (status, _) = get(&service, "/api/fonts/google").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn missing_api_key_is_500() {
    let upstream = Arc::new(StubUpstream {
        records: vec![],
        calls: AtomicUsize::new(0),
        down: AtomicBool::new(false),
        has_key: false,
    });
    let service = app(upstream.clone(), vec![]);

    for target in ["/api/fonts/google", "/api/fonts/combined"] {
        let (status, body) = get(&service, target).await;
        assert_eq!(status, StatusCode::InternalServerError);
        assert_eq!(body["error"], "GOOGLE_FONTS_API_KEY not set in backend");
    }
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn family_lookup() {
    let service = app(StubUpstream::new(catalog_fonts()), vec![]);

    let (status, body) = get(&service, "/api/fonts/google/family/roboto").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["family"], "Roboto");
    assert_eq!(body["menu"], "https://fonts.gstatic.com/Roboto-menu.ttf");

    let (status, body) = get(&service, "/api/fonts/google/family/Roboto%20Slab?sort=alpha").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["family"], "Roboto Slab");

    let (status, body) = get(&service, "/api/fonts/google/family/Robot").await;
    assert_eq!(status, StatusCode::NotFound);
    assert_eq!(body, json!({ "error": "Family not found" }));
}

#[tokio::test]
async fn css2_url() {
    let upstream = StubUpstream::new(vec![]);
    let service = app(upstream.clone(), vec![]);

    let (status, body) = get(
        &service,
        "/api/fonts/google/css2?family=Open+Sans&weights=400,700&ital=0&display=swap",
    )
    .await;
    assert_eq!(status, StatusCode::Ok);
    assert!(
        body["cssUrl"]
            .as_str()
            .unwrap()
            .contains("family=Open+Sans:wght@400;700&display=swap")
    );

    let (_, body) = get(&service, "/api/fonts/google/css2?family=Lora&ital=1").await;
    assert!(body["cssUrl"].as_str().unwrap().contains("ital,wght@1,400"));

    let (status, body) = get(&service, "/api/fonts/google/css2?family=").await;
    assert_eq!(status, StatusCode::BadRequest);
    assert_eq!(body, json!({ "error": "family is required" }));

    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn local_and_combined_views() {
    let local = vec![font("House Grotesk", "sans-serif", &["latin"], &["regular"])];
    let service = app(StubUpstream::new(catalog_fonts()), local);

    let (status, body) = get(&service, "/api/fonts/local").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["total"], 1);
    assert_eq!(families(&body), ["House Grotesk"]);

    let (status, body) = get(&service, "/api/fonts/combined").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body["total"], 5);
    assert_eq!(body["items"][0]["source"], "local");
    assert_eq!(body["items"][0]["variants"], json!(["regular"]));
    assert_eq!(body["items"][0]["version"], "v1");
    assert_eq!(body["items"][0]["lastModified"], "2024-01-01");
    assert_eq!(body["items"][0]["menu"], "https://fonts.gstatic.com/House Grotesk-menu.ttf");
    assert_eq!(body["items"][1]["source"], "google");
    assert_eq!(body["items"][1]["family"], "Roboto");
    assert!(body["items"][1].get("variants").is_none());
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let service = app(StubUpstream::new(vec![]), vec![]);

    let (status, body) = get(&service, "/health").await;
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = get(&service, "/api/fonts/nothing").await;
    assert_eq!(status, StatusCode::NotFound);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn preflight_is_answered() {
    let service = app(StubUpstream::new(vec![]), vec![]);
    let raw = "OPTIONS /api/fonts/google HTTP/1.1\r\nOrigin: http://localhost:5173\r\n\r\n";
    let (request, _) = Request::parse(raw.as_bytes()).unwrap();
    let response = service.route(request).await;

    assert_eq!(response.status(), StatusCode::NoContent);
    assert_eq!(response.header_value("Access-Control-Allow-Origin"), Some("*"));
}
