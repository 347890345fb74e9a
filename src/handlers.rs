use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::analytics::{class_breakdown, ClassBreakdown};
use crate::catalog::{ClassFilter, SortDirection, SortField, SortOrder, ViewFilter};
use crate::data::{export_json, find_detail};
use crate::error::CatalogError;
use crate::fetcher::fetch_text;
use crate::models::{
    ClassStats, DetailHardpoints, Locations, Mech, MechDetail, Source, TechSpecs,
};
use crate::state::{AppState, LoadStatus};
use crate::upload::{
    clear_uploads, ingest_uploads, persist_uploads, UploadReport, UploadRequest,
};

const EXPORT_FILE_NAME: &str = "mech-catalog-data.json";
const HARDPOINT_SLOTS: u32 = 8;
const MISSING: &str = "—";

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/", get(index))
        .route("/mechs/{id}", get(mech_detail))
        .route("/api/mechs", get(api_mechs))
        .route("/api/upload", post(api_upload))
        .route("/api/export", get(api_export))
        .route("/api/reset", post(api_reset))
        .route("/api/class-breakdown", get(api_class_breakdown))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Query parameters shared by the table page and the JSON view.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub class: Option<ClassFilter>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort: Option<SortField>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub dir: Option<SortDirection>,
    /// Presence flag; `?admin` with no value counts.
    #[serde(default)]
    pub admin: Option<String>,
}

impl CatalogQuery {
    fn filter(&self) -> ViewFilter {
        ViewFilter {
            search: self.q.clone().unwrap_or_default(),
            class: self.class.unwrap_or_default(),
        }
    }

    fn sort_order(&self) -> SortOrder {
        SortOrder {
            field: self.sort.unwrap_or_default(),
            direction: self.dir.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub confirm: bool,
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn empty_string_as_none_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Ok(Some(s)),
    }
}

fn render_template(
    tera: &tera::Tera,
    template: &str,
    context: &Context,
) -> Result<Html<String>, CatalogError> {
    tera.render(template, context).map(Html).map_err(|e| {
        error!("Template render error for '{}': {}", template, e);
        CatalogError::Render(e)
    })
}

/// What the render target receives after every state change.
#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub mechs: Vec<Mech>,
    pub stats: ClassStats,
}

#[derive(Debug, Serialize)]
struct MechRow<'a> {
    #[serde(flatten)]
    mech: &'a Mech,
    detail_id: String,
}

#[derive(Debug, Serialize)]
struct ColumnHeader {
    key: &'static str,
    label: &'static str,
    next_dir: &'static str,
    indicator: &'static str,
}

const TABLE_COLUMNS: [(SortField, &str); 7] = [
    (SortField::Name, "Name"),
    (SortField::WeightClass, "Class"),
    (SortField::Energy, "Energy"),
    (SortField::Ballistic, "Ballistic"),
    (SortField::Missile, "Missile"),
    (SortField::Support, "Support"),
    (SortField::Total, "Total"),
];

fn column_headers(order: SortOrder) -> Vec<ColumnHeader> {
    TABLE_COLUMNS
        .iter()
        .map(|&(field, label)| ColumnHeader {
            key: field.as_str(),
            label,
            next_dir: order.toggled(field).direction.as_str(),
            indicator: match (order.field == field, order.direction) {
                (false, _) => "",
                (true, SortDirection::Asc) => " ▲",
                (true, SortDirection::Desc) => " ▼",
            },
        })
        .collect()
}

/// GET / - Sortable, filterable catalog table.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Html<String>, CatalogError> {
    let order = query.sort_order();
    let data_guard = state.data.read().await;
    let visible = data_guard.catalog.view(&query.filter(), order);
    let stats = data_guard.catalog.stats();
    let (dataset_source, status_error) = match &data_guard.status {
        LoadStatus::Ready { source } => (Some(source.clone()), None),
        LoadStatus::Unavailable { reason } => (None, Some(reason.clone())),
    };
    drop(data_guard);

    let rows: Vec<MechRow> = visible
        .iter()
        .map(|mech| MechRow {
            mech,
            detail_id: mech.detail_id(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("mechs", &rows);
    context.insert("stats", &stats);
    context.insert("dataset_source", &dataset_source);
    context.insert("status_error", &status_error);
    context.insert("headers", &column_headers(order));
    context.insert("q", &query.q.clone().unwrap_or_default());
    context.insert("class_filter", &query.class.unwrap_or_default().to_string());
    context.insert("sort", order.field.as_str());
    context.insert("dir", order.direction.as_str());
    context.insert("sort_fields", &SortField::ALL.map(|f| f.as_str()));
    context.insert("admin", &query.admin.is_some());

    render_template(&state.tera, "catalog.html", &context)
}

/// GET /api/mechs - Filtered and sorted view plus class counters.
pub async fn api_mechs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogPage> {
    let data_guard = state.data.read().await;
    let mechs = data_guard.catalog.view(&query.filter(), query.sort_order());
    let stats = data_guard.catalog.stats();
    Json(CatalogPage { mechs, stats })
}

/// POST /api/upload - Normalizes and upserts a batch of raw mech files.
pub async fn api_upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Json<UploadReport> {
    let mut data_guard = state.data.write().await;
    let report = ingest_uploads(&mut data_guard.catalog, &request.files);
    if report.loaded > 0 {
        persist_uploads(&state.store, &data_guard.catalog).await;
    }
    Json(report)
}

/// GET /api/export - The whole collection as a downloadable JSON document.
pub async fn api_export(State(state): State<Arc<AppState>>) -> Result<Response, CatalogError> {
    let data_guard = state.data.read().await;
    let body = export_json(data_guard.catalog.mechs())?;
    drop(data_guard);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct ResetReport {
    pub removed: usize,
}

/// POST /api/reset?confirm=true - Drops every uploaded record.
pub async fn api_reset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ResetReport>, CatalogError> {
    if !query.confirm {
        return Err(CatalogError::BadRequest(
            "reset must be confirmed with confirm=true".to_string(),
        ));
    }

    let mut data_guard = state.data.write().await;
    let removed = data_guard
        .catalog
        .remove_where(|source| source == Source::Uploaded);
    clear_uploads(&state.store).await;
    drop(data_guard);

    info!("Reset removed {} uploaded mechs", removed);
    Ok(Json(ResetReport { removed }))
}

/// GET /api/class-breakdown - Per-class aggregates using Polars.
pub async fn api_class_breakdown(State(state): State<Arc<AppState>>) -> Json<Vec<ClassBreakdown>> {
    let data_guard = state.data.read().await;
    let result = class_breakdown(data_guard.catalog.mechs());
    drop(data_guard);

    match result {
        Ok(rows) => Json(rows),
        Err(e) => {
            error!("Polars aggregation error: {}", e);
            Json(Vec::new())
        }
    }
}

// Detail page

#[derive(Debug, Serialize, PartialEq)]
struct InfoItem {
    label: &'static str,
    value: String,
    css_class: Option<String>,
}

impl InfoItem {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            css_class: None,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct HardpointRow {
    icon: &'static str,
    label: &'static str,
    color: &'static str,
    count: u32,
    max: u32,
}

#[derive(Debug, Serialize, PartialEq)]
struct ArmorRow {
    location: &'static str,
    text: String,
}

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn format_cost(cost: u64) -> String {
    let digits: Vec<char> = cost.to_string().chars().collect();
    digits
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().collect::<String>())
        .join(",")
}

fn basic_info(detail: &MechDetail) -> Vec<InfoItem> {
    let class = InfoItem {
        css_class: detail
            .weight_class
            .as_ref()
            .map(|c| format!("weight-{}", c.to_lowercase())),
        ..InfoItem::new("Class", or_missing(detail.weight_class.as_deref()))
    };
    vec![
        InfoItem::new("Model", or_missing(detail.model.as_deref())),
        InfoItem::new("Tonnage", or_missing(detail.weight.map(|w| format!("{} tons", w)))),
        class,
        InfoItem::new("Battle Value", or_missing(detail.battle_value)),
        InfoItem::new("Year", or_missing(detail.year)),
        InfoItem::new(
            "Cost",
            or_missing(
                detail
                    .cost
                    .filter(|c| *c > 0)
                    .map(|c| format!("{} C-Bills", format_cost(c))),
            ),
        ),
        InfoItem::new("Manufacturer", or_missing(detail.manufacturer.as_deref())),
        InfoItem::new("Source", or_missing(detail.source.as_deref())),
    ]
}

fn hardpoint_rows(hardpoints: Option<&DetailHardpoints>) -> Vec<HardpointRow> {
    let Some(hp) = hardpoints else {
        return Vec::new();
    };
    let row = |icon, label, color, count| HardpointRow {
        icon,
        label,
        color,
        count,
        max: HARDPOINT_SLOTS,
    };
    vec![
        row("🔫", "BALLISTIC", "ballistic", hp.ballistic),
        row("⚡", "ENERGY", "energy", hp.energy),
        row("🚀", "MISSILE", "missile", hp.missile),
        row("🔪", "ANTI-PERSONNEL", "antipersonnel", hp.anti_personnel),
    ]
}

fn tech_specs(specs: Option<&TechSpecs>) -> Vec<InfoItem> {
    let Some(specs) = specs else {
        return Vec::new();
    };
    let movement = specs.movement.unwrap_or_default();
    let armor = specs.armor.clone().unwrap_or_default();
    let engine = specs.engine.clone().unwrap_or_default();
    vec![
        InfoItem::new(
            "Movement (Walk/Run/Jump)",
            format!("{}/{}/{}", movement.walk, movement.run, movement.jump),
        ),
        InfoItem::new("Max Armor", armor.max.to_string()),
        InfoItem::new("Armor Type", armor.kind.unwrap_or_else(|| "Standard".into())),
        InfoItem::new(
            "Structure",
            specs.structure.clone().unwrap_or_else(|| "Standard".into()),
        ),
        InfoItem::new(
            "Engine",
            format!(
                "{} {}",
                engine.rating,
                engine.kind.unwrap_or_else(|| "Fusion".into())
            ),
        ),
        InfoItem::new("Heat Sinks", specs.heat_sinks.unwrap_or(0).to_string()),
    ]
}

fn armor_rows(locations: Option<&Locations>) -> Vec<ArmorRow> {
    let Some(loc) = locations else {
        return Vec::new();
    };
    [
        ("Head", loc.head),
        ("Left Arm", loc.leftarm),
        ("Right Arm", loc.rightarm),
        ("Left Torso", loc.lefttorso),
        ("Right Torso", loc.righttorso),
        ("Center Torso", loc.centertorso),
        ("Left Leg", loc.leftleg),
        ("Right Leg", loc.rightleg),
    ]
    .into_iter()
    .filter_map(|(location, armor)| {
        armor.map(|a| ArmorRow {
            location,
            text: match a.rear_armor.filter(|r| *r > 0) {
                Some(rear) => format!("{} (+{} rear)", a.armor, rear),
                None => a.armor.to_string(),
            },
        })
    })
    .collect()
}

/// GET /mechs/{id} - Detail page from the enhanced dataset.
pub async fn mech_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let lookup = match fetch_text(&state.client, &state.config.detail_dataset).await {
        Ok(text) => find_detail(&text, &id),
        Err(e) => Err(e),
    };

    let mut context = Context::new();
    let status = match lookup {
        Ok(detail) => {
            let title = match detail.model.as_deref() {
                Some(model) => format!("{} {}", detail.name, model),
                None => detail.name.clone(),
            };
            context.insert("title", &title);
            context.insert("basic_info", &basic_info(&detail));
            context.insert("hardpoints", &hardpoint_rows(detail.hardpoints.as_ref()));
            context.insert("tech_specs", &tech_specs(detail.tech_specs.as_ref()));
            context.insert("armor", &armor_rows(detail.locations.as_ref()));
            StatusCode::OK
        }
        Err(e) => {
            let (status, message) = match &e {
                CatalogError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    format!("Mech with id \"{}\" not found", id),
                ),
                _ => {
                    error!("Detail lookup for '{}' failed: {}", id, e);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Could not load mech data".to_string(),
                    )
                }
            };
            context.insert("title", &message);
            context.insert("error_message", &message);
            status
        }
    };

    match render_template(&state.tera, "detail.html", &context) {
        Ok(html) => (status, html).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fetcher::DatasetSource;
    use crate::models::{Hardpoints, LocationArmor, WeightClass};
    use crate::state::Config;
    use crate::storage::UPLOADED_MECHS_KEY;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const ENHANCED: &str = r#"{"mechs": [{
        "name": "Atlas", "model": "AS7-D", "weight": 100, "weightClass": "Assault",
        "cost": 9626000, "hardpoints": {"Ballistic": 1, "Energy": 4, "Missile": 1},
        "techSpecs": {"movement": {"walk": 3, "run": 5}, "heatSinks": 20},
        "locations": {"head": {"armor": 9}, "centertorso": {"armor": 47, "rearArmor": 14}}
    }]}"#;

    struct TestApp {
        state: Arc<AppState>,
        _dir: TempDir,
    }

    impl TestApp {
        fn router(&self) -> Router {
            router(self.state.clone())
        }
    }

    fn mech(name: &str, chassis: &str, tonnage: u32, energy: u32, source: Source) -> Mech {
        Mech::new(
            name.to_string(),
            chassis.to_string(),
            WeightClass::from_tonnage(tonnage),
            tonnage,
            Hardpoints {
                energy,
                ..Hardpoints::default()
            },
            source,
        )
    }

    fn test_app(status: LoadStatus, write_detail: bool) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let detail_path = dir.path().join("enhanced.json");
        if write_detail {
            std::fs::write(&detail_path, ENHANCED).unwrap();
        }
        let config = Config {
            bind_address: "127.0.0.1:0".into(),
            dataset: DatasetSource::Path(detail_path.clone()),
            dataset_fallback: DatasetSource::Path(detail_path.clone()),
            detail_dataset: DatasetSource::Path(detail_path),
            cache_dir: dir.path().join("cache").to_string_lossy().into_owned(),
            templates_glob: concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html").into(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").into(),
        };
        let tera = tera::Tera::new(&config.templates_glob).unwrap();

        let mut catalog = Catalog::new();
        catalog.load_bulk(vec![
            mech("Atlas", "AS7-D", 100, 4, Source::Catalog),
            mech("Jenner", "JR7-D", 35, 5, Source::Catalog),
            mech("Hunchback", "HBK-4G", 50, 2, Source::Catalog),
            mech("Catapult", "CPLT-C1", 65, 3, Source::Uploaded),
        ]);
        let client = reqwest::Client::new();
        let state = Arc::new(AppState::new(tera, config, client, catalog, status));
        TestApp { state, _dir: dir }
    }

    fn ready() -> LoadStatus {
        LoadStatus::Ready {
            source: "test".into(),
        }
    }

    async fn send(
        app: Router,
        request: Request<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, headers, String::from_utf8(bytes.to_vec()).expect("utf8"))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    mod page_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_renders_rows_and_counters() {
            let app = test_app(ready(), true);
            let (status, _, body) = send(app.router(), get_request("/")).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("Atlas"));
            assert!(body.contains("href=\"/mechs/atlas\""));
            assert!(body.contains("id=\"assaultCount\">1<"));
            assert!(body.contains("id=\"totalMechs\">4<"));
            assert!(!body.contains("No mechs match"));
            assert!(!body.contains("id=\"adminControls\""));
        }

        #[tokio::test]
        async fn test_index_empty_state() {
            let app = test_app(ready(), true);
            let (status, _, body) = send(app.router(), get_request("/?q=zeus")).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("No mechs match"));
            assert!(!body.contains("<tbody"));
        }

        #[tokio::test]
        async fn test_index_error_state() {
            let status = LoadStatus::Unavailable {
                reason: "data/mechs.json: not found".into(),
            };
            let app = test_app(status, true);
            let (_, _, body) = send(app.router(), get_request("/")).await;
            assert!(body.contains("Dataset unavailable"));
        }

        #[tokio::test]
        async fn test_admin_flag_shows_controls() {
            let app = test_app(ready(), true);
            let (_, _, body) = send(app.router(), get_request("/?admin")).await;
            assert!(body.contains("id=\"adminControls\""));
        }

        #[tokio::test]
        async fn test_bad_query_is_rejected() {
            let app = test_app(ready(), true);
            let (status, _, _) = send(app.router(), get_request("/?sort=colour")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_detail_page() {
            let app = test_app(ready(), true);
            let (status, _, body) = send(app.router(), get_request("/mechs/atlas-as7-d")).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("Atlas AS7-D"));
            assert!(body.contains("9,626,000 C-Bills"));
            assert!(body.contains("47 (+14 rear)"));
        }

        #[tokio::test]
        async fn test_detail_not_found() {
            let app = test_app(ready(), true);
            let (status, _, body) = send(app.router(), get_request("/mechs/zeus")).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body.contains("not found"));
        }

        fn rewrite_detail_dataset(app: &TestApp, text: &str) {
            match &app.state.config.detail_dataset {
                DatasetSource::Path(path) => std::fs::write(path, text).unwrap(),
                DatasetSource::Url(url) => panic!("test dataset is a URL: {}", url),
            }
        }

        #[tokio::test]
        async fn test_detail_page_with_float_numbers() {
            let app = test_app(ready(), true);
            rewrite_detail_dataset(
                &app,
                r#"[{"name": "Urbie", "model": "UM-R60", "weight": 30.0, "battleValue": 512.5}]"#,
            );
            let (status, _, body) = send(app.router(), get_request("/mechs/urbie-um-r60")).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("30 tons"));
            assert!(body.contains("512"));
        }

        #[tokio::test]
        async fn test_detail_unreadable_entry_is_unavailable() {
            let app = test_app(ready(), true);
            rewrite_detail_dataset(
                &app,
                r#"[{"name": "Urbie", "model": "UM-R60", "locations": 7}]"#,
            );
            let (status, _, body) = send(app.router(), get_request("/mechs/urbie-um-r60")).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert!(body.contains("Could not load mech data"));
        }

        #[tokio::test]
        async fn test_detail_source_unavailable() {
            let app = test_app(ready(), false);
            let (status, _, body) = send(app.router(), get_request("/mechs/atlas-as7-d")).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert!(body.contains("Could not load mech data"));
        }
    }

    mod api_tests {
        use super::*;

        #[tokio::test]
        async fn test_api_mechs_filters_and_sorts() {
            let app = test_app(ready(), true);
            let (status, _, body) = send(
                app.router(),
                get_request("/api/mechs?class=all&sort=total&dir=desc"),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let page: serde_json::Value = serde_json::from_str(&body).unwrap();
            let names: Vec<&str> = page["mechs"]
                .as_array()
                .unwrap()
                .iter()
                .map(|m| m["name"].as_str().unwrap())
                .collect();
            assert_eq!(names, vec!["Jenner", "Atlas", "Catapult", "Hunchback"]);
            assert_eq!(page["stats"]["total"], 4);
            assert_eq!(page["stats"]["heavy"], 1);
        }

        #[tokio::test]
        async fn test_upload_batch_and_cache() {
            let app = test_app(ready(), true);
            let body = serde_json::json!({
                "files": [
                    {"name": "hbk.json", "content": r#"{"ChassisID":"HBK-4G","Description":{"UIName":"Hunchback IIC"}}"#},
                    {"name": "lct.json", "content": r#"{"ChassisID":"LCT-1V","Description":{"UIName":"Locust"}}"#},
                    {"name": "bad.json", "content": "{"}
                ]
            });
            let (status, _, body) = send(app.router(), post_json("/api/upload", body)).await;
            assert_eq!(status, StatusCode::OK);
            let report: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(report["loaded"], 2);
            assert_eq!(report["inserted"], 1);
            assert_eq!(report["replaced"], 1);
            assert_eq!(report["errors"][0]["file"], "bad.json");

            let data = app.state.data.read().await;
            assert_eq!(data.catalog.len(), 5);
            assert_eq!(data.catalog.mechs()[2].name, "Hunchback IIC");
            drop(data);
            assert!(app.state.store.get(UPLOADED_MECHS_KEY).await.unwrap().is_some());
        }

        #[tokio::test]
        async fn test_reset_requires_confirmation() {
            let app = test_app(ready(), true);
            let request = post_json("/api/reset", serde_json::json!({}));
            let (status, _, _) = send(app.router(), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(app.state.data.read().await.catalog.len(), 4);
        }

        #[tokio::test]
        async fn test_reset_removes_uploaded() {
            let app = test_app(ready(), true);
            app.state.store.put(UPLOADED_MECHS_KEY, "[]").await.unwrap();
            let (status, _, body) = send(
                app.router(),
                post_json("/api/reset?confirm=true", serde_json::json!({})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, r#"{"removed":1}"#);

            let data = app.state.data.read().await;
            assert_eq!(data.catalog.len(), 3);
            assert!(data.catalog.mechs().iter().all(|m| m.source == Source::Catalog));
            assert_eq!(app.state.store.get(UPLOADED_MECHS_KEY).await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_export_downloads_full_collection() {
            let app = test_app(ready(), true);
            let (status, headers, body) =
                send(app.router(), get_request("/api/export?q=atlas")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                headers[header::CONTENT_DISPOSITION],
                "attachment; filename=\"mech-catalog-data.json\""
            );
            let exported = crate::data::parse_export(&body).unwrap();
            assert_eq!(exported.len(), 4);
            assert_eq!(exported, app.state.data.read().await.catalog.mechs());
        }

        #[tokio::test]
        async fn test_class_breakdown() {
            let app = test_app(ready(), true);
            let (status, _, body) = send(app.router(), get_request("/api/class-breakdown")).await;
            assert_eq!(status, StatusCode::OK);
            let rows: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(rows.as_array().unwrap().len(), 4);
            assert_eq!(rows[0]["weightClass"], "Light");
        }
    }

    mod presentation_tests {
        use super::*;

        #[test]
        fn test_format_cost() {
            assert_eq!(format_cost(0), "0");
            assert_eq!(format_cost(999), "999");
            assert_eq!(format_cost(1000), "1,000");
            assert_eq!(format_cost(9626000), "9,626,000");
        }

        #[test]
        fn test_headers_toggle_active_column() {
            let order = SortOrder {
                field: SortField::Total,
                direction: SortDirection::Asc,
            };
            let headers = column_headers(order);
            let total = headers.iter().find(|h| h.key == "total").unwrap();
            assert_eq!(total.next_dir, "desc");
            assert_eq!(total.indicator, " ▲");
            let name = headers.iter().find(|h| h.key == "name").unwrap();
            assert_eq!(name.next_dir, "asc");
            assert_eq!(name.indicator, "");
        }

        #[test]
        fn test_tech_spec_defaults() {
            let items = tech_specs(Some(&TechSpecs::default()));
            let values: Vec<&str> = items.iter().map(|i| i.value.as_str()).collect();
            assert_eq!(values, vec!["0/0/0", "0", "Standard", "Standard", "0 Fusion", "0"]);
            assert!(tech_specs(None).is_empty());
        }

        #[test]
        fn test_armor_rows_skip_missing_locations() {
            let locations = Locations {
                head: Some(LocationArmor {
                    armor: 9,
                    rear_armor: None,
                }),
                lefttorso: Some(LocationArmor {
                    armor: 32,
                    rear_armor: Some(0),
                }),
                ..Locations::default()
            };
            let rows = armor_rows(Some(&locations));
            assert_eq!(
                rows,
                vec![
                    ArmorRow {
                        location: "Head",
                        text: "9".into()
                    },
                    ArmorRow {
                        location: "Left Torso",
                        text: "32".into()
                    },
                ]
            );
        }

        #[test]
        fn test_basic_info_placeholders() {
            let detail = MechDetail {
                name: "Locust".into(),
                weight_class: Some("Light".into()),
                cost: Some(0),
                ..MechDetail::default()
            };
            let items = basic_info(&detail);
            assert_eq!(items[0].value, MISSING);
            assert_eq!(items[2].css_class.as_deref(), Some("weight-light"));
            assert_eq!(items[5].value, MISSING);
        }
    }
}
