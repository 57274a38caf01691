// 🌐 HTTP API - serves derived views to a browser front-end
// Each request builds its own FilterState; the dataset is shared read-only.

use crate::dataset::{Dataset, OccupationCategory, Record};
use crate::filter::{FilterError, FilterState, YearRange, MAX_YEAR, MIN_YEAR};
use crate::views::{compute_views_with, ViewOptions, Views};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub options: ViewOptions,
    /// Starting point for every request's filter (year window from config)
    pub base_filter: FilterState,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

// ============================================================================
// QUERY → FILTER
// ============================================================================

/// `?region=France&genders=Male,Female&occupations=Art,Science&from=1800&to=1900`
#[derive(Debug, Default, Deserialize)]
pub struct ViewsQuery {
    pub region: Option<String>,
    pub genders: Option<String>,
    pub occupations: Option<String>,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

fn split_list(list: &Option<String>) -> impl Iterator<Item = &str> {
    list.as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl ViewsQuery {
    pub fn to_filter(&self, base: &FilterState) -> Result<FilterState, FilterError> {
        // A lone bound leaves the other end open
        let years = match (self.from, self.to) {
            (None, None) => base.years,
            (from, to) => YearRange::new(from.unwrap_or(MIN_YEAR), to.unwrap_or(MAX_YEAR))?,
        };

        // Unknown occupation labels are ignored rather than rejected
        let occupations: Vec<OccupationCategory> = split_list(&self.occupations)
            .filter_map(OccupationCategory::from_label)
            .collect();

        Ok(FilterState {
            region: self.region.clone().filter(|r| !r.is_empty()),
            ..base.clone()
        }
        .with_genders(split_list(&self.genders))
        .with_occupations(occupations)
        .with_years(years))
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct RegionSummary {
    name: String,
    lat: f64,
    lng: f64,
    area: f64,
}

#[derive(Serialize)]
struct RecordResponse {
    #[serde(flatten)]
    record: Record,
    link: String,
}

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/views - All three views for one filter
async fn get_views(State(state): State<AppState>, Query(query): Query<ViewsQuery>) -> Response {
    match query.to_filter(&state.base_filter) {
        Ok(filter) => {
            let views: Views = compute_views_with(&state.dataset, &filter, &state.options);
            ApiResponse::ok(views)
        }
        Err(e) => {
            warn!(error = %e, "rejected filter");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// GET /api/regions - Region list (without geometry)
async fn get_regions(State(state): State<AppState>) -> Response {
    let regions: Vec<RegionSummary> = state
        .dataset
        .regions()
        .iter()
        .map(|r| RegionSummary {
            name: r.name.clone(),
            lat: r.lat,
            lng: r.lng,
            area: r.area,
        })
        .collect();
    ApiResponse::ok(regions)
}

/// GET /api/records/:id - One record plus its external link
async fn get_record(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.dataset.record(&id) {
        Some(record) => ApiResponse::ok(RecordResponse {
            link: record.link(),
            record: record.clone(),
        }),
        None => error_response(StatusCode::NOT_FOUND, format!("no record with id {}", id)),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/views", get(get_views))
        .route("/regions", get(get_regions))
        .route("/records/:id", get(get_record))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::fixture;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState {
            dataset: Arc::new(fixture()),
            options: ViewOptions::default(),
            base_filter: FilterState::default(),
        };
        router(state, PathBuf::from("public"))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_query_to_filter() {
        let query = ViewsQuery {
            region: Some("France".to_string()),
            genders: Some("Male, Female".to_string()),
            occupations: Some("Art,Knitting".to_string()),
            from: Some(1800),
            to: None,
        };
        let filter = query.to_filter(&FilterState::default()).unwrap();
        assert_eq!(filter.region.as_deref(), Some("France"));
        assert_eq!(filter.genders.len(), 2);
        assert_eq!(filter.occupations.len(), 1);
        assert_eq!(filter.years, YearRange::new(1800, MAX_YEAR).unwrap());

        let upper_only = ViewsQuery {
            to: Some(300),
            ..ViewsQuery::default()
        };
        let filter = upper_only.to_filter(&FilterState::default()).unwrap();
        assert_eq!(filter.years, YearRange::new(MIN_YEAR, 300).unwrap());

        let neither = ViewsQuery::default().to_filter(&FilterState::default()).unwrap();
        assert_eq!(neither.years, YearRange::default());

        let out_of_range = ViewsQuery {
            from: Some(2100),
            ..ViewsQuery::default()
        };
        assert!(out_of_range.to_filter(&FilterState::default()).is_err());

        let reversed = ViewsQuery {
            from: Some(1900),
            to: Some(1800),
            ..ViewsQuery::default()
        };
        assert!(reversed.to_filter(&FilterState::default()).is_err());
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_views_endpoint() {
        let (status, body) = get_json("/api/views?from=1800&to=1900&region=France").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["matched"], 2);
        assert_eq!(body["data"]["globe"]["points"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["heatmap"]["cells"].as_array().unwrap().len(), 24);
    }

    #[tokio::test]
    async fn test_views_accepts_single_bound() {
        let (status, body) = get_json("/api/views?from=1800").await;
        assert_eq!(status, StatusCode::OK);
        // Everyone except Hokusai (born 1760)
        assert_eq!(body["data"]["matched"], 4);
    }

    #[tokio::test]
    async fn test_views_rejects_bad_years() {
        let (status, body) = get_json("/api/views?from=1900&to=1800").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_record_lookup() {
        let (status, body) = get_json("/api/records/Q4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Hokusai");
        assert!(body["data"]["link"].as_str().unwrap().ends_with("/Q4"));

        let (status, _) = get_json("/api/records/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
