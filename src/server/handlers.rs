use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::imei::validate_imei;
use crate::location::{GazetteerEntry, LocationError, LocationResult, ReverseLookup};
use crate::validation::PhoneReport;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        api_error(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        api_error(rejection.status(), rejection.body_text())
    }
}

/// `Query` that rejects with the JSON error body.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Json` that rejects with the JSON error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

// ─── GET /api/imei/{imei} ────────────────────────────────────────

#[derive(Serialize)]
pub struct ImeiVerdict {
    pub imei: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub async fn imei(Path(imei): Path<String>) -> Json<ImeiVerdict> {
    let reason = validate_imei(&imei).err().map(|e| e.to_string());
    Json(ImeiVerdict {
        valid: reason.is_none(),
        imei,
        reason,
    })
}

// ─── GET /api/locations/search ───────────────────────────────────

#[derive(Deserialize)]
pub struct TextQuery {
    pub query: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<TextQuery>,
) -> Result<Json<LocationResult>, ApiError> {
    let start = Instant::now();

    let query = params.query.as_deref().unwrap_or("").trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"));
    }

    let resolved = state.resolver.resolve_by_text(query).map_err(|e| match e {
        LocationError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;

    info!(
        query,
        address = %resolved.formatted_address,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/locations/search"
    );
    Ok(Json(resolved))
}

// ─── GET /api/locations/suggest ──────────────────────────────────

pub async fn suggest(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<TextQuery>,
) -> Json<Vec<String>> {
    let query = params.query.as_deref().unwrap_or("");
    Json(state.resolver.suggestions(query))
}

// ─── GET /api/locations/reverse ──────────────────────────────────

#[derive(Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn reverse(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CoordinateQuery>,
) -> Result<Json<ReverseLookup>, ApiError> {
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lng' parameters"));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid coordinates. Lat: -90..90, Lng: -180..180",
        ));
    }

    let lookup = state.resolver.reverse_lookup(lat, lng);
    info!(
        lat,
        lng,
        address = %lookup.location.formatted_address,
        source = %lookup.location.source,
        confidence = lookup.confidence,
        "GET /api/locations/reverse"
    );
    Ok(Json(lookup))
}

// ─── GET /api/locations/random ───────────────────────────────────

pub async fn random(State(state): State<Arc<AppState>>) -> Json<GazetteerEntry> {
    let entry = state.resolver.random_location(&mut rand::thread_rng()).clone();
    Json(entry)
}

// ─── GET /api/cities ─────────────────────────────────────────────

pub async fn city_list(State(state): State<Arc<AppState>>) -> Json<Vec<GazetteerEntry>> {
    Json(state.resolver.gazetteer().cities().cloned().collect())
}

pub async fn district_list(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<GazetteerEntry>>, ApiError> {
    let gazetteer = state.resolver.gazetteer();
    if !gazetteer.get(&name).is_some_and(GazetteerEntry::is_city) {
        return Err(api_error(StatusCode::NOT_FOUND, format!("Unknown city '{}'", name)));
    }
    Ok(Json(gazetteer.districts_of(&name).cloned().collect()))
}

// ─── POST /api/reports/validate ──────────────────────────────────

#[derive(Serialize)]
pub struct FieldProblem {
    pub field: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct ReportVerdict {
    pub valid: bool,
    pub errors: Vec<FieldProblem>,
}

pub async fn validate_report(ApiJson(report): ApiJson<PhoneReport>) -> Json<ReportVerdict> {
    let errors: Vec<FieldProblem> = report
        .validate()
        .into_iter()
        .map(|(field, e)| FieldProblem {
            field,
            message: e.to_string(),
        })
        .collect();
    info!(imei = %report.imei, status = %report.status, problems = errors.len(), "POST /api/reports/validate");
    Json(ReportVerdict {
        valid: errors.is_empty(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::super::build_router;
    use super::*;
    use crate::location::{Gazetteer, LocationResolver};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let resolver = LocationResolver::new(Arc::new(Gazetteer::builtin()));
        build_router(Arc::new(AppState::new(resolver)))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_report(body: String) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/reports/validate")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_imei_valid() {
        let (status, body) = get_json("/api/imei/356938035643809").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert!(body.get("reason").is_none());
    }

    #[tokio::test]
    async fn test_imei_invalid() {
        let (_, body) = get_json("/api/imei/12345").await;
        assert_eq!(body["valid"], false);
        assert!(body["reason"].as_str().unwrap().contains("exactly 15 digits"));
    }

    #[tokio::test]
    async fn test_search_found() {
        let (status, body) = get_json("/api/locations/search?query=akwa").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["formattedAddress"], "Akwa, Douala, Cameroon");
        assert_eq!(body["accuracy"], "high");
        assert_eq!(body["source"], "gazetteer");
    }

    #[tokio::test]
    async fn test_search_not_found() {
        let (status, body) = get_json("/api/locations/search?query=xyzville").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let (status, _) = get_json("/api/locations/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_suggest() {
        let (_, body) = get_json("/api/locations/suggest?query=pk1").await;
        assert_eq!(body.as_array().unwrap().len(), 4);
        assert_eq!(body[0], "Pk10, Douala, Cameroon");
    }

    #[tokio::test]
    async fn test_reverse() {
        let (status, body) = get_json("/api/locations/reverse?lat=3.848&lng=11.5021").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "gps");
        assert_eq!(body["accuracy"], "high");
        assert_eq!(body["confidence"], 95);
    }

    #[tokio::test]
    async fn test_reverse_malformed_query_is_json() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/locations/reverse?lat=abc&lng=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["content-type"], "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().contains("lat"));
    }

    #[tokio::test]
    async fn test_unmatched_suggestions_leave_cache_empty() {
        let state = Arc::new(AppState::new(LocationResolver::new(Arc::new(Gazetteer::builtin()))));
        let router = build_router(Arc::clone(&state));
        for i in 0..200 {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/locations/suggest?query=nowhere{i}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert!(state.resolver.suggestion_cache().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_out_of_range() {
        let (status, _) = get_json("/api/locations/reverse?lat=123&lng=11").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_random_is_city() {
        let (_, body) = get_json("/api/locations/random").await;
        assert_eq!(body["kind"], "city");
    }

    #[tokio::test]
    async fn test_cities_and_districts() {
        let (_, cities) = get_json("/api/cities").await;
        assert_eq!(cities.as_array().unwrap().len(), 20);

        let (status, districts) = get_json("/api/cities/Bafoussam/districts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(districts.as_array().unwrap().len(), 8);

        let (status, _) = get_json("/api/cities/Akwa/districts").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validate_report() {
        let report = serde_json::json!({
            "imei": "356938035643808",
            "brand": "Samsung",
            "model": "A14",
            "status": "lost",
            "description": "Lost in a taxi near Mvog-Mbi",
            "ownerName": "Awa Bello",
            "ownerPhone": "699 00 11 22",
            "ownerEmail": "awa@example.cm",
            "locationAddress": "Mvog-Mbi, Yaoundé, Cameroon",
            "locationLat": 3.85,
            "locationLng": 11.4833
        });
        let (status, body) = post_report(report.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["errors"][0]["field"], "imei");
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_report_negative_reward() {
        let report = serde_json::json!({
            "imei": "356938035643809",
            "brand": "Itel",
            "model": "A70",
            "status": "stolen",
            "description": "Snatched at the Mokolo market",
            "reward": -5,
            "ownerName": "Paul Ndi",
            "ownerPhone": "+237 677 12 34 56",
            "ownerEmail": "paul@example.cm",
            "locationAddress": "Mokolo, Yaoundé, Cameroon",
            "locationLat": 3.8720,
            "locationLng": 11.5060
        });
        let (status, body) = post_report(report.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["field"], "reward");
        assert_eq!(body["errors"][0]["message"], "reward cannot be negative");
    }

    #[tokio::test]
    async fn test_validate_report_malformed_body_is_json() {
        let (status, body) = post_report("{\"imei\": ".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);

        let (status, body) = post_report(r#"{"imei":"1","reward":-5}"#.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 422);
        assert!(body["error"].as_str().is_some());
    }
}
