//! HTTP handler functions for the flood map API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use flood_map_report_models::BoundingBox;
use flood_map_server_models::{
    ApiClusteredReport, ApiFloodReport, ApiHealth, ApiHexZone, ClusterQueryParams,
    NearbyQueryParams, ReportQueryParams, ResolveParams, SubmitReportParams, VoteParams,
    ZoneQueryParams,
};
use flood_map_store::{CreateReportInput, StoreError};
use uuid::Uuid;

use crate::AppState;

/// Search radius applied when the nearby query omits one.
const DEFAULT_NEARBY_RADIUS_M: f64 = 1_000.0;

/// Result cap applied when the nearby query omits one.
const DEFAULT_NEARBY_LIMIT: usize = 50;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/reports`
///
/// Submits a new flood report.
pub async fn submit_report(
    state: web::Data<AppState>,
    params: web::Json<SubmitReportParams>,
) -> HttpResponse {
    let params = params.into_inner();

    let input = CreateReportInput {
        reporter_id: params.reporter_id,
        latitude: params.latitude,
        longitude: params.longitude,
        address: params.address.unwrap_or_default(),
        radius_m: params.radius,
        level: params.level,
        depth: params.flood_depth,
        description: params.description,
        images: params.images.unwrap_or_default(),
    };

    match state.store.create(input) {
        Ok(report) => HttpResponse::Created().json(ApiFloodReport::from(report)),
        Err(e) => store_error_response(&e),
    }
}

/// `GET /api/reports`
///
/// Lists active reports, optionally restricted to a bounding box.
pub async fn reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let now = Utc::now();
    let snapshot = state.store.list_active(now);

    let matched = match params.bbox.as_deref().and_then(parse_bbox) {
        Some(bbox) => flood_map_query::within_bounds(&snapshot, &bbox, now),
        None => snapshot,
    };

    let api_reports: Vec<ApiFloodReport> =
        matched.into_iter().map(ApiFloodReport::from).collect();
    HttpResponse::Ok().json(api_reports)
}

/// `GET /api/reports/nearby`
///
/// Lists active reports within a radius of a point, newest first.
pub async fn nearby(
    state: web::Data<AppState>,
    params: web::Query<NearbyQueryParams>,
) -> HttpResponse {
    let now = Utc::now();
    let snapshot = state.store.list_active(now);

    let hits = flood_map_query::nearby(
        &snapshot,
        params.lat,
        params.lng,
        params.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_M),
        params.limit.unwrap_or(DEFAULT_NEARBY_LIMIT),
        now,
    );

    let api_reports: Vec<ApiFloodReport> = hits.into_iter().map(ApiFloodReport::from).collect();
    HttpResponse::Ok().json(api_reports)
}

/// `POST /api/reports/{id}/vote`
///
/// Casts or switches a credibility vote on a report.
pub async fn vote(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    params: web::Json<VoteParams>,
) -> HttpResponse {
    let report_id = path.into_inner();
    let params = params.into_inner();

    match state.store.vote(report_id, &params.user_id, params.direction) {
        Ok(report) => HttpResponse::Ok().json(ApiFloodReport::from(report)),
        Err(e) => store_error_response(&e),
    }
}

/// `POST /api/reports/{id}/resolve`
///
/// Casts a resolve vote; the report transitions once quorum is reached.
pub async fn resolve(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    params: web::Json<ResolveParams>,
) -> HttpResponse {
    let report_id = path.into_inner();

    match state.store.cast_resolved_vote(report_id, &params.user_id) {
        Ok(report) => HttpResponse::Ok().json(ApiFloodReport::from(report)),
        Err(e) => store_error_response(&e),
    }
}

/// `GET /api/zones`
///
/// Lists aggregated hexagon risk zones.
pub async fn zones(state: web::Data<AppState>, params: web::Query<ZoneQueryParams>) -> HttpResponse {
    let now = Utc::now();
    let snapshot = state.store.list_active(now);
    let bbox = params.bbox.as_deref().and_then(parse_bbox);

    let zone_list =
        flood_map_zones::aggregate_zones(&snapshot, bbox.as_ref(), state.cells.as_ref(), now);

    let api_zones: Vec<ApiHexZone> = zone_list.into_iter().map(ApiHexZone::from).collect();
    HttpResponse::Ok().json(api_zones)
}

/// `GET /api/clusters`
///
/// Lists cluster-expanded reports for the live overlay.
pub async fn clusters(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    let now = Utc::now();
    let snapshot = state.store.list_active(now);
    let bbox = params.bbox.as_deref().and_then(parse_bbox);

    let expanded = flood_map_cluster::expand_clusters(&snapshot, bbox.as_ref(), params.limit, now);

    let api_clusters: Vec<ApiClusteredReport> = expanded
        .into_iter()
        .map(ApiClusteredReport::from)
        .collect();
    HttpResponse::Ok().json(api_clusters)
}

/// Maps a store error to its HTTP response.
fn store_error_response(e: &StoreError) -> HttpResponse {
    log::warn!("Report operation rejected: {e}");
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        StoreError::Validation { .. } => HttpResponse::BadRequest().json(body),
        StoreError::NotFound { .. } => HttpResponse::NotFound().json(body),
    }
}

/// Parses a bounding box string `"west,south,east,north"` into a
/// [`BoundingBox`].
fn parse_bbox(s: &str) -> Option<BoundingBox> {
    let parts: Vec<f64> = s.split(',').filter_map(|p| p.trim().parse().ok()).collect();
    if parts.len() == 4 {
        Some(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
    } else {
        None
    }
}
