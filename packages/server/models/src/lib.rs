#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the flood map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types in `flood_map_report_models` to allow independent
//! evolution of the API contract.

use chrono::{DateTime, Utc};
use flood_map_cluster::ExpandedReport;
use flood_map_report_models::{
    Coordinates, FloodDepth, FloodLevel, FloodReport, ReportStatus, VoteDirection,
};
use flood_map_zones::HexZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flood report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFloodReport {
    /// Unique report ID.
    pub id: Uuid,
    /// The submitting user.
    pub reporter_id: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Street address for display.
    pub address: String,
    /// Affected radius in meters as submitted.
    pub radius_m: f64,
    /// Reported severity.
    pub level: FloodLevel,
    /// Observed water depth.
    pub flood_depth: FloodDepth,
    /// What the reporter saw.
    pub description: String,
    /// Attached photo URIs.
    pub images: Vec<String>,
    /// Hex cell containing the report, if one was assigned.
    pub cell_id: Option<String>,
    /// Trust snapshot taken at creation.
    pub reporter_trust_score: f64,
    /// Aggregate trust behind this report.
    pub total_trust_score: f64,
    /// Number of confirming votes.
    pub upvotes: usize,
    /// Number of disputing votes.
    pub downvotes: usize,
    /// Number of resolve votes cast so far.
    pub resolved_votes: usize,
    /// Lifecycle state.
    pub status: ReportStatus,
    /// When the report was submitted (ISO 8601).
    pub created_at: DateTime<Utc>,
    /// When the resolve quorum was reached, if it was.
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the report stops being visible.
    pub expires_at: DateTime<Utc>,
}

impl From<FloodReport> for ApiFloodReport {
    fn from(report: FloodReport) -> Self {
        Self {
            id: report.id,
            reporter_id: report.reporter_id,
            latitude: report.coordinates.latitude,
            longitude: report.coordinates.longitude,
            address: report.address,
            radius_m: report.radius_m,
            level: report.level,
            flood_depth: report.depth,
            description: report.description,
            images: report.images,
            cell_id: report.cell_id,
            reporter_trust_score: report.reporter_trust_score,
            total_trust_score: report.total_trust_score,
            upvotes: report.upvotes.len(),
            downvotes: report.downvotes.len(),
            resolved_votes: report.resolved_votes.len(),
            status: report.status,
            created_at: report.created_at,
            resolved_at: report.resolved_at,
            expires_at: report.expires_at,
        }
    }
}

/// Body of the submit-report endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportParams {
    /// The submitting user, as authenticated by the gateway.
    pub reporter_id: String,
    /// Latitude of the observation.
    pub latitude: f64,
    /// Longitude of the observation.
    pub longitude: f64,
    /// Street address for display.
    pub address: Option<String>,
    /// Affected radius in meters; server default when absent.
    pub radius: Option<f64>,
    /// Reported severity.
    pub level: FloodLevel,
    /// Observed water depth.
    pub flood_depth: FloodDepth,
    /// What the reporter saw.
    pub description: String,
    /// Photo URIs from the upload service.
    pub images: Option<Vec<String>>,
}

/// Body of the vote endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteParams {
    /// The voting user.
    pub user_id: String,
    /// `UP` or `DOWN`.
    pub direction: VoteDirection,
}

/// Body of the resolve-vote endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveParams {
    /// The voting user.
    pub user_id: String,
}

/// Query parameters for the report listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// Bounding box as `west,south,east,north`.
    pub bbox: Option<String>,
}

/// Query parameters for the nearby-reports endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQueryParams {
    /// Latitude of the query point.
    pub lat: f64,
    /// Longitude of the query point.
    pub lng: f64,
    /// Search radius in meters.
    pub radius: Option<f64>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Query parameters for the hexagon zones endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneQueryParams {
    /// Bounding box as `west,south,east,north`.
    pub bbox: Option<String>,
}

/// Query parameters for the clusters endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQueryParams {
    /// Bounding box as `west,south,east,north`.
    pub bbox: Option<String>,
    /// Newest-N window to cluster (server cap still applies).
    pub limit: Option<usize>,
}

/// An aggregated hexagon zone as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHexZone {
    /// The hex-grid cell id.
    pub cell_id: String,
    /// Number of active reports in the cell.
    pub count: usize,
    /// Sum of member trust scores.
    pub total_trust_score: f64,
    /// Highest reported severity in the cell.
    pub max_level: FloodLevel,
    /// Deepest reported water in the cell.
    pub max_flood_depth: FloodDepth,
    /// Member report ids.
    pub report_ids: Vec<Uuid>,
    /// Cell boundary ring; absent when the grid resolver was unavailable.
    pub boundary: Option<Vec<Coordinates>>,
    /// Cell center; absent when the grid resolver was unavailable.
    pub center: Option<Coordinates>,
}

impl From<HexZone> for ApiHexZone {
    fn from(zone: HexZone) -> Self {
        Self {
            cell_id: zone.cell_id,
            count: zone.count,
            total_trust_score: zone.total_trust_score,
            max_level: zone.max_level,
            max_flood_depth: zone.max_depth,
            report_ids: zone.report_ids,
            boundary: zone.boundary,
            center: zone.center,
        }
    }
}

/// A cluster-expanded report as returned by the clusters endpoint.
///
/// `radius` is the display radius after expansion; `originalRadius` is
/// what the reporter submitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClusteredReport {
    /// Unique report ID.
    pub id: Uuid,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Expanded display radius in meters.
    pub radius: f64,
    /// Radius as submitted, pre-expansion.
    pub original_radius: f64,
    /// Size of the intersection group this report landed in.
    pub group_size: usize,
    /// Reported severity.
    pub level: FloodLevel,
    /// Observed water depth.
    pub flood_depth: FloodDepth,
    /// When the report was submitted.
    pub created_at: DateTime<Utc>,
}

impl From<ExpandedReport> for ApiClusteredReport {
    fn from(expanded: ExpandedReport) -> Self {
        Self {
            id: expanded.report.id,
            latitude: expanded.report.coordinates.latitude,
            longitude: expanded.report.coordinates.longitude,
            radius: expanded.rendered_radius_m,
            original_radius: expanded.report.radius_m,
            group_size: expanded.group_size,
            level: expanded.report.level,
            flood_depth: expanded.report.depth,
            created_at: expanded.report.created_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
