#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hexagon risk-zone aggregation.
//!
//! Buckets the active report snapshot by hex cell and emits one zone per
//! cell that clears the active-zone policy, with severity and trust
//! aggregates for heatmap rendering. Zone geometry comes from the cell
//! resolver; when it is unavailable the zone is emitted without polygon
//! and center rather than failing the map view.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use flood_map_geo::bounding_box_contains;
use flood_map_hexgrid::CellResolver;
use flood_map_report_models::{
    BoundingBox, Coordinates, FloodDepth, FloodLevel, FloodReport,
};
use serde::Serialize;
use uuid::Uuid;

/// Report count at which a cell becomes an active zone on its own.
pub const MIN_ZONE_REPORTS: usize = 3;

/// Total trust score at which a cell becomes an active zone on its own.
pub const MIN_ZONE_TRUST: f64 = 10.0;

/// One hex cell with enough corroborated reports to render as a risk zone.
///
/// Transient: recomputed from the active snapshot on every query, never
/// persisted. Output order is unspecified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexZone {
    /// The hex-grid cell id.
    pub cell_id: String,
    /// Number of active reports in the cell.
    pub count: usize,
    /// Sum of member total trust scores.
    pub total_trust_score: f64,
    /// Highest reported severity in the cell.
    pub max_level: FloodLevel,
    /// Deepest reported water in the cell.
    pub max_depth: FloodDepth,
    /// Member report ids, in snapshot order.
    pub report_ids: Vec<Uuid>,
    /// Cell boundary ring; `None` when the resolver was unavailable.
    pub boundary: Option<Vec<Coordinates>>,
    /// Cell center; `None` when the resolver was unavailable.
    pub center: Option<Coordinates>,
}

/// Aggregates the active snapshot into renderable hex zones.
///
/// Reports outside the bounding box (when given) or without a cell id are
/// excluded. A cell is emitted when it has at least [`MIN_ZONE_REPORTS`]
/// reports or its trust sum reaches [`MIN_ZONE_TRUST`]; either condition
/// alone is sufficient.
#[must_use]
pub fn aggregate_zones(
    reports: &[FloodReport],
    bbox: Option<&BoundingBox>,
    resolver: &dyn CellResolver,
    now: DateTime<Utc>,
) -> Vec<HexZone> {
    let mut cells: BTreeMap<&str, Vec<&FloodReport>> = BTreeMap::new();

    for report in reports {
        if !report.is_active(now) {
            continue;
        }
        if let Some(bbox) = bbox {
            if !bounding_box_contains(bbox, &report.coordinates) {
                continue;
            }
        }
        let Some(cell_id) = report.cell_id.as_deref() else {
            continue;
        };
        cells.entry(cell_id).or_default().push(report);
    }

    cells
        .into_iter()
        .filter_map(|(cell_id, members)| build_zone(cell_id, &members, resolver))
        .collect()
}

fn build_zone(
    cell_id: &str,
    members: &[&FloodReport],
    resolver: &dyn CellResolver,
) -> Option<HexZone> {
    let count = members.len();
    let total_trust_score: f64 = members.iter().map(|r| r.total_trust_score).sum();

    if count < MIN_ZONE_REPORTS && total_trust_score < MIN_ZONE_TRUST {
        return None;
    }

    // Non-empty by construction, so the maxima always exist.
    let max_level = members.iter().map(|r| r.level).max()?;
    let max_depth = members.iter().map(|r| r.depth).max()?;

    let boundary = match resolver.boundary(cell_id) {
        Ok(ring) => Some(ring),
        Err(e) => {
            log::warn!("No boundary for zone {cell_id}: {e}");
            None
        }
    };
    let center = match resolver.center(cell_id) {
        Ok(point) => Some(point),
        Err(e) => {
            log::warn!("No center for zone {cell_id}: {e}");
            None
        }
    };

    Some(HexZone {
        cell_id: cell_id.to_string(),
        count,
        total_trust_score,
        max_level,
        max_depth,
        report_ids: members.iter().map(|r| r.id).collect(),
        boundary,
        center,
    })
}
