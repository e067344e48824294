#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Read-side queries over an active-report snapshot.
//!
//! Both queries filter to active, non-expired reports and answer from a
//! per-request R-tree built over the snapshot. Radius queries use true
//! geodesic distance, not a bounding-box approximation.

use chrono::{DateTime, Utc};
use flood_map_geo::ReportSpatialIndex;
use flood_map_report_models::{BoundingBox, FloodReport};

/// Active reports within `radius_m` meters of a point, newest first,
/// capped at `limit`.
#[must_use]
pub fn nearby(
    reports: &[FloodReport],
    lat: f64,
    lng: f64,
    radius_m: f64,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<FloodReport> {
    let active: Vec<&FloodReport> = reports.iter().filter(|r| r.is_active(now)).collect();
    let index = ReportSpatialIndex::new_from_refs(&active);

    let mut hits: Vec<FloodReport> = index
        .within_distance(lat, lng, radius_m)
        .into_iter()
        .map(|i| active[i].clone())
        .collect();

    hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    hits.truncate(limit);
    hits
}

/// Active reports whose coordinates fall within the axis-aligned box.
///
/// Result order is unspecified.
#[must_use]
pub fn within_bounds(
    reports: &[FloodReport],
    bbox: &BoundingBox,
    now: DateTime<Utc>,
) -> Vec<FloodReport> {
    let active: Vec<&FloodReport> = reports.iter().filter(|r| r.is_active(now)).collect();
    let index = ReportSpatialIndex::new_from_refs(&active);

    index
        .within_bounds(bbox)
        .into_iter()
        .map(|i| active[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Duration;
    use flood_map_report_models::{Coordinates, FloodDepth, FloodLevel, ReportStatus};
    use uuid::Uuid;

    use super::*;

    fn report_at(lat: f64, lng: f64) -> FloodReport {
        let now = Utc::now();
        FloodReport {
            id: Uuid::new_v4(),
            reporter_id: "user-1".to_string(),
            coordinates: Coordinates::new(lat, lng),
            address: String::new(),
            radius_m: 100.0,
            level: FloodLevel::Medium,
            depth: FloodDepth::Knee,
            description: "standing water".to_string(),
            images: Vec::new(),
            cell_id: None,
            reporter_trust_score: 1.0,
            total_trust_score: 1.0,
            upvotes: BTreeSet::new(),
            downvotes: BTreeSet::new(),
            resolved_votes: Vec::new(),
            status: ReportStatus::Active,
            created_at: now,
            resolved_at: None,
            expires_at: now + Duration::minutes(30),
        }
    }

    #[test]
    fn nearby_filters_by_geodesic_distance() {
        let close = report_at(10.0005, 106.0);
        let far = report_at(10.05, 106.05);
        let close_id = close.id;

        let hits = nearby(&[close, far], 10.0, 106.0, 100.0, 50, Utc::now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, close_id);
    }

    #[test]
    fn nearby_orders_newest_first_and_truncates() {
        let mut older = report_at(10.0001, 106.0);
        older.created_at -= Duration::minutes(5);
        let newer = report_at(10.0002, 106.0);
        let newer_id = newer.id;

        let hits = nearby(&[older, newer], 10.0, 106.0, 500.0, 1, Utc::now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, newer_id);
    }

    #[test]
    fn nearby_excludes_expired_reports() {
        let report = report_at(10.0005, 106.0);
        let later = Utc::now() + Duration::minutes(31);
        assert!(nearby(&[report], 10.0, 106.0, 100.0, 50, later).is_empty());
    }

    #[test]
    fn nearby_excludes_resolved_reports() {
        let mut report = report_at(10.0005, 106.0);
        report.status = ReportStatus::Resolved;
        assert!(nearby(&[report], 10.0, 106.0, 100.0, 50, Utc::now()).is_empty());
    }

    #[test]
    fn within_bounds_keeps_only_boxed_reports() {
        let inside = report_at(10.5, 106.5);
        let outside = report_at(21.03, 105.85);
        let inside_id = inside.id;

        let bbox = BoundingBox::new(106.0, 10.0, 107.0, 11.0);
        let hits = within_bounds(&[inside, outside], &bbox, Utc::now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, inside_id);
    }

    #[test]
    fn within_bounds_excludes_expired_reports() {
        let report = report_at(10.5, 106.5);
        let bbox = BoundingBox::new(106.0, 10.0, 107.0, 11.0);
        let later = Utc::now() + Duration::minutes(31);
        assert!(within_bounds(&[report], &bbox, later).is_empty());
    }
}
