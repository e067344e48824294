#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Cluster expansion for the live-reports overlay.
//!
//! Overlapping reports are usually the same flood seen by several people.
//! Rendering them as N independent circles overstates the signal, so this
//! engine groups reports whose circles transitively intersect and inflates
//! each member's rendered radius by a factor keyed to group size: one
//! merged-looking zone instead of a pile of duplicates.
//!
//! Grouping is a connected-components computation over the intersection
//! graph: each group is grown by re-scanning the remaining reports until a
//! full pass adds nothing, so chains like A–B–C land in one group even
//! when A and C never touch directly. The scan is quadratic in the worst
//! case, which is fine under [`MAX_CLUSTER_REPORTS`]; a union-find pass
//! would be the move if that cap ever grows significantly.

use chrono::{DateTime, Utc};
use flood_map_geo::{bounding_box_contains, circles_intersect};
use flood_map_report_models::{BoundingBox, FloodReport};

/// Most-recent window of reports considered for clustering.
pub const MAX_CLUSTER_REPORTS: usize = 200;

/// Radius multiplier for a cluster of the given size.
///
/// Non-decreasing in group size; singletons render unchanged.
#[must_use]
pub const fn expansion_factor(group_size: usize) -> f64 {
    match group_size {
        0 | 1 => 1.0,
        2 => 1.5,
        3 | 4 => 2.0,
        _ => 2.5,
    }
}

/// A report with its cluster-derived rendering overrides.
///
/// `rendered_radius_m` is a display-layer value only; the stored report
/// radius is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedReport {
    /// The underlying report, unmodified.
    pub report: FloodReport,
    /// Size of the intersection group this report landed in.
    pub group_size: usize,
    /// Expanded radius for rendering, rounded to whole meters.
    pub rendered_radius_m: f64,
}

/// Groups the active snapshot by transitive circle intersection and
/// computes each report's rendered radius.
///
/// Expired reports, reports outside the bounding box (when given), and
/// reports without valid coordinates are skipped entirely: they join no
/// group and count toward no group size. The newest `cap` reports (at
/// most [`MAX_CLUSTER_REPORTS`]) are considered.
#[must_use]
pub fn expand_clusters(
    reports: &[FloodReport],
    bbox: Option<&BoundingBox>,
    cap: Option<usize>,
    now: DateTime<Utc>,
) -> Vec<ExpandedReport> {
    let mut candidates: Vec<&FloodReport> = reports
        .iter()
        .filter(|r| r.is_active(now))
        .filter(|r| r.coordinates.is_valid())
        .filter(|r| bbox.is_none_or(|b| bounding_box_contains(b, &r.coordinates)))
        .collect();

    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    candidates.truncate(cap.unwrap_or(MAX_CLUSTER_REPORTS).min(MAX_CLUSTER_REPORTS));

    let mut expanded = Vec::with_capacity(candidates.len());
    for group in group_intersecting(&candidates) {
        let group_size = group.len();
        let factor = expansion_factor(group_size);
        for index in group {
            let report = candidates[index];
            expanded.push(ExpandedReport {
                report: report.clone(),
                group_size,
                rendered_radius_m: (report.radius_m * factor).round(),
            });
        }
    }

    expanded
}

/// Partitions reports into maximal groups whose circles transitively
/// intersect, using each report's original (pre-expansion) radius.
///
/// Every report lands in exactly one group; singletons are valid groups.
/// Group membership is independent of scan order.
fn group_intersecting(reports: &[&FloodReport]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; reports.len()];
    let mut groups = Vec::new();

    for seed in 0..reports.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut group = vec![seed];

        // Re-scan until a full pass adds nothing: a report joins when it
        // intersects ANY current member, so chains fold in transitively.
        loop {
            let mut added = false;
            for candidate in 0..reports.len() {
                if visited[candidate] {
                    continue;
                }
                if group
                    .iter()
                    .any(|&member| intersects(reports[member], reports[candidate]))
                {
                    visited[candidate] = true;
                    group.push(candidate);
                    added = true;
                }
            }
            if !added {
                break;
            }
        }

        groups.push(group);
    }

    groups
}

fn intersects(a: &FloodReport, b: &FloodReport) -> bool {
    circles_intersect(
        a.coordinates.latitude,
        a.coordinates.longitude,
        a.radius_m,
        b.coordinates.latitude,
        b.coordinates.longitude,
        b.radius_m,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Duration;
    use flood_map_report_models::{Coordinates, FloodDepth, FloodLevel, ReportStatus};
    use uuid::Uuid;

    use super::*;

    fn report_at(lat: f64, lng: f64, radius_m: f64) -> FloodReport {
        let now = Utc::now();
        FloodReport {
            id: Uuid::new_v4(),
            reporter_id: "user-1".to_string(),
            coordinates: Coordinates::new(lat, lng),
            address: String::new(),
            radius_m,
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

    fn find<'a>(expanded: &'a [ExpandedReport], id: Uuid) -> &'a ExpandedReport {
        expanded.iter().find(|e| e.report.id == id).unwrap()
    }

    #[test]
    fn expansion_factor_is_monotonic() {
        assert!((expansion_factor(1) - 1.0).abs() < f64::EPSILON);
        assert!((expansion_factor(2) - 1.5).abs() < f64::EPSILON);
        assert!((expansion_factor(3) - 2.0).abs() < f64::EPSILON);
        assert!((expansion_factor(4) - 2.0).abs() < f64::EPSILON);
        assert!((expansion_factor(5) - 2.5).abs() < f64::EPSILON);
        assert!((expansion_factor(50) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn transitive_chain_forms_one_group() {
        // A–B ~55m apart, B–C ~55m apart, A–C ~111m apart. With 30m radii
        // A intersects B and B intersects C, but A never touches C.
        let a = report_at(10.0, 106.0, 30.0);
        let b = report_at(10.0005, 106.0, 30.0);
        let c = report_at(10.001, 106.0, 30.0);
        let ids = [a.id, b.id, c.id];

        let expanded = expand_clusters(&[a, b, c], None, None, Utc::now());
        assert_eq!(expanded.len(), 3);
        for id in ids {
            let entry = find(&expanded, id);
            assert_eq!(entry.group_size, 3);
            assert!((entry.rendered_radius_m - 60.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn grouping_is_independent_of_scan_order() {
        let a = report_at(10.0, 106.0, 30.0);
        let b = report_at(10.0005, 106.0, 30.0);
        let c = report_at(10.001, 106.0, 30.0);

        // Chain endpoints first, middle link last.
        let expanded = expand_clusters(
            &[a.clone(), c.clone(), b.clone()],
            None,
            None,
            Utc::now(),
        );
        assert!(expanded.iter().all(|e| e.group_size == 3));
    }

    #[test]
    fn overlapping_pair_and_far_singleton() {
        // ~55m apart with 100m radii: one group of two, rendered at 150.
        let r1 = report_at(10.0, 106.0, 100.0);
        let r2 = report_at(10.0005, 106.0, 100.0);
        // ~7.8km away: alone, radius untouched.
        let r3 = report_at(10.05, 106.05, 100.0);
        let (id1, id2, id3) = (r1.id, r2.id, r3.id);

        let expanded = expand_clusters(&[r1, r2, r3], None, None, Utc::now());

        for id in [id1, id2] {
            let entry = find(&expanded, id);
            assert_eq!(entry.group_size, 2);
            assert!((entry.rendered_radius_m - 150.0).abs() < f64::EPSILON);
        }
        let single = find(&expanded, id3);
        assert_eq!(single.group_size, 1);
        assert!((single.rendered_radius_m - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn five_stacked_reports_get_the_top_factor() {
        let reports: Vec<FloodReport> =
            (0..5).map(|_| report_at(10.0, 106.0, 80.0)).collect();
        let expanded = expand_clusters(&reports, None, None, Utc::now());
        assert!(expanded.iter().all(|e| e.group_size == 5));
        assert!(
            expanded
                .iter()
                .all(|e| (e.rendered_radius_m - 200.0).abs() < f64::EPSILON)
        );
    }

    #[test]
    fn stored_radius_is_not_mutated() {
        let r1 = report_at(10.0, 106.0, 100.0);
        let r2 = report_at(10.0005, 106.0, 100.0);

        let expanded = expand_clusters(&[r1, r2], None, None, Utc::now());
        assert!(
            expanded
                .iter()
                .all(|e| (e.report.radius_m - 100.0).abs() < f64::EPSILON)
        );
    }

    #[test]
    fn invalid_coordinates_are_skipped_entirely() {
        let good_a = report_at(10.0, 106.0, 100.0);
        let good_b = report_at(10.0005, 106.0, 100.0);
        let mut bad = report_at(10.0002, 106.0, 100.0);
        bad.coordinates = Coordinates::new(f64::NAN, 106.0);
        let bad_id = bad.id;

        let expanded = expand_clusters(&[good_a, bad, good_b], None, None, Utc::now());
        assert_eq!(expanded.len(), 2);
        assert!(expanded.iter().all(|e| e.report.id != bad_id));
        // The skipped report doesn't inflate the group size either.
        assert!(expanded.iter().all(|e| e.group_size == 2));
    }

    #[test]
    fn expired_reports_are_skipped() {
        let reports = vec![report_at(10.0, 106.0, 100.0)];
        let later = Utc::now() + Duration::minutes(31);
        assert!(expand_clusters(&reports, None, None, later).is_empty());
    }

    #[test]
    fn bbox_limits_the_candidate_set() {
        let inside = report_at(10.5, 106.5, 100.0);
        let outside = report_at(21.03, 105.85, 100.0);
        let inside_id = inside.id;

        let bbox = BoundingBox::new(106.0, 10.0, 107.0, 11.0);
        let expanded = expand_clusters(&[inside, outside], Some(&bbox), None, Utc::now());
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].report.id, inside_id);
    }

    #[test]
    fn cap_keeps_the_newest_reports() {
        let mut old = report_at(10.0, 106.0, 100.0);
        old.created_at -= Duration::minutes(10);
        let new_a = report_at(12.0, 108.0, 100.0);
        let new_b = report_at(14.0, 110.0, 100.0);
        let old_id = old.id;

        let expanded = expand_clusters(&[old, new_a, new_b], None, Some(2), Utc::now());
        assert_eq!(expanded.len(), 2);
        assert!(expanded.iter().all(|e| e.report.id != old_id));
    }
}
