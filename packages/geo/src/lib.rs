#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geodesic math and in-memory spatial lookups for flood reports.
//!
//! Provides the haversine distance and circle-intersection primitives the
//! clustering engine is built on, plus an R-tree index over a report
//! snapshot for bounding-box and radius queries. The index is rebuilt per
//! request from the active-report snapshot; report sets are capped small
//! enough that construction cost is negligible.

use flood_map_report_models::{BoundingBox, Coordinates, FloodReport};
use geo::{Contains, Point, Rect, coord};
use rstar::{AABB, RTree, RTreeObject};

/// Mean Earth radius in meters, per the haversine convention.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate meters per degree of latitude, used to size envelope
/// prefilters before the exact geodesic check.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two points in meters (haversine).
///
/// Symmetric in its arguments; zero for identical points within
/// floating-point tolerance.
#[must_use]
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Whether two circles on the sphere overlap.
///
/// Strict inequality: circles that merely touch do not intersect.
#[must_use]
pub fn circles_intersect(
    a_lat: f64,
    a_lng: f64,
    a_radius_m: f64,
    b_lat: f64,
    b_lng: f64,
    b_radius_m: f64,
) -> bool {
    distance_meters(a_lat, a_lng, b_lat, b_lng) < a_radius_m + b_radius_m
}

/// Whether a point falls within an axis-aligned bounding box.
#[must_use]
pub fn bounding_box_contains(bbox: &BoundingBox, point: &Coordinates) -> bool {
    let rect = Rect::new(
        coord! { x: bbox.west, y: bbox.south },
        coord! { x: bbox.east, y: bbox.north },
    );
    rect.contains(&Point::new(point.longitude, point.latitude))
}

/// A report's position stored in the R-tree, keyed back to the snapshot by
/// slice index.
struct ReportEntry {
    index: usize,
    /// `[lng, lat]` to match the x/y convention of the envelope.
    position: [f64; 2],
}

impl RTreeObject for ReportEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// R-tree index over one snapshot of flood reports.
///
/// Reports with invalid coordinates are left out of the tree entirely.
/// Query results are indices into the snapshot slice the index was built
/// from.
pub struct ReportSpatialIndex {
    tree: RTree<ReportEntry>,
}

impl ReportSpatialIndex {
    /// Builds an index over the given snapshot.
    #[must_use]
    pub fn new(reports: &[FloodReport]) -> Self {
        Self::from_positions(reports.iter().map(|r| r.coordinates))
    }

    /// Builds an index over a snapshot of borrowed reports.
    #[must_use]
    pub fn new_from_refs(reports: &[&FloodReport]) -> Self {
        Self::from_positions(reports.iter().map(|r| r.coordinates))
    }

    fn from_positions(positions: impl Iterator<Item = Coordinates>) -> Self {
        let entries = positions
            .enumerate()
            .filter(|(_, c)| c.is_valid())
            .map(|(index, c)| ReportEntry {
                index,
                position: [c.longitude, c.latitude],
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Snapshot indices of reports inside the bounding box.
    #[must_use]
    pub fn within_bounds(&self, bbox: &BoundingBox) -> Vec<usize> {
        let envelope =
            AABB::from_corners([bbox.west, bbox.south], [bbox.east, bbox.north]);

        self.tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.index)
            .collect()
    }

    /// Snapshot indices of reports within `radius_m` meters of a point,
    /// by true geodesic distance.
    ///
    /// The R-tree narrows candidates with a degree-padded envelope, then
    /// each candidate is checked with the exact haversine distance.
    #[must_use]
    pub fn within_distance(&self, lat: f64, lng: f64, radius_m: f64) -> Vec<usize> {
        let lat_delta = radius_m / METERS_PER_DEGREE;
        // Longitude degrees shrink with latitude; clamp the cosine so the
        // envelope stays finite near the poles.
        let lng_delta = radius_m / (METERS_PER_DEGREE * lat.to_radians().cos().max(0.01));

        let envelope = AABB::from_corners(
            [lng - lng_delta, lat - lat_delta],
            [lng + lng_delta, lat + lat_delta],
        );

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| {
                distance_meters(lat, lng, entry.position[1], entry.position[0]) <= radius_m
            })
            .map(|entry| entry.index)
            .collect()
    }
}
