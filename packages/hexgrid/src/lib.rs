#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hex-grid cell resolution behind a collaborator trait.
//!
//! Reports are bucketed into hexagonal cells so the zone aggregator can
//! group nearby reports without a pairwise distance scan. The resolver is
//! a trait so the rest of the system never depends on H3 directly. When
//! the resolver fails, callers degrade (no cell id on the report, no
//! polygon on the zone) instead of failing the request, so resolver
//! errors never cross a public API boundary.

use std::str::FromStr;

use flood_map_report_models::Coordinates;
use h3o::{CellIndex, LatLng, Resolution};

/// Cell resolution used for report bucketing (~66 m hexagon edge).
///
/// Fine enough that one cell covers roughly a city block. Reports keep the
/// cell id computed at creation for their whole life, so changing this
/// constant only affects new reports.
pub const CELL_RESOLUTION: Resolution = Resolution::Ten;

/// Errors from the hex-grid collaborator.
///
/// Internal only: call sites absorb these and degrade rather than
/// propagating them to API callers.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    /// The coordinates cannot be mapped to a cell.
    #[error("Invalid coordinates for cell lookup: {message}")]
    InvalidCoordinates {
        /// Description of what went wrong.
        message: String,
    },

    /// The cell id string is not a valid cell index.
    #[error("Unrecognized cell id: {id}")]
    UnknownCell {
        /// The offending cell id.
        id: String,
    },
}

/// Maps coordinates to hex-grid cells and cells back to geometry.
pub trait CellResolver: Send + Sync {
    /// Returns the cell id containing the given point.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if the coordinates cannot be indexed.
    fn cell_for(&self, lat: f64, lng: f64) -> Result<String, CellError>;

    /// Returns the boundary polygon of a cell as a ring of coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if the cell id is not recognized.
    fn boundary(&self, cell_id: &str) -> Result<Vec<Coordinates>, CellError>;

    /// Returns the center point of a cell.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if the cell id is not recognized.
    fn center(&self, cell_id: &str) -> Result<Coordinates, CellError>;
}

/// Production resolver backed by the H3 hierarchical hex grid.
///
/// Cell ids are the canonical lowercase-hex H3 index strings.
#[derive(Debug, Clone, Copy)]
pub struct H3CellResolver {
    resolution: Resolution,
}

impl H3CellResolver {
    /// Creates a resolver at the given resolution.
    #[must_use]
    pub const fn with_resolution(resolution: Resolution) -> Self {
        Self { resolution }
    }

    fn parse_cell(cell_id: &str) -> Result<CellIndex, CellError> {
        CellIndex::from_str(cell_id).map_err(|_| CellError::UnknownCell {
            id: cell_id.to_string(),
        })
    }
}

impl Default for H3CellResolver {
    fn default() -> Self {
        Self::with_resolution(CELL_RESOLUTION)
    }
}

impl CellResolver for H3CellResolver {
    fn cell_for(&self, lat: f64, lng: f64) -> Result<String, CellError> {
        let coord = LatLng::new(lat, lng).map_err(|e| CellError::InvalidCoordinates {
            message: e.to_string(),
        })?;
        Ok(coord.to_cell(self.resolution).to_string())
    }

    fn boundary(&self, cell_id: &str) -> Result<Vec<Coordinates>, CellError> {
        let cell = Self::parse_cell(cell_id)?;
        Ok(cell
            .boundary()
            .iter()
            .map(|vertex| Coordinates::new(vertex.lat(), vertex.lng()))
            .collect())
    }

    fn center(&self, cell_id: &str) -> Result<Coordinates, CellError> {
        let cell = Self::parse_cell(cell_id)?;
        let center = LatLng::from(cell);
        Ok(Coordinates::new(center.lat(), center.lng()))
    }
}
