#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Domain types for crowd-sourced flood reports.
//!
//! This crate defines the canonical report entity and its severity/depth
//! taxonomy, shared by the store, the read-side map views, and the API
//! server. The types here carry no behavior beyond lifecycle predicates;
//! all mutation goes through `flood_map_store`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Reported flood severity, from 1 (nuisance water) to 3 (dangerous).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodLevel {
    /// Level 1: Puddling, passable on foot
    Low = 1,
    /// Level 2: Sustained standing water, slows traffic
    Medium = 2,
    /// Level 3: Deep or fast-moving water, impassable
    High = 3,
}

impl FloodLevel {
    /// Returns the numeric value of this level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-3.
    pub const fn from_value(value: u8) -> Result<Self, InvalidLevelError> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            _ => Err(InvalidLevelError { value }),
        }
    }
}

/// Error returned when attempting to create a [`FloodLevel`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLevelError {
    /// The invalid level value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid flood level {}: expected 1-3", self.value)
    }
}

impl std::error::Error for InvalidLevelError {}

/// Observed water depth, measured against everyday street references.
///
/// Ordered by severity: ankle < knee < bike seat.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodDepth {
    /// Water up to the ankle
    Ankle = 1,
    /// Water up to the knee
    Knee = 2,
    /// Water up to a motorbike seat
    BikeSeat = 3,
}

impl FloodDepth {
    /// Returns the numeric value of this depth.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a depth from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-3.
    pub const fn from_value(value: u8) -> Result<Self, InvalidDepthError> {
        match value {
            1 => Ok(Self::Ankle),
            2 => Ok(Self::Knee),
            3 => Ok(Self::BikeSeat),
            _ => Err(InvalidDepthError { value }),
        }
    }
}

/// Error returned when attempting to create a [`FloodDepth`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDepthError {
    /// The invalid depth value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidDepthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid flood depth {}: expected 1-3", self.value)
    }
}

impl std::error::Error for InvalidDepthError {}

/// Lifecycle state of a report.
///
/// `Resolved` and `FalseAlarm` are terminal: further vote or status
/// mutations against a terminal report are benign no-ops.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Report is live and counted in map views.
    Active,
    /// Community resolve-vote quorum was reached.
    Resolved,
    /// Moderation marked the report as incorrect.
    FalseAlarm,
}

impl ReportStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::FalseAlarm)
    }
}

/// Direction of a credibility vote on a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteDirection {
    /// The voter confirms the report.
    Up,
    /// The voter disputes the report.
    Down,
}

/// A geographic point in WGS84 coordinates.
///
/// The single coordinate shape used everywhere past the system boundary.
/// Handlers normalize whatever the client sent into this before anything
/// else sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }
}

/// One user's vote to mark a report as resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVote {
    /// The voting user.
    pub user_id: String,
    /// When the vote was cast.
    pub voted_at: DateTime<Utc>,
}

/// A user-submitted observation of flooding at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodReport {
    /// Unique report ID, assigned at creation.
    pub id: Uuid,
    /// The submitting user. Back-reference only; the report does not own
    /// the user record.
    pub reporter_id: String,
    /// Where the flooding was observed. Immutable after creation.
    pub coordinates: Coordinates,
    /// Free-form street address for display.
    pub address: String,
    /// Affected radius in meters as submitted (pre-expansion).
    pub radius_m: f64,
    /// Reported severity.
    pub level: FloodLevel,
    /// Observed water depth.
    pub depth: FloodDepth,
    /// What the reporter saw.
    pub description: String,
    /// Photo URIs attached at creation. Opaque to this subsystem.
    pub images: Vec<String>,
    /// Hex-grid cell containing the coordinates, computed once at creation.
    /// `None` when the spatial-index collaborator was unavailable; such
    /// reports are excluded from hexagon aggregation but appear in every
    /// other view.
    pub cell_id: Option<String>,
    /// Snapshot of the reporter's trust score at creation time.
    pub reporter_trust_score: f64,
    /// Aggregate trust behind this report. Currently equal to
    /// [`Self::reporter_trust_score`]; kept separate so vote-weighted
    /// scoring can land without a data migration.
    pub total_trust_score: f64,
    /// Users who confirmed the report. Disjoint from `downvotes`.
    pub upvotes: BTreeSet<String>,
    /// Users who disputed the report. Disjoint from `upvotes`.
    pub downvotes: BTreeSet<String>,
    /// Resolve votes in the order they were cast, at most one per user.
    pub resolved_votes: Vec<ResolvedVote>,
    /// Lifecycle state.
    pub status: ReportStatus,
    /// When the report was submitted.
    pub created_at: DateTime<Utc>,
    /// When the resolve-vote quorum was reached, if it was.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Fixed expiry deadline: creation time plus the report TTL. Never
    /// extended by later activity.
    pub expires_at: DateTime<Utc>,
}

impl FloodReport {
    /// Whether this report should be visible in active-set views at `now`.
    ///
    /// Expiry is evaluated here at read time; an expired report keeps
    /// whatever `status` it had, it just stops matching.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == ReportStatus::Active && self.expires_at > now
    }
}
