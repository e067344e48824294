#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory flood report store.
//!
//! Owns the report lifecycle: creation with validation and collaborator
//! enrichment, credibility voting, community resolution voting with a
//! fixed quorum, and read-time TTL filtering. Durable persistence lives
//! behind the marketplace's storage layer; this store is the authoritative
//! working set the map views are computed from.
//!
//! Mutations are serialized per report: each report sits behind its own
//! mutex, so two concurrent resolve votes on the same report cannot both
//! miss the quorum threshold, while votes on different reports never
//! contend. Reads clone snapshots and never hold a report lock across any
//! aggregate computation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use flood_map_hexgrid::CellResolver;
use flood_map_report_models::{
    Coordinates, FloodDepth, FloodLevel, FloodReport, ReportStatus, ResolvedVote, VoteDirection,
};
use uuid::Uuid;

/// How long a report stays visible after creation. Fixed at creation,
/// never extended by later activity.
pub const REPORT_TTL_MINUTES: i64 = 30;

/// Distinct resolve votes required to auto-transition a report to
/// `Resolved`.
pub const RESOLVE_QUORUM: usize = 3;

/// Affected radius assigned when the reporter does not supply one.
pub const DEFAULT_REPORT_RADIUS_M: f64 = 100.0;

/// Trust score assumed when the trust provider cannot resolve one.
pub const DEFAULT_TRUST_SCORE: f64 = 1.0;

/// Errors that can occur during report store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field was missing or out of range.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what went wrong.
        message: String,
    },

    /// The referenced report does not exist.
    #[error("Report not found: {id}")]
    NotFound {
        /// The unknown report id.
        id: Uuid,
    },
}

/// Error returned when a trust score cannot be resolved.
///
/// Absorbed inside [`ReportStore::create`]: a failed lookup falls back to
/// [`DEFAULT_TRUST_SCORE`] instead of failing the submission.
#[derive(Debug, thiserror::Error)]
#[error("Trust score unavailable: {message}")]
pub struct TrustError {
    /// Description of what went wrong.
    pub message: String,
}

/// Supplies per-user reputation scores at report creation time.
///
/// The score is copied onto the report as a snapshot; later reputation
/// changes do not retroactively reweight existing reports.
pub trait TrustProvider: Send + Sync {
    /// Returns the current trust score for a user.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError`] if the score cannot be resolved.
    fn trust_score(&self, user_id: &str) -> Result<f64, TrustError>;
}

/// Trust provider backed by an in-memory score table.
///
/// Users without an entry get [`DEFAULT_TRUST_SCORE`]: a fresh account
/// has baseline trust, not zero.
#[derive(Debug, Default)]
pub struct InMemoryTrustProvider {
    scores: RwLock<BTreeMap<String, f64>>,
}

impl InMemoryTrustProvider {
    /// Sets the score for a user, replacing any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the score table lock is poisoned.
    pub fn set_score(&self, user_id: &str, score: f64) {
        self.scores
            .write()
            .expect("trust score lock poisoned")
            .insert(user_id.to_string(), score);
    }
}

impl TrustProvider for InMemoryTrustProvider {
    fn trust_score(&self, user_id: &str) -> Result<f64, TrustError> {
        Ok(self
            .scores
            .read()
            .expect("trust score lock poisoned")
            .get(user_id)
            .copied()
            .unwrap_or(DEFAULT_TRUST_SCORE))
    }
}

/// Caller-supplied fields for a new flood report.
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    /// The submitting user.
    pub reporter_id: String,
    /// Latitude of the observation.
    pub latitude: f64,
    /// Longitude of the observation.
    pub longitude: f64,
    /// Free-form street address for display.
    pub address: String,
    /// Affected radius in meters; [`DEFAULT_REPORT_RADIUS_M`] if absent.
    pub radius_m: Option<f64>,
    /// Reported severity.
    pub level: FloodLevel,
    /// Observed water depth.
    pub depth: FloodDepth,
    /// What the reporter saw.
    pub description: String,
    /// Photo URIs from the media-upload service. Opaque here.
    pub images: Vec<String>,
}

/// The flood report working set.
///
/// Holds every report submitted this process lifetime; expired reports
/// stay in the map and are filtered out at read time. At a 30 minute TTL
/// and city-scale submission rates the retained set stays small, so no
/// background reaper runs.
pub struct ReportStore {
    reports: RwLock<BTreeMap<Uuid, Arc<Mutex<FloodReport>>>>,
    cells: Arc<dyn CellResolver>,
    trust: Arc<dyn TrustProvider>,
}

impl ReportStore {
    /// Creates an empty store wired to its collaborators.
    #[must_use]
    pub fn new(cells: Arc<dyn CellResolver>, trust: Arc<dyn TrustProvider>) -> Self {
        Self {
            reports: RwLock::new(BTreeMap::new()),
            cells,
            trust,
        }
    }

    /// Validates and stores a new report.
    ///
    /// The trust score and hex cell come from collaborators; both degrade
    /// (default score, no cell id) rather than failing the submission.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the description is empty, the
    /// radius is not positive, or the coordinates are out of range.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn create(&self, input: CreateReportInput) -> Result<FloodReport, StoreError> {
        let coordinates = Coordinates::new(input.latitude, input.longitude);
        validate(&input, &coordinates)?;

        let now = Utc::now();

        let trust_score = match self.trust.trust_score(&input.reporter_id) {
            Ok(score) => score,
            Err(e) => {
                log::warn!(
                    "Trust lookup failed for {}, using default: {e}",
                    input.reporter_id
                );
                DEFAULT_TRUST_SCORE
            }
        };

        let cell_id = match self.cells.cell_for(input.latitude, input.longitude) {
            Ok(cell) => Some(cell),
            Err(e) => {
                log::warn!("Cell lookup failed, storing report without cell id: {e}");
                None
            }
        };

        let report = FloodReport {
            id: Uuid::new_v4(),
            reporter_id: input.reporter_id,
            coordinates,
            address: input.address,
            radius_m: input.radius_m.unwrap_or(DEFAULT_REPORT_RADIUS_M),
            level: input.level,
            depth: input.depth,
            description: input.description,
            images: input.images,
            cell_id,
            reporter_trust_score: trust_score,
            total_trust_score: trust_score,
            upvotes: BTreeSet::new(),
            downvotes: BTreeSet::new(),
            resolved_votes: Vec::new(),
            status: ReportStatus::Active,
            created_at: now,
            resolved_at: None,
            expires_at: now + Duration::minutes(REPORT_TTL_MINUTES),
        };

        self.reports
            .write()
            .expect("report store lock poisoned")
            .insert(report.id, Arc::new(Mutex::new(report.clone())));

        Ok(report)
    }

    /// Casts or switches a credibility vote.
    ///
    /// A user appears in at most one of the two vote sets: any prior vote
    /// by the same user is removed before the new one is recorded. Voting
    /// on a terminal report is a benign no-op returning current state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no report has the given id.
    ///
    /// # Panics
    ///
    /// Panics if the store or report lock is poisoned.
    pub fn vote(
        &self,
        report_id: Uuid,
        user_id: &str,
        direction: VoteDirection,
    ) -> Result<FloodReport, StoreError> {
        let entry = self.entry(report_id)?;
        let mut report = entry.lock().expect("report lock poisoned");

        if report.status.is_terminal() {
            return Ok(report.clone());
        }

        report.upvotes.remove(user_id);
        report.downvotes.remove(user_id);
        match direction {
            VoteDirection::Up => report.upvotes.insert(user_id.to_string()),
            VoteDirection::Down => report.downvotes.insert(user_id.to_string()),
        };

        Ok(report.clone())
    }

    /// Casts a resolve vote, transitioning the report to `Resolved` when
    /// the quorum of [`RESOLVE_QUORUM`] distinct voters is reached.
    ///
    /// A duplicate vote from the same user, or any vote against a terminal
    /// report, is a benign no-op returning current state. The quorum check
    /// and the status transition happen under the same report lock, so
    /// concurrent votes cannot both observe a pre-quorum count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no report has the given id.
    ///
    /// # Panics
    ///
    /// Panics if the store or report lock is poisoned.
    pub fn cast_resolved_vote(
        &self,
        report_id: Uuid,
        user_id: &str,
    ) -> Result<FloodReport, StoreError> {
        let entry = self.entry(report_id)?;
        let mut report = entry.lock().expect("report lock poisoned");

        if report.status.is_terminal() {
            return Ok(report.clone());
        }
        if report.resolved_votes.iter().any(|v| v.user_id == user_id) {
            return Ok(report.clone());
        }

        let now = Utc::now();
        report.resolved_votes.push(ResolvedVote {
            user_id: user_id.to_string(),
            voted_at: now,
        });

        if report.resolved_votes.len() >= RESOLVE_QUORUM {
            report.status = ReportStatus::Resolved;
            report.resolved_at = Some(now);
            log::info!(
                "Report {} resolved by community quorum ({} votes)",
                report.id,
                report.resolved_votes.len()
            );
        }

        Ok(report.clone())
    }

    /// Returns a snapshot of all reports active at `now`.
    ///
    /// Each report's lock is held only long enough to clone it, so callers
    /// can run aggregate computations over the snapshot without blocking
    /// writers.
    ///
    /// # Panics
    ///
    /// Panics if the store or a report lock is poisoned.
    #[must_use]
    pub fn list_active(&self, now: DateTime<Utc>) -> Vec<FloodReport> {
        self.reports
            .read()
            .expect("report store lock poisoned")
            .values()
            .filter_map(|entry| {
                let report = entry.lock().expect("report lock poisoned");
                report.is_active(now).then(|| report.clone())
            })
            .collect()
    }

    /// Returns a snapshot of a single report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no report has the given id.
    ///
    /// # Panics
    ///
    /// Panics if the store or report lock is poisoned.
    pub fn get(&self, report_id: Uuid) -> Result<FloodReport, StoreError> {
        let entry = self.entry(report_id)?;
        let report = entry.lock().expect("report lock poisoned");
        Ok(report.clone())
    }

    /// Clones the shared handle for a report so the store lock is released
    /// before the report lock is taken.
    fn entry(&self, report_id: Uuid) -> Result<Arc<Mutex<FloodReport>>, StoreError> {
        self.reports
            .read()
            .expect("report store lock poisoned")
            .get(&report_id)
            .cloned()
            .ok_or(StoreError::NotFound { id: report_id })
    }
}

fn validate(input: &CreateReportInput, coordinates: &Coordinates) -> Result<(), StoreError> {
    if input.description.trim().is_empty() {
        return Err(StoreError::Validation {
            message: "description must not be empty".to_string(),
        });
    }
    if !coordinates.is_valid() {
        return Err(StoreError::Validation {
            message: format!(
                "coordinates out of range: lat {}, lng {}",
                input.latitude, input.longitude
            ),
        });
    }
    if let Some(radius) = input.radius_m {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(StoreError::Validation {
                message: format!("radius must be a positive number of meters, got {radius}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use flood_map_hexgrid::CellError;

    use super::*;

    struct StubCellResolver;

    impl CellResolver for StubCellResolver {
        fn cell_for(&self, _lat: f64, _lng: f64) -> Result<String, CellError> {
            Ok("8a65a212a747fff".to_string())
        }

        fn boundary(&self, cell_id: &str) -> Result<Vec<Coordinates>, CellError> {
            Err(CellError::UnknownCell {
                id: cell_id.to_string(),
            })
        }

        fn center(&self, cell_id: &str) -> Result<Coordinates, CellError> {
            Err(CellError::UnknownCell {
                id: cell_id.to_string(),
            })
        }
    }

    struct FailingCellResolver;

    impl CellResolver for FailingCellResolver {
        fn cell_for(&self, _lat: f64, _lng: f64) -> Result<String, CellError> {
            Err(CellError::InvalidCoordinates {
                message: "resolver offline".to_string(),
            })
        }

        fn boundary(&self, cell_id: &str) -> Result<Vec<Coordinates>, CellError> {
            Err(CellError::UnknownCell {
                id: cell_id.to_string(),
            })
        }

        fn center(&self, cell_id: &str) -> Result<Coordinates, CellError> {
            Err(CellError::UnknownCell {
                id: cell_id.to_string(),
            })
        }
    }

    struct FailingTrustProvider;

    impl TrustProvider for FailingTrustProvider {
        fn trust_score(&self, user_id: &str) -> Result<f64, TrustError> {
            Err(TrustError {
                message: format!("no reputation service for {user_id}"),
            })
        }
    }

    fn store() -> ReportStore {
        ReportStore::new(
            Arc::new(StubCellResolver),
            Arc::new(InMemoryTrustProvider::default()),
        )
    }

    fn input() -> CreateReportInput {
        CreateReportInput {
            reporter_id: "user-1".to_string(),
            latitude: 10.762,
            longitude: 106.660,
            address: "227 Nguyen Van Cu".to_string(),
            radius_m: None,
            level: FloodLevel::Medium,
            depth: FloodDepth::Knee,
            description: "knee-deep water at the alley entrance".to_string(),
            images: Vec::new(),
        }
    }

    #[test]
    fn create_applies_defaults() {
        let report = store().create(input()).unwrap();
        assert!((report.radius_m - DEFAULT_REPORT_RADIUS_M).abs() < f64::EPSILON);
        assert!((report.reporter_trust_score - 1.0).abs() < f64::EPSILON);
        assert!((report.total_trust_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.status, ReportStatus::Active);
        assert_eq!(report.cell_id.as_deref(), Some("8a65a212a747fff"));
        assert_eq!(
            report.expires_at,
            report.created_at + Duration::minutes(REPORT_TTL_MINUTES)
        );
    }

    #[test]
    fn create_snapshots_trust_score() {
        let trust = Arc::new(InMemoryTrustProvider::default());
        trust.set_score("user-1", 4.5);
        let store = ReportStore::new(Arc::new(StubCellResolver), trust.clone());

        let report = store.create(input()).unwrap();
        assert!((report.reporter_trust_score - 4.5).abs() < f64::EPSILON);

        // Later reputation changes don't touch the stored snapshot.
        trust.set_score("user-1", 0.5);
        let same = store.get(report.id).unwrap();
        assert!((same.reporter_trust_score - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn create_defaults_trust_when_provider_fails() {
        let store = ReportStore::new(Arc::new(StubCellResolver), Arc::new(FailingTrustProvider));
        let report = store.create(input()).unwrap();
        assert!((report.reporter_trust_score - DEFAULT_TRUST_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn create_degrades_without_cell_resolver() {
        let store = ReportStore::new(
            Arc::new(FailingCellResolver),
            Arc::new(InMemoryTrustProvider::default()),
        );
        let report = store.create(input()).unwrap();
        assert_eq!(report.cell_id, None);
    }

    #[test]
    fn create_rejects_empty_description() {
        let mut bad = input();
        bad.description = "   ".to_string();
        assert!(matches!(
            store().create(bad),
            Err(StoreError::Validation { .. })
        ));
    }

    #[test]
    fn create_rejects_out_of_range_coordinates() {
        let mut bad = input();
        bad.latitude = 91.0;
        assert!(matches!(
            store().create(bad),
            Err(StoreError::Validation { .. })
        ));

        let mut bad = input();
        bad.longitude = -181.0;
        assert!(matches!(
            store().create(bad),
            Err(StoreError::Validation { .. })
        ));
    }

    #[test]
    fn create_rejects_non_positive_radius() {
        let mut bad = input();
        bad.radius_m = Some(0.0);
        assert!(matches!(
            store().create(bad),
            Err(StoreError::Validation { .. })
        ));
    }

    #[test]
    fn vote_is_exclusive_per_user() {
        let store = store();
        let report = store.create(input()).unwrap();

        store.vote(report.id, "voter-1", VoteDirection::Up).unwrap();
        let after = store
            .vote(report.id, "voter-1", VoteDirection::Down)
            .unwrap();

        assert!(!after.upvotes.contains("voter-1"));
        assert!(after.downvotes.contains("voter-1"));
    }

    #[test]
    fn vote_unknown_report_is_not_found() {
        let err = store()
            .vote(Uuid::new_v4(), "voter-1", VoteDirection::Up)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn resolve_quorum_transitions_status() {
        let store = store();
        let report = store.create(input()).unwrap();

        let after_one = store.cast_resolved_vote(report.id, "voter-1").unwrap();
        assert_eq!(after_one.status, ReportStatus::Active);
        let after_two = store.cast_resolved_vote(report.id, "voter-2").unwrap();
        assert_eq!(after_two.status, ReportStatus::Active);
        assert_eq!(after_two.resolved_votes.len(), 2);

        let resolved = store.cast_resolved_vote(report.id, "voter-3").unwrap();
        assert_eq!(resolved.status, ReportStatus::Resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolved_votes.len(), 3);
    }

    #[test]
    fn duplicate_resolve_vote_is_a_no_op() {
        let store = store();
        let report = store.create(input()).unwrap();

        store.cast_resolved_vote(report.id, "voter-1").unwrap();
        let repeat = store.cast_resolved_vote(report.id, "voter-1").unwrap();
        assert_eq!(repeat.resolved_votes.len(), 1);
        assert_eq!(repeat.status, ReportStatus::Active);
    }

    #[test]
    fn votes_after_resolution_are_no_ops() {
        let store = store();
        let report = store.create(input()).unwrap();
        for voter in ["voter-1", "voter-2", "voter-3"] {
            store.cast_resolved_vote(report.id, voter).unwrap();
        }

        let fourth = store.cast_resolved_vote(report.id, "voter-4").unwrap();
        assert_eq!(fourth.resolved_votes.len(), 3);
        assert_eq!(fourth.status, ReportStatus::Resolved);

        let vote = store.vote(report.id, "voter-4", VoteDirection::Up).unwrap();
        assert!(vote.upvotes.is_empty());
    }

    #[test]
    fn list_active_filters_by_status_and_expiry() {
        let store = store();
        let kept = store.create(input()).unwrap();
        let resolved = store.create(input()).unwrap();
        for voter in ["voter-1", "voter-2", "voter-3"] {
            store.cast_resolved_vote(resolved.id, voter).unwrap();
        }

        let now = Utc::now();
        let active = store.list_active(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept.id);

        // Past the TTL the remaining report drops out too, even though its
        // stored status is still Active.
        let later = now + Duration::minutes(REPORT_TTL_MINUTES + 1);
        assert!(store.list_active(later).is_empty());
        assert_eq!(store.get(kept.id).unwrap().status, ReportStatus::Active);
    }

    #[test]
    fn get_unknown_report_is_not_found() {
        assert!(matches!(
            store().get(Uuid::new_v4()),
            Err(StoreError::NotFound { .. })
        ));
    }
}
