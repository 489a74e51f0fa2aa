//! Approved-product search metrics.
//!
//! A search runs in up to three stages; each is timed separately so a slow
//! facility lookup can be told apart from a slow hydration.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

pub(crate) fn describe() {
    use metrics::{describe_counter, describe_histogram};

    describe_histogram!(
        "referencedata_search_stage_duration_seconds",
        "Duration of each approved-product search stage"
    );
    describe_counter!(
        "referencedata_search_total",
        "Approved-product searches by outcome"
    );
    describe_histogram!(
        "referencedata_search_matches",
        "Identities matched per search before paging"
    );
    describe_histogram!(
        "referencedata_search_results",
        "Entities returned per search page"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    FacilityTypeLookup,
    ResolveIdentities,
    Hydrate,
}

impl SearchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FacilityTypeLookup => "facility_type_lookup",
            Self::ResolveIdentities => "resolve_identities",
            Self::Hydrate => "hydrate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Success,
    NotFound,
    Invalid,
    Failed,
}

impl SearchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Failed => "failed",
        }
    }
}

/// Measures one stage from creation until [`StageTimer::finish`].
///
/// A timer dropped without `finish` records nothing; stages that error out
/// are visible through [`SearchMetrics::record_search`] instead.
#[must_use = "call finish() to record the stage"]
pub struct StageTimer {
    stage: SearchStage,
    started: Instant,
}

impl StageTimer {
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        histogram!(
            "referencedata_search_stage_duration_seconds",
            "stage" => self.stage.as_str()
        )
        .record(elapsed.as_secs_f64());

        tracing::debug!(
            stage = self.stage.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Search stage finished"
        );
        elapsed
    }
}

pub struct SearchMetrics;

impl SearchMetrics {
    pub fn stage(stage: SearchStage) -> StageTimer {
        StageTimer {
            stage,
            started: Instant::now(),
        }
    }

    /// Record a completed search with its total match count and page size.
    pub fn record_search(outcome: SearchOutcome, total: u64, returned: usize) {
        counter!("referencedata_search_total", "outcome" => outcome.as_str()).increment(1);

        if outcome == SearchOutcome::Success {
            histogram!("referencedata_search_matches").record(total as f64);
            histogram!("referencedata_search_results").record(returned as f64);
        }
    }
}
