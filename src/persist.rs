use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::store::{default_roster, AppState, StoredState};

pub const KEY_ROSTER: &str = "staff_roster_v1";
pub const KEY_EVALUATIONS: &str = "evaluations_v3";
pub const KEY_QA: &str = "qa_records_v2";
pub const KEY_ASSESSMENTS: &str = "assessments_v2";
pub const KEY_SUBMISSIONS: &str = "test_submissions_v2";
pub const KEY_PEER_REVIEWS: &str = "peer_reviews_v1";
pub const KEY_SNAPSHOTS: &str = "monthly_snapshots_v1";
pub const KEY_PROJECT_SLA: &str = "project_sla_v2";
pub const KEY_OTHER_KPIS: &str = "other_kpis_v2";
pub const KEY_GROWTH: &str = "growth_metrics_v1";

pub const ALL_KEYS: [&str; 10] = [
    KEY_ROSTER,
    KEY_EVALUATIONS,
    KEY_QA,
    KEY_ASSESSMENTS,
    KEY_SUBMISSIONS,
    KEY_PEER_REVIEWS,
    KEY_SNAPSHOTS,
    KEY_PROJECT_SLA,
    KEY_OTHER_KPIS,
    KEY_GROWTH,
];

pub fn decode_or<T: DeserializeOwned>(key: &str, raw: Option<&str>, default: impl FnOnce() -> T) -> T {
    let Some(raw) = raw else {
        debug!(key, "no stored value, using default");
        return default();
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "stored value unreadable, using default");
            default()
        }
    }
}

/// Rebuilds the state from whatever `lookup` returns for each key.
pub fn decode_state<F>(lookup: F) -> AppState
where
    F: Fn(&str) -> Option<String>,
{
    fn field<T: DeserializeOwned + Default>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> T {
        decode_or(key, lookup(key).as_deref(), T::default)
    }

    let lookup: &dyn Fn(&str) -> Option<String> = &lookup;
    AppState::from(StoredState {
        roster: decode_or(KEY_ROSTER, lookup(KEY_ROSTER).as_deref(), default_roster),
        evaluations: field(lookup, KEY_EVALUATIONS),
        qa_records: field(lookup, KEY_QA),
        assessments: field(lookup, KEY_ASSESSMENTS),
        submissions: field(lookup, KEY_SUBMISSIONS),
        peer_reviews: field(lookup, KEY_PEER_REVIEWS),
        snapshots: field(lookup, KEY_SNAPSHOTS),
        project_sla: field(lookup, KEY_PROJECT_SLA),
        other_kpis: field(lookup, KEY_OTHER_KPIS),
        growth_metrics: field(lookup, KEY_GROWTH),
    })
}

fn entry<T: Serialize + ?Sized>(key: &'static str, value: &T) -> serde_json::Result<(&'static str, String)> {
    Ok((key, serde_json::to_string(value)?))
}

pub fn encode_state(state: &AppState) -> serde_json::Result<Vec<(&'static str, String)>> {
    Ok(vec![
        entry(KEY_ROSTER, state.roster())?,
        entry(KEY_EVALUATIONS, state.evaluations())?,
        entry(KEY_QA, state.qa_records())?,
        entry(KEY_ASSESSMENTS, state.assessments())?,
        entry(KEY_SUBMISSIONS, state.submissions())?,
        entry(KEY_PEER_REVIEWS, state.peer_reviews())?,
        entry(KEY_SNAPSHOTS, state.snapshots())?,
        entry(KEY_PROJECT_SLA, state.project_sla())?,
        entry(KEY_OTHER_KPIS, state.other_kpis())?,
        entry(KEY_GROWTH, state.growth_metrics())?,
    ])
}
