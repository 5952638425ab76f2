use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate;
use crate::models::MonthlySnapshotRecord;
use crate::store::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Saved,
    Replaced,
    /// A snapshot for the month already existed and overwrite was declined.
    Kept,
}

/// "October 2026"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Captures the live KPI scalars and overall score under this month's label.
///
/// `confirm_overwrite` is consulted only when the label is already taken.
pub fn save_snapshot(
    state: &mut AppState,
    now: DateTime<Utc>,
    confirm_overwrite: impl FnOnce(&str) -> bool,
) -> SnapshotOutcome {
    let label = month_label(now.date_naive());
    let exists = state.snapshots().iter().any(|snapshot| snapshot.label == label);
    if exists && !confirm_overwrite(&label) {
        warn!(%label, "snapshot overwrite declined");
        return SnapshotOutcome::Kept;
    }

    let stats = aggregate::global_stats(state);
    let snapshot = MonthlySnapshotRecord {
        id: Uuid::new_v4(),
        label: label.clone(),
        saved_at: now,
        project_sla: *state.project_sla(),
        other_kpis: *state.other_kpis(),
        growth_metrics: *state.growth_metrics(),
        overall_score: stats.overall_perf,
    };
    let replaced = state.put_snapshot(snapshot);
    info!(%label, overall = stats.overall_perf, replaced, "monthly snapshot saved");
    if replaced {
        SnapshotOutcome::Replaced
    } else {
        SnapshotOutcome::Saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SlaCategory, SlaCounter};
    use chrono::TimeZone;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, 17, 0, 0).unwrap()
    }

    #[test]
    fn label_is_month_name_and_year() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(month_label(date), "October 2026");
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut state = AppState::default();
        let counter = SlaCounter { total: 40, met: 38, target: 95 };
        state.set_sla(SlaCategory::Ai, counter);
        state.set_csat_rating(4.5).unwrap();

        assert_eq!(save_snapshot(&mut state, at(5, 1), |_| true), SnapshotOutcome::Saved);

        state.set_sla(SlaCategory::Ai, SlaCounter { total: 1, met: 0, target: 50 });
        state.set_csat_rating(1.0).unwrap();

        let saved = &state.snapshots()[0];
        assert_eq!(saved.project_sla.ai, counter);
        assert_eq!(saved.other_kpis.csat.met, 4.5);
        assert_eq!(saved.label, "May 2026");
    }

    #[test]
    fn same_month_replaces_only_when_confirmed() {
        let mut state = AppState::default();
        save_snapshot(&mut state, at(5, 1), |_| true);
        state.set_csat_rating(5.0).unwrap();

        let mut asked = None;
        let outcome = save_snapshot(&mut state, at(5, 20), |label| {
            asked = Some(label.to_string());
            false
        });
        assert_eq!(outcome, SnapshotOutcome::Kept);
        assert_eq!(asked.as_deref(), Some("May 2026"));
        assert_eq!(state.snapshots().len(), 1);
        assert_eq!(state.snapshots()[0].other_kpis.csat.met, 0.0);

        let outcome = save_snapshot(&mut state, at(5, 21), |_| true);
        assert_eq!(outcome, SnapshotOutcome::Replaced);
        assert_eq!(state.snapshots().len(), 1);
        assert_eq!(state.snapshots()[0].other_kpis.csat.met, 5.0);
    }

    #[test]
    fn new_months_are_prepended() {
        let mut state = AppState::default();
        save_snapshot(&mut state, at(5, 1), |_| true);
        save_snapshot(&mut state, at(6, 1), |_| true);
        let labels: Vec<&str> = state.snapshots().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["June 2026", "May 2026"]);
    }

    #[test]
    fn first_save_never_asks_for_confirmation() {
        let mut state = AppState::default();
        let outcome = save_snapshot(&mut state, at(7, 1), |_| panic!("no prompt expected"));
        assert_eq!(outcome, SnapshotOutcome::Saved);
    }
}
