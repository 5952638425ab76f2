use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::access;
use crate::error::ScorecardError;
use crate::models::AssessmentRecord;
use crate::scoring;
use crate::store::AppState;

const EXAM_LINK_KEY: &str = "take-exam";

pub fn exam_link(assessment_id: Uuid) -> String {
    format!("#{EXAM_LINK_KEY}={assessment_id}")
}

/// Accepts `#take-exam=<uuid>`, `take-exam=<uuid>`, a full URL ending in that
/// fragment, or a bare uuid.
pub fn parse_exam_link(link: &str) -> Option<Uuid> {
    let fragment = link.rsplit_once('#').map_or(link, |(_, fragment)| fragment);
    let value = fragment
        .strip_prefix(EXAM_LINK_KEY)
        .and_then(|rest| rest.strip_prefix('='))
        .unwrap_or(fragment);
    Uuid::parse_str(value.trim()).ok()
}

#[derive(Debug, PartialEq, Eq)]
pub enum ExamView<'a> {
    Ready(&'a AssessmentRecord),
    NotFound,
}

pub fn open_exam<'a>(state: &'a AppState, link: &str) -> ExamView<'a> {
    match parse_exam_link(link).and_then(|id| state.assessment(id)) {
        Some(assessment) => ExamView::Ready(assessment),
        None => ExamView::NotFound,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamHistoryEntry {
    pub title: String,
    pub submitted_at: DateTime<Utc>,
    /// `None` while written answers await grading.
    pub percentage: Option<u32>,
    pub feedback: Option<String>,
}

/// A staff member's own exam results, newest first.
pub fn private_exam_history(
    state: &AppState,
    staff_id: &str,
    passcode: &str,
) -> Result<Vec<ExamHistoryEntry>, ScorecardError> {
    let staff = state
        .staff(staff_id)
        .ok_or_else(|| ScorecardError::UnknownStaff(staff_id.to_string()))?;
    access::verify_staff_passcode(staff, passcode)?;

    let mut entries: Vec<ExamHistoryEntry> = state
        .submissions_for(&staff.name)
        .filter_map(|submission| {
            let assessment = state.assessment(submission.test_id)?;
            Some(ExamHistoryEntry {
                title: assessment.title.clone(),
                submitted_at: submission.submitted_at,
                percentage: submission
                    .is_graded
                    .then(|| scoring::exam_percentage(submission)),
                feedback: submission.manager_feedback.clone(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionKind, TestQuestion};
    use chrono::{NaiveDate, TimeZone};
    use std::collections::BTreeMap;

    fn state_with_exam() -> (AppState, Uuid) {
        let mut state = AppState::default();
        let id = state
            .add_assessment(
                "Billing basics",
                "Billing",
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                vec![TestQuestion {
                    id: Uuid::new_v4(),
                    kind: QuestionKind::Choice,
                    question: "Refund window?".to_string(),
                    correct_answer: Some("14 days".to_string()),
                    distractors: vec!["30 days".to_string()],
                    max_points: 2,
                }],
            )
            .unwrap()
            .id;
        (state, id)
    }

    #[test]
    fn link_round_trips_through_parser() {
        let id = Uuid::new_v4();
        assert_eq!(parse_exam_link(&exam_link(id)), Some(id));
        assert_eq!(
            parse_exam_link(&format!("https://dash.local/{}", exam_link(id))),
            Some(id)
        );
        assert_eq!(parse_exam_link(&id.to_string()), Some(id));
        assert_eq!(parse_exam_link("#take-exam=not-a-uuid"), None);
        assert_eq!(parse_exam_link(""), None);
    }

    #[test]
    fn unknown_assessment_renders_not_found() {
        let (state, id) = state_with_exam();
        assert!(matches!(open_exam(&state, &exam_link(id)), ExamView::Ready(_)));
        assert_eq!(open_exam(&state, &exam_link(Uuid::new_v4())), ExamView::NotFound);
        assert_eq!(open_exam(&state, "#take-exam="), ExamView::NotFound);
    }

    #[test]
    fn history_requires_own_passcode() {
        let (mut state, id) = state_with_exam();
        let question_id = state.assessment(id).unwrap().questions[0].id;
        let mut answers = BTreeMap::new();
        answers.insert(question_id, "14 days".to_string());
        let when = Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap();
        state.submit_exam(id, "Nok", answers, when).unwrap();

        assert_eq!(
            private_exam_history(&state, "cs-01", "0000").unwrap_err(),
            ScorecardError::StaffPasscodeMismatch("cs-01".to_string())
        );

        let history = private_exam_history(&state, "cs-01", "4821").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "Billing basics");
        assert_eq!(history[0].percentage, Some(100));

        assert!(private_exam_history(&state, "cs-02", "1937").unwrap().is_empty());
    }
}
