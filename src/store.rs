use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate;
use crate::error::ScorecardError;
use crate::models::{
    AssessmentRecord, Csat, EvaluationRecord, EvaluationType, GrowthMetrics,
    MonthlySnapshotRecord, OtherKpis, PeerReviewRecord, ProjectSla, QaRecord, QaSection,
    QuestionKind, SlaCategory, SlaCounter, StaffMember, TestQuestion, TestSubmission,
};
use crate::scoring::{self, PEER_SCORE_MAX, QA_ITEM_MAX};

pub type StaffRoster = Vec<StaffMember>;

pub const RUBRIC_MAX: u32 = 100;
pub const QUESTION_POINTS_MAX: u32 = 100;
/// Rubric scores under this value need a written justification.
pub const NOTE_REQUIRED_BELOW: u32 = 60;

pub fn default_roster() -> StaffRoster {
    [
        ("cs-01", "Nok", "Support Lead", "4821"),
        ("cs-02", "Ploy", "Support Agent", "1937"),
        ("cs-03", "Tan", "Support Agent", "5604"),
        ("cs-04", "Mint", "Support Agent", "7215"),
        ("cs-05", "Beam", "QA Specialist", "3308"),
    ]
    .into_iter()
    .map(|(id, name, role, passcode)| StaffMember {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        passcode: passcode.to_string(),
    })
    .collect()
}

/// Form input for a new evaluation. Id, timestamps and the SLA contribution
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub staff_id: String,
    pub date: NaiveDate,
    pub kind: EvaluationType,
    pub project: Option<SlaCategory>,
    pub communication_score: u32,
    pub speed_score: u32,
    pub process_compliance: u32,
    pub calls: u32,
    pub chats: u32,
    pub tasks: u32,
    pub sla_met_count: u32,
    pub sla_total_base: u32,
    pub latest_test_score: Option<u32>,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct NewPeerReview {
    pub target_staff_id: String,
    pub reviewer_name: Option<String>,
    pub teamwork: u32,
    pub helpfulness: u32,
    pub communication: u32,
    pub comment: String,
}

/// Raw collections as loaded from storage.
#[derive(Debug, Clone, Default)]
pub struct StoredState {
    pub roster: StaffRoster,
    pub evaluations: Vec<EvaluationRecord>,
    pub qa_records: Vec<QaRecord>,
    pub assessments: Vec<AssessmentRecord>,
    pub submissions: Vec<TestSubmission>,
    pub peer_reviews: Vec<PeerReviewRecord>,
    pub snapshots: Vec<MonthlySnapshotRecord>,
    pub project_sla: ProjectSla,
    pub other_kpis: OtherKpis,
    pub growth_metrics: GrowthMetrics,
}

#[derive(Debug, Clone)]
pub struct AppState {
    roster: StaffRoster,
    evaluations: Vec<EvaluationRecord>,
    qa_records: Vec<QaRecord>,
    assessments: Vec<AssessmentRecord>,
    submissions: Vec<TestSubmission>,
    peer_reviews: Vec<PeerReviewRecord>,
    /// Most recent first.
    snapshots: Vec<MonthlySnapshotRecord>,
    project_sla: ProjectSla,
    other_kpis: OtherKpis,
    growth_metrics: GrowthMetrics,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_roster(default_roster())
    }
}

impl From<StoredState> for AppState {
    fn from(stored: StoredState) -> Self {
        Self {
            roster: stored.roster,
            evaluations: stored.evaluations,
            qa_records: stored.qa_records,
            assessments: stored.assessments,
            submissions: stored.submissions,
            peer_reviews: stored.peer_reviews,
            snapshots: stored.snapshots,
            project_sla: stored.project_sla,
            other_kpis: stored.other_kpis,
            growth_metrics: stored.growth_metrics,
        }
    }
}

impl AppState {
    pub fn with_roster(roster: StaffRoster) -> Self {
        AppState::from(StoredState {
            roster,
            ..StoredState::default()
        })
    }

    pub fn roster(&self) -> &[StaffMember] {
        &self.roster
    }

    pub fn staff(&self, staff_id: &str) -> Option<&StaffMember> {
        self.roster.iter().find(|staff| staff.id == staff_id)
    }

    pub fn staff_by_name(&self, name: &str) -> Option<&StaffMember> {
        self.roster.iter().find(|staff| staff.name == name)
    }

    fn require_staff(&self, staff_id: &str) -> Result<&StaffMember, ScorecardError> {
        self.staff(staff_id)
            .ok_or_else(|| ScorecardError::UnknownStaff(staff_id.to_string()))
    }

    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    pub fn evaluations_for<'a>(
        &'a self,
        staff_id: &'a str,
    ) -> impl Iterator<Item = &'a EvaluationRecord> + 'a {
        self.evaluations
            .iter()
            .filter(move |record| record.staff_id == staff_id)
    }

    pub fn qa_records(&self) -> &[QaRecord] {
        &self.qa_records
    }

    pub fn qa_for<'a>(&'a self, staff_id: &'a str) -> impl Iterator<Item = &'a QaRecord> + 'a {
        self.qa_records
            .iter()
            .filter(move |record| record.staff_id == staff_id)
    }

    pub fn assessments(&self) -> &[AssessmentRecord] {
        &self.assessments
    }

    pub fn assessment(&self, id: Uuid) -> Option<&AssessmentRecord> {
        self.assessments.iter().find(|assessment| assessment.id == id)
    }

    pub fn submissions(&self) -> &[TestSubmission] {
        &self.submissions
    }

    /// Submissions by staff name whose assessment still exists.
    pub fn submissions_for<'a>(
        &'a self,
        staff_name: &'a str,
    ) -> impl Iterator<Item = &'a TestSubmission> + 'a {
        self.submissions.iter().filter(move |submission| {
            submission.staff_name == staff_name && self.assessment(submission.test_id).is_some()
        })
    }

    pub fn peer_reviews(&self) -> &[PeerReviewRecord] {
        &self.peer_reviews
    }

    pub fn reviews_for<'a>(
        &'a self,
        staff_id: &'a str,
    ) -> impl Iterator<Item = &'a PeerReviewRecord> + 'a {
        self.peer_reviews
            .iter()
            .filter(move |review| review.target_staff_id == staff_id)
    }

    pub fn snapshots(&self) -> &[MonthlySnapshotRecord] {
        &self.snapshots
    }

    pub fn project_sla(&self) -> &ProjectSla {
        &self.project_sla
    }

    pub fn other_kpis(&self) -> &OtherKpis {
        &self.other_kpis
    }

    pub fn growth_metrics(&self) -> &GrowthMetrics {
        &self.growth_metrics
    }

    pub fn add_evaluation(
        &mut self,
        input: NewEvaluation,
        now: DateTime<Utc>,
    ) -> Result<&EvaluationRecord, ScorecardError> {
        self.require_staff(&input.staff_id)?;

        let rubric = [
            ("communication", input.communication_score),
            ("speed", input.speed_score),
            ("process", input.process_compliance),
        ];
        for (name, score) in rubric {
            if score > RUBRIC_MAX {
                return Err(ScorecardError::validation(format!(
                    "{name} score {score} is above {RUBRIC_MAX}"
                )));
            }
        }
        if let Some(test) = input.latest_test_score {
            if test > RUBRIC_MAX {
                return Err(ScorecardError::validation(format!(
                    "latest test score {test} is above {RUBRIC_MAX}"
                )));
            }
        }
        let low: Vec<&str> = rubric
            .iter()
            .filter(|(_, score)| *score < NOTE_REQUIRED_BELOW)
            .map(|(name, _)| *name)
            .collect();
        if !low.is_empty() && input.note.trim().is_empty() {
            return Err(ScorecardError::validation(format!(
                "a note is required when {} is below {NOTE_REQUIRED_BELOW}",
                low.join(", ")
            )));
        }

        let sla_contribution = input.project.map(|category| {
            aggregate::individual_sla_contribution(input.sla_met_count, &self.project_sla, category)
        });

        let record = EvaluationRecord {
            id: Uuid::new_v4(),
            staff_id: input.staff_id,
            date: input.date,
            kind: input.kind,
            project: input.project,
            communication_score: input.communication_score,
            speed_score: input.speed_score,
            process_compliance: input.process_compliance,
            calls: input.calls,
            chats: input.chats,
            tasks: input.tasks,
            sla_met_count: input.sla_met_count,
            sla_total_base: input.sla_total_base,
            latest_test_score: input.latest_test_score,
            sla_contribution,
            note: input.note,
            created_at: now,
        };
        info!(
            staff = %record.staff_id,
            composite = scoring::evaluation_composite(&record),
            "evaluation recorded"
        );
        self.evaluations.push(record);
        Ok(&self.evaluations[self.evaluations.len() - 1])
    }

    pub fn submit_qa(
        &mut self,
        staff_id: &str,
        date: NaiveDate,
        sections: Vec<QaSection>,
    ) -> Result<&QaRecord, ScorecardError> {
        self.require_staff(staff_id)?;
        if sections.iter().all(|section| section.items.is_empty()) {
            return Err(ScorecardError::validation("a QA audit needs at least one item"));
        }
        if let Some(item) = sections
            .iter()
            .flat_map(|section| section.items.iter())
            .find(|item| item.score > QA_ITEM_MAX)
        {
            return Err(ScorecardError::validation(format!(
                "QA item '{}' scored {} (max {QA_ITEM_MAX})",
                item.label, item.score
            )));
        }

        let record = QaRecord {
            id: Uuid::new_v4(),
            staff_id: staff_id.to_string(),
            date,
            overall_percentage: scoring::qa_overall_percentage(&sections),
            sections,
        };
        info!(staff = %record.staff_id, overall = record.overall_percentage, "QA audit recorded");
        self.qa_records.push(record);
        Ok(&self.qa_records[self.qa_records.len() - 1])
    }

    pub fn add_assessment(
        &mut self,
        title: &str,
        topic: &str,
        date: NaiveDate,
        questions: Vec<TestQuestion>,
    ) -> Result<&AssessmentRecord, ScorecardError> {
        if title.trim().is_empty() {
            return Err(ScorecardError::validation("assessment title is required"));
        }
        if questions.is_empty() {
            return Err(ScorecardError::validation("assessment needs at least one question"));
        }
        for question in &questions {
            if question.max_points == 0 {
                return Err(ScorecardError::validation(format!(
                    "question '{}' must be worth at least one point",
                    question.question
                )));
            }
            if question.max_points > QUESTION_POINTS_MAX {
                return Err(ScorecardError::validation(format!(
                    "question '{}' is worth more than {QUESTION_POINTS_MAX} points",
                    question.question
                )));
            }
            if question.kind == QuestionKind::Choice && question.correct_answer.is_none() {
                return Err(ScorecardError::validation(format!(
                    "choice question '{}' has no correct answer",
                    question.question
                )));
            }
        }

        let record = AssessmentRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            topic: topic.to_string(),
            date,
            questions,
        };
        info!(assessment = %record.id, title = %record.title, "assessment created");
        self.assessments.push(record);
        Ok(&self.assessments[self.assessments.len() - 1])
    }

    /// Submissions for the assessment stay stored but drop out of every view.
    pub fn delete_assessment(&mut self, id: Uuid) -> Result<AssessmentRecord, ScorecardError> {
        let index = self
            .assessments
            .iter()
            .position(|assessment| assessment.id == id)
            .ok_or(ScorecardError::AssessmentNotFound(id))?;
        let removed = self.assessments.remove(index);
        info!(assessment = %id, "assessment deleted");
        Ok(removed)
    }

    pub fn submit_exam(
        &mut self,
        test_id: Uuid,
        staff_name: &str,
        answers: BTreeMap<Uuid, String>,
        now: DateTime<Utc>,
    ) -> Result<&TestSubmission, ScorecardError> {
        if self.staff_by_name(staff_name).is_none() {
            return Err(ScorecardError::UnknownStaff(staff_name.to_string()));
        }
        let assessment = self
            .assessment(test_id)
            .ok_or(ScorecardError::AssessmentNotFound(test_id))?;

        let has_written = assessment
            .questions
            .iter()
            .any(|question| question.kind == QuestionKind::Written);
        let submission = TestSubmission {
            id: Uuid::new_v4(),
            test_id,
            staff_name: staff_name.to_string(),
            auto_score: scoring::auto_score(&assessment.questions, &answers),
            manual_score: 0,
            total_possible_points: scoring::total_possible_points(&assessment.questions),
            is_graded: !has_written,
            answers,
            written_points: BTreeMap::new(),
            manager_feedback: None,
            submitted_at: now,
            graded_at: if has_written { None } else { Some(now) },
        };
        info!(
            submission = %submission.id,
            staff = %submission.staff_name,
            auto_score = submission.auto_score,
            pending = has_written,
            "exam submitted"
        );
        self.submissions.push(submission);
        Ok(&self.submissions[self.submissions.len() - 1])
    }

    /// Assigns points to written questions and finalizes the submission.
    /// A submission can be graded once.
    pub fn grade_submission(
        &mut self,
        submission_id: Uuid,
        points: BTreeMap<Uuid, u32>,
        feedback: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&TestSubmission, ScorecardError> {
        let index = self
            .submissions
            .iter()
            .position(|submission| submission.id == submission_id)
            .ok_or(ScorecardError::SubmissionNotFound(submission_id))?;
        let submission = &self.submissions[index];
        if submission.is_graded {
            return Err(ScorecardError::AlreadyGraded(submission_id));
        }
        let assessment = self
            .assessment(submission.test_id)
            .ok_or(ScorecardError::AssessmentNotFound(submission.test_id))?;

        for (question_id, awarded) in &points {
            let question = assessment
                .questions
                .iter()
                .find(|question| question.id == *question_id && question.kind == QuestionKind::Written)
                .ok_or_else(|| {
                    ScorecardError::validation(format!(
                        "{question_id} is not a written question of this assessment"
                    ))
                })?;
            if *awarded > question.max_points {
                return Err(ScorecardError::validation(format!(
                    "{awarded} points exceeds the {} available for '{}'",
                    question.max_points, question.question
                )));
            }
        }

        let manual_score: u32 = points.values().sum();
        let submission = &mut self.submissions[index];
        submission.manual_score = manual_score;
        submission.written_points = points;
        submission.manager_feedback = feedback.filter(|text| !text.trim().is_empty());
        submission.is_graded = true;
        submission.graded_at = Some(now);
        info!(
            submission = %submission_id,
            percentage = scoring::exam_percentage(submission),
            "submission graded"
        );
        Ok(&self.submissions[index])
    }

    pub fn add_peer_review(
        &mut self,
        input: NewPeerReview,
        now: DateTime<Utc>,
    ) -> Result<&PeerReviewRecord, ScorecardError> {
        self.require_staff(&input.target_staff_id)?;
        for (name, score) in [
            ("teamwork", input.teamwork),
            ("helpfulness", input.helpfulness),
            ("communication", input.communication),
        ] {
            if !(1..=PEER_SCORE_MAX).contains(&score) {
                return Err(ScorecardError::validation(format!(
                    "{name} must be between 1 and {PEER_SCORE_MAX}, got {score}"
                )));
            }
        }

        let record = PeerReviewRecord {
            id: Uuid::new_v4(),
            target_staff_id: input.target_staff_id,
            reviewer_name: input
                .reviewer_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            teamwork: input.teamwork,
            helpfulness: input.helpfulness,
            communication: input.communication,
            comment: input.comment,
            created_at: now,
        };
        info!(target = %record.target_staff_id, "peer review recorded");
        self.peer_reviews.push(record);
        Ok(&self.peer_reviews[self.peer_reviews.len() - 1])
    }

    pub fn set_sla(&mut self, category: SlaCategory, counter: SlaCounter) {
        debug!(category = category.label(), ?counter, "project SLA updated");
        *self.project_sla.get_mut(category) = counter;
    }

    pub fn set_response_speed(&mut self, average_minutes: f64) -> Result<(), ScorecardError> {
        if !average_minutes.is_finite() || average_minutes < 0.0 {
            return Err(ScorecardError::validation(
                "response speed must be a non-negative number of minutes",
            ));
        }
        debug!(average_minutes, "response speed updated");
        self.other_kpis.response_speed = average_minutes;
        Ok(())
    }

    /// Stores the 0-5 rating in `csat.met`; `csat.total` is left untouched.
    pub fn set_csat_rating(&mut self, rating: f64) -> Result<(), ScorecardError> {
        if !(0.0..=5.0).contains(&rating) {
            return Err(ScorecardError::validation("CSAT rating must be between 0 and 5"));
        }
        debug!(rating, "CSAT updated");
        self.other_kpis.csat = Csat {
            met: rating,
            ..self.other_kpis.csat
        };
        Ok(())
    }

    pub fn set_growth_metrics(&mut self, growth: GrowthMetrics) {
        debug!(?growth, "growth metrics updated");
        self.growth_metrics = growth;
    }

    /// Inserts a snapshot at the front, removing any existing one with the
    /// same label. Returns whether one was replaced.
    pub fn put_snapshot(&mut self, snapshot: MonthlySnapshotRecord) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|existing| existing.label != snapshot.label);
        let replaced = self.snapshots.len() != before;
        self.snapshots.insert(0, snapshot);
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QaItem;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 14, 30, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()
    }

    fn evaluation(staff_id: &str) -> NewEvaluation {
        NewEvaluation {
            staff_id: staff_id.to_string(),
            date: day(),
            kind: EvaluationType::Maintenance,
            project: None,
            communication_score: 80,
            speed_score: 60,
            process_compliance: 100,
            calls: 12,
            chats: 30,
            tasks: 4,
            sla_met_count: 0,
            sla_total_base: 0,
            latest_test_score: Some(90),
            note: String::new(),
        }
    }

    fn choice(correct: &str, points: u32) -> TestQuestion {
        TestQuestion {
            id: Uuid::new_v4(),
            kind: QuestionKind::Choice,
            question: "Which channel has priority?".to_string(),
            correct_answer: Some(correct.to_string()),
            distractors: vec!["Email".to_string()],
            max_points: points,
        }
    }

    fn written(points: u32) -> TestQuestion {
        TestQuestion {
            id: Uuid::new_v4(),
            kind: QuestionKind::Written,
            question: "How do you de-escalate?".to_string(),
            correct_answer: None,
            distractors: Vec::new(),
            max_points: points,
        }
    }

    #[test]
    fn evaluation_scenario_scores_85() {
        let mut state = AppState::default();
        let record = state.add_evaluation(evaluation("cs-02"), now()).unwrap();
        assert_eq!(scoring::evaluation_composite(record), 85);
        assert_eq!(record.sla_contribution, None);
        assert_eq!(state.evaluations().len(), 1);
    }

    #[test]
    fn low_rubric_score_requires_note() {
        let mut state = AppState::default();
        let mut input = evaluation("cs-02");
        input.speed_score = 40;
        let err = state.add_evaluation(input.clone(), now()).unwrap_err();
        assert!(matches!(err, ScorecardError::Validation(_)));
        assert!(state.evaluations().is_empty());

        input.note = "queue backlog after outage".to_string();
        assert!(state.add_evaluation(input, now()).is_ok());
    }

    #[test]
    fn evaluation_rejects_unknown_staff_and_out_of_range_scores() {
        let mut state = AppState::default();
        assert_eq!(
            state.add_evaluation(evaluation("nobody"), now()).unwrap_err(),
            ScorecardError::UnknownStaff("nobody".to_string())
        );

        let mut input = evaluation("cs-01");
        input.process_compliance = 120;
        assert!(matches!(
            state.add_evaluation(input, now()),
            Err(ScorecardError::Validation(_))
        ));
    }

    #[test]
    fn contribution_is_frozen_at_creation() {
        let mut state = AppState::default();
        state.set_sla(SlaCategory::Massage, SlaCounter { total: 80, met: 70, target: 90 });
        let mut input = evaluation("cs-03");
        input.project = Some(SlaCategory::Massage);
        input.sla_met_count = 20;
        input.sla_total_base = 22;
        let id = state.add_evaluation(input, now()).unwrap().id;

        state.set_sla(SlaCategory::Massage, SlaCounter { total: 200, met: 150, target: 90 });
        let stored = state.evaluations().iter().find(|record| record.id == id).unwrap();
        assert_eq!(stored.sla_contribution, Some(25));
    }

    #[test]
    fn qa_overall_is_recomputed_from_items() {
        let mut state = AppState::default();
        let record = state
            .submit_qa(
                "cs-05",
                day(),
                vec![QaSection {
                    title: "Resolution".to_string(),
                    items: [5, 4, 3, 5, 4]
                        .iter()
                        .map(|score| QaItem { label: "check".to_string(), score: *score })
                        .collect(),
                    case_ref: "TCK-88".to_string(),
                    comment: "good recovery".to_string(),
                }],
            )
            .unwrap();
        assert_eq!(record.overall_percentage, 84);
    }

    #[test]
    fn qa_rejects_item_above_five() {
        let mut state = AppState::default();
        let err = state
            .submit_qa(
                "cs-05",
                day(),
                vec![QaSection {
                    title: "Tone".to_string(),
                    items: vec![QaItem { label: "warmth".to_string(), score: 6 }],
                    case_ref: String::new(),
                    comment: String::new(),
                }],
            )
            .unwrap_err();
        assert!(matches!(err, ScorecardError::Validation(_)));
    }

    #[test]
    fn choice_only_exam_is_graded_on_submit() {
        let mut state = AppState::default();
        let question = choice("Blue", 1);
        let question_id = question.id;
        let test_id = state.add_assessment("Colours", "Brand", day(), vec![question]).unwrap().id;

        let mut answers = BTreeMap::new();
        answers.insert(question_id, "blue".to_string());
        let submission = state.submit_exam(test_id, "Tan", answers, now()).unwrap();
        assert!(submission.is_graded);
        assert_eq!(submission.auto_score, 0);
        assert_eq!(submission.total_possible_points, 1);
    }

    #[test]
    fn written_exam_waits_for_single_grading() {
        let mut state = AppState::default();
        let mcq = choice("Phone", 2);
        let essay = written(8);
        let (mcq_id, essay_id) = (mcq.id, essay.id);
        let test_id = state
            .add_assessment("Escalations", "Process", day(), vec![mcq, essay])
            .unwrap()
            .id;

        let mut answers = BTreeMap::new();
        answers.insert(mcq_id, "Phone".to_string());
        answers.insert(essay_id, "Listen, acknowledge, act".to_string());
        let submission_id = state.submit_exam(test_id, "Mint", answers, now()).unwrap().id;
        assert!(!state.submissions()[0].is_graded);

        let mut too_many = BTreeMap::new();
        too_many.insert(essay_id, 9);
        assert!(matches!(
            state.grade_submission(submission_id, too_many, None, now()),
            Err(ScorecardError::Validation(_))
        ));

        let mut not_written = BTreeMap::new();
        not_written.insert(mcq_id, 1);
        assert!(matches!(
            state.grade_submission(submission_id, not_written, None, now()),
            Err(ScorecardError::Validation(_))
        ));

        let mut points = BTreeMap::new();
        points.insert(essay_id, 6);
        let graded = state
            .grade_submission(submission_id, points.clone(), Some("Clear steps".to_string()), now())
            .unwrap();
        assert!(graded.is_graded);
        assert_eq!(graded.auto_score + graded.manual_score, 8);
        assert!(graded.auto_score + graded.manual_score <= graded.total_possible_points);
        assert_eq!(scoring::exam_percentage(graded), 80);

        assert_eq!(
            state.grade_submission(submission_id, points, None, now()).unwrap_err(),
            ScorecardError::AlreadyGraded(submission_id)
        );
    }

    #[test]
    fn deleted_assessment_hides_its_submissions() {
        let mut state = AppState::default();
        let test_id = state
            .add_assessment("Refunds", "Policy", day(), vec![choice("7 days", 1)])
            .unwrap()
            .id;
        state.submit_exam(test_id, "Ploy", BTreeMap::new(), now()).unwrap();
        assert_eq!(state.submissions_for("Ploy").count(), 1);

        state.delete_assessment(test_id).unwrap();
        assert_eq!(state.submissions().len(), 1);
        assert_eq!(state.submissions_for("Ploy").count(), 0);
        assert_eq!(
            state.delete_assessment(test_id).unwrap_err(),
            ScorecardError::AssessmentNotFound(test_id)
        );
    }

    #[test]
    fn assessment_requires_answer_for_choice_questions() {
        let mut state = AppState::default();
        let mut question = choice("A", 1);
        question.correct_answer = None;
        assert!(state.add_assessment("Quiz", "Misc", day(), vec![question]).is_err());
        assert!(state.add_assessment("Quiz", "Misc", day(), Vec::new()).is_err());
    }

    #[test]
    fn question_points_are_bounded() {
        let mut state = AppState::default();
        assert!(state
            .add_assessment("Quiz", "Misc", day(), vec![choice("A", QUESTION_POINTS_MAX)])
            .is_ok());
        assert!(matches!(
            state.add_assessment("Quiz", "Misc", day(), vec![choice("A", u32::MAX)]),
            Err(ScorecardError::Validation(_))
        ));
        assert_eq!(state.assessments().len(), 1);
    }

    #[test]
    fn peer_review_bounds_and_anonymity() {
        let mut state = AppState::default();
        let mut input = NewPeerReview {
            target_staff_id: "cs-04".to_string(),
            reviewer_name: Some("   ".to_string()),
            teamwork: 5,
            helpfulness: 5,
            communication: 0,
            comment: "always helps on nights".to_string(),
        };
        assert!(state.add_peer_review(input.clone(), now()).is_err());

        input.communication = 4;
        let review = state.add_peer_review(input, now()).unwrap();
        assert_eq!(review.reviewer_name, None);
        assert_eq!(state.reviews_for("cs-04").count(), 1);
    }

    #[test]
    fn csat_setter_keeps_total_field() {
        let mut state = AppState::default();
        state.set_csat_rating(4.2).unwrap();
        assert_eq!(state.other_kpis().csat.met, 4.2);
        assert_eq!(state.other_kpis().csat.total, 0.0);
        assert!(state.set_csat_rating(5.5).is_err());
        assert!(state.set_response_speed(-1.0).is_err());
    }
}
