use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::{
    EvaluationRecord, PeerReviewRecord, QaSection, QuestionKind, TestQuestion, TestSubmission,
};

pub const QA_ITEM_MAX: u32 = 5;
pub const PEER_SCORE_MAX: u32 = 5;

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// Rounds half up to a whole percentage. Negative and non-finite values map to 0.
pub fn round_pct(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u32
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn composite_score(
    communication: u32,
    speed: u32,
    process: u32,
    latest_test_score: Option<u32>,
) -> u32 {
    let rubric = (communication as f64 + speed as f64 + process as f64) / 3.0;
    let blended = match latest_test_score {
        Some(test) => (rubric + test as f64) / 2.0,
        None => rubric,
    };
    round_pct(blended)
}

pub fn evaluation_composite(record: &EvaluationRecord) -> u32 {
    composite_score(
        record.communication_score,
        record.speed_score,
        record.process_compliance,
        record.latest_test_score,
    )
}

fn item_totals<'a>(sections: impl IntoIterator<Item = &'a QaSection>) -> (u32, u32) {
    sections
        .into_iter()
        .flat_map(|section| section.items.iter())
        .fold((0u32, 0u32), |(sum, count), item| {
            (sum.saturating_add(item.score), count.saturating_add(1))
        })
}

pub fn qa_section_percentage(section: &QaSection) -> u32 {
    let (sum, count) = item_totals(std::iter::once(section));
    round_pct(percentage(sum as f64, count as f64 * QA_ITEM_MAX as f64))
}

pub fn qa_overall_percentage(sections: &[QaSection]) -> u32 {
    let (sum, count) = item_totals(sections);
    round_pct(percentage(sum as f64, count as f64 * QA_ITEM_MAX as f64))
}

/// Points earned on choice questions. Answers must equal the correct answer
/// exactly, with no trimming or case folding.
pub fn auto_score(questions: &[TestQuestion], answers: &BTreeMap<Uuid, String>) -> u32 {
    questions
        .iter()
        .filter(|question| question.kind == QuestionKind::Choice)
        .filter(|question| match (&question.correct_answer, answers.get(&question.id)) {
            (Some(correct), Some(given)) => correct == given,
            _ => false,
        })
        .fold(0, |sum: u32, question| sum.saturating_add(question.max_points))
}

pub fn total_possible_points(questions: &[TestQuestion]) -> u32 {
    questions
        .iter()
        .fold(0, |sum: u32, question| sum.saturating_add(question.max_points))
}

pub fn exam_percentage(submission: &TestSubmission) -> u32 {
    round_pct(percentage(
        submission.auto_score as f64 + submission.manual_score as f64,
        submission.total_possible_points as f64,
    ))
}

pub fn peer_review_percentage(review: &PeerReviewRecord) -> u32 {
    let sum = review.teamwork as f64 + review.helpfulness as f64 + review.communication as f64;
    round_pct(percentage(sum, (3 * PEER_SCORE_MAX) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QaItem;
    use chrono::Utc;

    fn section(scores: &[u32]) -> QaSection {
        QaSection {
            title: "Greeting".to_string(),
            items: scores
                .iter()
                .enumerate()
                .map(|(index, score)| QaItem {
                    label: format!("item {index}"),
                    score: *score,
                })
                .collect(),
            case_ref: "CASE-1".to_string(),
            comment: String::new(),
        }
    }

    fn choice(correct: &str, points: u32) -> TestQuestion {
        TestQuestion {
            id: Uuid::new_v4(),
            kind: QuestionKind::Choice,
            question: "Pick one".to_string(),
            correct_answer: Some(correct.to_string()),
            distractors: vec!["Red".to_string(), "Green".to_string()],
            max_points: points,
        }
    }

    fn written(points: u32) -> TestQuestion {
        TestQuestion {
            id: Uuid::new_v4(),
            kind: QuestionKind::Written,
            question: "Explain".to_string(),
            correct_answer: None,
            distractors: Vec::new(),
            max_points: points,
        }
    }

    #[test]
    fn composite_folds_in_latest_test_score() {
        assert_eq!(composite_score(80, 60, 100, Some(90)), 85);
        assert_eq!(composite_score(80, 60, 100, None), 80);
        assert_eq!(composite_score(20, 40, 40, None), 33);
    }

    #[test]
    fn qa_section_percentage_matches_item_ratio() {
        assert_eq!(qa_section_percentage(&section(&[5, 4, 3, 5, 4])), 84);
        assert_eq!(qa_section_percentage(&section(&[])), 0);
    }

    #[test]
    fn qa_overall_spans_all_sections() {
        let sections = vec![section(&[5, 5]), section(&[0, 0, 5])];
        // 15 of 25
        assert_eq!(qa_overall_percentage(&sections), 60);
        assert_eq!(qa_overall_percentage(&[]), 0);
    }

    #[test]
    fn auto_score_is_case_sensitive() {
        let question = choice("Blue", 1);
        let mut answers = BTreeMap::new();
        answers.insert(question.id, "blue".to_string());
        assert_eq!(auto_score(std::slice::from_ref(&question), &answers), 0);

        answers.insert(question.id, "Blue".to_string());
        assert_eq!(auto_score(std::slice::from_ref(&question), &answers), 1);
    }

    #[test]
    fn auto_score_ignores_written_questions() {
        let essay = written(5);
        let mcq = choice("Yes", 2);
        let mut answers = BTreeMap::new();
        answers.insert(essay.id, "anything".to_string());
        answers.insert(mcq.id, "Yes".to_string());
        let questions = vec![essay, mcq];
        assert_eq!(auto_score(&questions, &answers), 2);
        assert_eq!(total_possible_points(&questions), 7);
    }

    #[test]
    fn exam_percentage_handles_empty_exam() {
        let mut submission = TestSubmission {
            id: Uuid::new_v4(),
            test_id: Uuid::new_v4(),
            staff_name: "Mali".to_string(),
            auto_score: 0,
            manual_score: 0,
            total_possible_points: 0,
            is_graded: true,
            answers: BTreeMap::new(),
            written_points: BTreeMap::new(),
            manager_feedback: None,
            submitted_at: Utc::now(),
            graded_at: None,
        };
        assert_eq!(exam_percentage(&submission), 0);

        submission.auto_score = 3;
        submission.manual_score = 4;
        submission.total_possible_points = 8;
        assert_eq!(exam_percentage(&submission), 88);
    }

    #[test]
    fn peer_review_uses_fifteen_point_scale() {
        let review = PeerReviewRecord {
            id: Uuid::new_v4(),
            target_staff_id: "s1".to_string(),
            reviewer_name: None,
            teamwork: 5,
            helpfulness: 4,
            communication: 3,
            comment: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(peer_review_percentage(&review), 80);
    }

    #[test]
    fn round_pct_never_goes_negative() {
        assert_eq!(round_pct(-12.0), 0);
        assert_eq!(round_pct(f64::NAN), 0);
        assert_eq!(round_pct(84.5), 85);
    }

    #[test]
    fn large_inputs_saturate_instead_of_overflowing() {
        assert_eq!(composite_score(u32::MAX, u32::MAX, u32::MAX, None), u32::MAX);

        let questions = vec![choice("A", u32::MAX), choice("B", u32::MAX)];
        let mut answers = BTreeMap::new();
        answers.insert(questions[0].id, "A".to_string());
        answers.insert(questions[1].id, "B".to_string());
        assert_eq!(total_possible_points(&questions), u32::MAX);
        assert_eq!(auto_score(&questions, &answers), u32::MAX);
    }
}
