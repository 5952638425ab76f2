use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    EvaluationType, GrowthMetrics, QaItem, QaSection, QuestionKind, Retention, ReturnRate,
    SlaCategory, SlaCounter, TestQuestion,
};
use crate::persist;
use crate::store::{AppState, NewEvaluation, NewPeerReview};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn load_state(pool: &PgPool) -> anyhow::Result<AppState> {
    let keys: Vec<String> = persist::ALL_KEYS.iter().map(|key| key.to_string()).collect();
    let rows = sqlx::query("SELECT key, value FROM scorecard.kv_store WHERE key = ANY($1)")
        .bind(&keys)
        .fetch_all(pool)
        .await
        .context("failed to read scorecard state")?;

    let mut stored: HashMap<String, String> = HashMap::new();
    for row in rows {
        stored.insert(row.get("key"), row.get("value"));
    }

    Ok(persist::decode_state(|key| stored.get(key).cloned()))
}

pub async fn save_state(pool: &PgPool, state: &AppState) -> anyhow::Result<()> {
    let entries = persist::encode_state(state).context("failed to encode state")?;
    let mut tx = pool.begin().await?;

    for (key, value) in entries {
        sqlx::query(
            r#"
            INSERT INTO scorecard.kv_store (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Writes demo data for any key that has no stored value yet.
pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let state = seed_state(Utc::now())?;
    let mut inserted = 0usize;

    for (key, value) in persist::encode_state(&state)? {
        let result = sqlx::query(
            r#"
            INSERT INTO scorecard.kv_store (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    info!(inserted, "seed keys written");
    Ok(inserted)
}

fn seed_state(now: DateTime<Utc>) -> anyhow::Result<AppState> {
    let mut state = AppState::default();
    let day = |month, day| NaiveDate::from_ymd_opt(2026, month, day).context("invalid date");

    state.set_sla(SlaCategory::Restaurant, SlaCounter { total: 420, met: 401, target: 95 });
    state.set_sla(SlaCategory::Massage, SlaCounter { total: 180, met: 166, target: 92 });
    state.set_sla(SlaCategory::Ai, SlaCounter { total: 95, met: 81, target: 90 });
    state.set_response_speed(6.5)?;
    state.set_csat_rating(4.6)?;
    state.set_growth_metrics(GrowthMetrics {
        retention: Retention { start_count: 120, end_count: 131, new_count: 18 },
        return_rate: ReturnRate { returning_count: 64, total_count: 150 },
    });

    let evaluations = [
        ("cs-01", EvaluationType::Project, Some(SlaCategory::Restaurant), (100, 80, 100), (35, 60, 8), (120, 126), Some(95), "Ran the dinner-rush war room"),
        ("cs-02", EvaluationType::Project, Some(SlaCategory::Massage), (80, 60, 80), (52, 41, 3), (61, 66), None, "Solid week, a few slow handoffs"),
        ("cs-03", EvaluationType::Maintenance, None, (60, 80, 60), (18, 77, 5), (0, 0), Some(70), "Backlog cleanup"),
        ("cs-04", EvaluationType::Project, Some(SlaCategory::Ai), (40, 60, 60), (22, 30, 2), (20, 27), None, "Missed escalation notes on two tickets"),
        ("cs-05", EvaluationType::SideTask, None, (80, 100, 100), (5, 12, 14), (0, 0), None, "Rebuilt the QA checklist"),
    ];
    for (staff_id, kind, project, rubric, workload, sla, test, note) in evaluations {
        state.add_evaluation(
            NewEvaluation {
                staff_id: staff_id.to_string(),
                date: day(3, 27)?,
                kind,
                project,
                communication_score: rubric.0,
                speed_score: rubric.1,
                process_compliance: rubric.2,
                calls: workload.0,
                chats: workload.1,
                tasks: workload.2,
                sla_met_count: sla.0,
                sla_total_base: sla.1,
                latest_test_score: test,
                note: note.to_string(),
            },
            now,
        )?;
    }

    let sections = |scores: [u32; 4]| {
        vec![
            QaSection {
                title: "Opening".to_string(),
                items: vec![
                    QaItem { label: "Greeting".to_string(), score: scores[0] },
                    QaItem { label: "Verification".to_string(), score: scores[1] },
                ],
                case_ref: "TCK-20418".to_string(),
                comment: String::new(),
            },
            QaSection {
                title: "Resolution".to_string(),
                items: vec![
                    QaItem { label: "Accuracy".to_string(), score: scores[2] },
                    QaItem { label: "Closing".to_string(), score: scores[3] },
                ],
                case_ref: "TCK-20418".to_string(),
                comment: "Check the refund macro".to_string(),
            },
        ]
    };
    state.submit_qa("cs-02", day(3, 20)?, sections([5, 4, 4, 3]))?;
    state.submit_qa("cs-04", day(3, 21)?, sections([3, 3, 2, 4]))?;

    let choice_id = Uuid::new_v4();
    let written_id = Uuid::new_v4();
    let test_id = state
        .add_assessment(
            "Escalation policy",
            "Process",
            day(3, 1)?,
            vec![
                TestQuestion {
                    id: choice_id,
                    kind: QuestionKind::Choice,
                    question: "Who owns a P1 outage ticket?".to_string(),
                    correct_answer: Some("Shift lead".to_string()),
                    distractors: vec!["First responder".to_string(), "QA".to_string()],
                    max_points: 2,
                },
                TestQuestion {
                    id: written_id,
                    kind: QuestionKind::Written,
                    question: "Describe the handoff note format.".to_string(),
                    correct_answer: None,
                    distractors: Vec::new(),
                    max_points: 8,
                },
            ],
        )?
        .id;

    let answers = [(choice_id, "Shift lead"), (written_id, "Summary, steps taken, next owner")]
        .into_iter()
        .map(|(id, text)| (id, text.to_string()))
        .collect();
    let submission_id = state.submit_exam(test_id, "Ploy", answers, now)?.id;
    state.grade_submission(
        submission_id,
        [(written_id, 6)].into_iter().collect(),
        Some("Add the customer impact line".to_string()),
        now,
    )?;

    state.add_peer_review(
        NewPeerReview {
            target_staff_id: "cs-03".to_string(),
            reviewer_name: Some("Nok".to_string()),
            teamwork: 5,
            helpfulness: 4,
            communication: 4,
            comment: "Always picks up overflow chats".to_string(),
        },
        now,
    )?;

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;

    #[test]
    fn seed_state_is_fully_scored() {
        let state = seed_state(Utc::now()).unwrap();
        assert_eq!(state.evaluations().len(), 5);
        assert!(state.submissions().iter().all(|submission| submission.is_graded));

        let stats = aggregate::global_stats(&state);
        assert!(stats.overall_perf > 0 && stats.overall_perf <= 100);
        assert!(aggregate::team_ranking(&state)
            .iter()
            .all(|entry| entry.breakdown.has_data()));
    }
}
