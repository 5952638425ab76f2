use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate;
use crate::error::ScorecardError;
use crate::exams;
use crate::models::{RankedStaff, SlaCategory};
use crate::scoring;
use crate::store::AppState;

const MASTER_RECORD_LIMIT: usize = 25;

fn component(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{}%", scoring::round_pct(v)))
}

fn write_ranking(output: &mut String, ranking: &[RankedStaff], limit: usize) {
    if ranking.is_empty() {
        let _ = writeln!(output, "No staff on the roster.");
        return;
    }
    for (position, entry) in ranking.iter().take(limit).enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) score {}%",
            position + 1,
            entry.name,
            entry.role,
            entry.breakdown.score
        );
    }
}

pub fn render_ranking(state: &AppState, limit: usize) -> String {
    let mut output = String::new();
    write_ranking(&mut output, &aggregate::team_ranking(state), limit);
    output
}

pub fn render_stats(state: &AppState) -> String {
    let stats = aggregate::global_stats(state);
    let mut output = String::new();

    let _ = writeln!(output, "Overall performance: {}%", stats.overall_perf);
    let _ = writeln!(output, "- Team average: {}%", stats.team_average);
    let _ = writeln!(output, "- CSAT: {}%", stats.csat);
    let _ = writeln!(output, "- Response speed: {}%", stats.response_speed);
    let _ = writeln!(output, "- Project SLA: {}%", stats.overall_sla);
    for category in SlaCategory::ALL {
        let counter = state.project_sla().get(category);
        let _ = writeln!(
            output,
            "  - {}: {}% ({}/{}, target {}%)",
            category.label(),
            stats.sla(category),
            counter.met,
            counter.total,
            counter.target
        );
    }
    let _ = writeln!(output, "- Retention: {}%", stats.retention);
    let _ = writeln!(output, "- Return rate: {}%", stats.return_rate);
    output
}

pub fn build_report(state: &AppState, generated: NaiveDate) -> String {
    let ranking = aggregate::team_ranking(state);
    let mut output = String::new();

    let _ = writeln!(output, "# Support Team Scorecard");
    let _ = writeln!(output, "Generated {generated}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Global KPIs");
    output.push_str(&render_stats(state));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Ranking");
    write_ranking(&mut output, &ranking, ranking.len());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Analysis");
    let _ = writeln!(output, "| Staff | Evaluations | QA | Exams | Peer | Composite |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for entry in &ranking {
        let peer = aggregate::peer_review_average(state.reviews_for(&entry.staff_id));
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {}% |",
            entry.name,
            component(entry.breakdown.evaluation),
            component(entry.breakdown.qa),
            component(entry.breakdown.exam),
            component(peer),
            entry.breakdown.score
        );
    }

    let mut evaluations: Vec<_> = state.evaluations().iter().collect();
    evaluations.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Master Record");

    if evaluations.is_empty() {
        let _ = writeln!(output, "No evaluations recorded yet.");
    } else {
        for record in evaluations.iter().take(MASTER_RECORD_LIMIT) {
            let name = state
                .staff(&record.staff_id)
                .map_or(record.staff_id.as_str(), |staff| staff.name.as_str());
            let _ = writeln!(
                output,
                "- {} {} ({:?}) composite {}%: {}",
                record.date,
                name,
                record.kind,
                scoring::evaluation_composite(record),
                record.note
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Snapshots");

    if state.snapshots().is_empty() {
        let _ = writeln!(output, "No snapshots saved.");
    } else {
        for snapshot in state.snapshots() {
            let _ = writeln!(
                output,
                "- {}: overall {}% (saved {})",
                snapshot.label,
                snapshot.overall_score,
                snapshot.saved_at.format("%Y-%m-%d")
            );
        }
    }

    output
}

/// Individual profile. The exam history section is only rendered when the
/// staff member's own passcode is supplied and matches.
pub fn build_profile(
    state: &AppState,
    staff_id: &str,
    passcode: Option<&str>,
) -> Result<String, ScorecardError> {
    let staff = state
        .staff(staff_id)
        .ok_or_else(|| ScorecardError::UnknownStaff(staff_id.to_string()))?;
    let history = passcode
        .map(|code| exams::private_exam_history(state, staff_id, code))
        .transpose()?;

    let breakdown = aggregate::staff_breakdown(state, staff);
    let workload = aggregate::workload_totals(state.evaluations_for(staff_id));
    let sla = aggregate::sla_totals(state.evaluations_for(staff_id));
    let peer = aggregate::peer_review_average(state.reviews_for(staff_id));
    let mut output = String::new();

    let _ = writeln!(output, "# {} ({})", staff.name, staff.role);
    let _ = writeln!(output, "Composite score {}%", breakdown.score);
    let _ = writeln!(output, "- Evaluations: {}", component(breakdown.evaluation));
    let _ = writeln!(output, "- QA: {}", component(breakdown.qa));
    let _ = writeln!(output, "- Exams: {}", component(breakdown.exam));
    let _ = writeln!(output, "- Peer reviews: {}", component(peer));
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Workload: {} calls, {} chats, {} tasks",
        workload.calls, workload.chats, workload.tasks
    );
    let _ = write!(output, "SLA: {}/{} met", sla.met, sla.total);
    match sla.latest_contribution {
        Some(share) => {
            let _ = writeln!(output, ", {share}% contribution to global total");
        }
        None => {
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## QA Audits");
    let mut audits = state.qa_for(staff_id).peekable();
    if audits.peek().is_none() {
        let _ = writeln!(output, "No QA audits yet.");
    }
    for audit in audits {
        let _ = writeln!(output, "- {} overall {}%", audit.date, audit.overall_percentage);
        for section in &audit.sections {
            let _ = writeln!(
                output,
                "  - {}: {}%",
                section.title,
                scoring::qa_section_percentage(section)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Peer Feedback");
    let mut reviews = state.reviews_for(staff_id).peekable();
    if reviews.peek().is_none() {
        let _ = writeln!(output, "No peer reviews yet.");
    }
    for review in reviews {
        let _ = writeln!(
            output,
            "- {}% from {}: {}",
            scoring::peer_review_percentage(review),
            review.reviewer_name.as_deref().unwrap_or("anonymous"),
            review.comment
        );
    }

    if let Some(history) = history {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Exam History");
        if history.is_empty() {
            let _ = writeln!(output, "No exams taken.");
        }
        for entry in history {
            let result = entry
                .percentage
                .map_or_else(|| "pending review".to_string(), |pct| format!("{pct}%"));
            let _ = writeln!(output, "- {} on {}: {}", entry.title, entry.submitted_at.format("%Y-%m-%d"), result);
            if let Some(feedback) = entry.feedback {
                let _ = writeln!(output, "  feedback: {feedback}");
            }
        }
    }

    Ok(output)
}
