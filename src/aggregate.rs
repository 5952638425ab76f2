use crate::models::{
    Csat, EvaluationRecord, GlobalStats, GrowthMetrics, KpiCategory, OtherKpis, PeerReviewRecord,
    ProjectSla, RankedStaff, Retention, ReturnRate, SlaCategory, SlaCounter, SlaTotals,
    StaffBreakdown, StaffMember, WorkloadTotals,
};
use crate::scoring::{self, mean, percentage, round_pct};
use crate::store::AppState;

/// Minutes at which the response-speed score is still 100.
pub const RESPONSE_SPEED_BASELINE_MINUTES: f64 = 5.0;
/// Points lost per minute beyond the baseline.
pub const RESPONSE_SPEED_PENALTY_PER_MINUTE: f64 = 10.0;
pub const CSAT_SCALE: f64 = 5.0;

pub fn staff_breakdown(state: &AppState, staff: &StaffMember) -> StaffBreakdown {
    let evaluation: Vec<f64> = state
        .evaluations_for(&staff.id)
        .map(|record| scoring::evaluation_composite(record) as f64)
        .collect();
    let qa: Vec<f64> = state
        .qa_for(&staff.id)
        .map(|record| record.overall_percentage as f64)
        .collect();
    let exam: Vec<f64> = state
        .submissions_for(&staff.name)
        .filter(|submission| submission.is_graded)
        .map(|submission| scoring::exam_percentage(submission) as f64)
        .collect();

    breakdown_from(mean(&evaluation), mean(&qa), mean(&exam))
}

/// Absent components are left out of the mean rather than counted as zero.
pub fn breakdown_from(evaluation: Option<f64>, qa: Option<f64>, exam: Option<f64>) -> StaffBreakdown {
    let present: Vec<f64> = [evaluation, qa, exam].into_iter().flatten().collect();
    StaffBreakdown {
        evaluation,
        qa,
        exam,
        score: mean(&present).map(round_pct).unwrap_or(0),
    }
}

/// Staff ordered by composite score, highest first. Ties keep roster order.
pub fn team_ranking(state: &AppState) -> Vec<RankedStaff> {
    let mut ranking: Vec<RankedStaff> = state
        .roster()
        .iter()
        .map(|staff| RankedStaff {
            staff_id: staff.id.clone(),
            name: staff.name.clone(),
            role: staff.role.clone(),
            breakdown: staff_breakdown(state, staff),
        })
        .collect();
    ranking.sort_by(|a, b| b.breakdown.score.cmp(&a.breakdown.score));
    ranking
}

/// Mean composite across staff that have at least one scored record.
pub fn team_average(ranking: &[RankedStaff]) -> u32 {
    let scores: Vec<f64> = ranking
        .iter()
        .filter(|entry| entry.breakdown.has_data())
        .map(|entry| entry.breakdown.score as f64)
        .collect();
    mean(&scores).map(round_pct).unwrap_or(0)
}

fn sla_ratio(counter: &SlaCounter) -> f64 {
    percentage(counter.met as f64, counter.total as f64)
}

pub fn sla_category_percentage(sla: &ProjectSla, category: SlaCategory) -> u32 {
    round_pct(sla_ratio(sla.get(category)))
}

/// Equal-weight mean of the category percentages, regardless of volume.
pub fn overall_sla(sla: &ProjectSla) -> u32 {
    let ratios: Vec<f64> = SlaCategory::ALL
        .iter()
        .map(|category| sla_ratio(sla.get(*category)))
        .collect();
    mean(&ratios).map(round_pct).unwrap_or(0)
}

/// `csat.met` is a 0-5 rating, not a count.
pub fn csat_percentage(csat: &Csat) -> u32 {
    round_pct((csat.met / CSAT_SCALE * 100.0).clamp(0.0, 100.0))
}

pub fn response_speed_score(average_minutes: f64) -> u32 {
    let score = 100.0
        - (average_minutes - RESPONSE_SPEED_BASELINE_MINUTES) * RESPONSE_SPEED_PENALTY_PER_MINUTE;
    round_pct(score.clamp(0.0, 100.0))
}

pub fn kpi_percentage(kpis: &OtherKpis, category: KpiCategory) -> u32 {
    match category {
        KpiCategory::ResponseSpeed => response_speed_score(kpis.response_speed),
        KpiCategory::Csat => csat_percentage(&kpis.csat),
    }
}

/// Share of the starting headcount still present, excluding newcomers.
/// Floored at 0 and not capped above 100.
pub fn retention_percentage(retention: &Retention) -> u32 {
    let kept = retention.end_count as f64 - retention.new_count as f64;
    round_pct(percentage(kept, retention.start_count as f64))
}

pub fn return_rate_percentage(rate: &ReturnRate) -> u32 {
    round_pct(percentage(rate.returning_count as f64, rate.total_count as f64))
}

pub fn growth_percentages(growth: &GrowthMetrics) -> (u32, u32) {
    (
        retention_percentage(&growth.retention),
        return_rate_percentage(&growth.return_rate),
    )
}

pub fn global_stats(state: &AppState) -> GlobalStats {
    let ranking = team_ranking(state);
    let sla = state.project_sla();
    let kpis = state.other_kpis();
    let (retention, return_rate) = growth_percentages(state.growth_metrics());

    let team_average = team_average(&ranking);
    let csat = kpi_percentage(kpis, KpiCategory::Csat);
    let response_speed = kpi_percentage(kpis, KpiCategory::ResponseSpeed);
    let overall_sla = overall_sla(sla);

    let components = [
        team_average,
        csat,
        response_speed,
        overall_sla,
        retention,
        return_rate,
    ]
    .map(f64::from);

    GlobalStats {
        team_average,
        csat,
        response_speed,
        sla_restaurant: sla_category_percentage(sla, SlaCategory::Restaurant),
        sla_massage: sla_category_percentage(sla, SlaCategory::Massage),
        sla_ai: sla_category_percentage(sla, SlaCategory::Ai),
        overall_sla,
        retention,
        return_rate,
        overall_perf: mean(&components).map(round_pct).unwrap_or(0),
    }
}

/// An individual's met count over the team-wide total for the category at
/// the time of recording. Reads as "share of the team's obligation".
pub fn individual_sla_contribution(
    sla_met_count: u32,
    sla: &ProjectSla,
    category: SlaCategory,
) -> u32 {
    round_pct(percentage(
        sla_met_count as f64,
        sla.get(category).total as f64,
    ))
}

pub fn workload_totals<'a>(
    evaluations: impl IntoIterator<Item = &'a EvaluationRecord>,
) -> WorkloadTotals {
    evaluations
        .into_iter()
        .fold(WorkloadTotals::default(), |totals, record| WorkloadTotals {
            calls: totals.calls.saturating_add(record.calls),
            chats: totals.chats.saturating_add(record.chats),
            tasks: totals.tasks.saturating_add(record.tasks),
        })
}

/// Expects records in insertion order; the last one carrying a contribution wins.
pub fn sla_totals<'a>(evaluations: impl IntoIterator<Item = &'a EvaluationRecord>) -> SlaTotals {
    evaluations
        .into_iter()
        .fold(SlaTotals::default(), |totals, record| SlaTotals {
            met: totals.met.saturating_add(record.sla_met_count),
            total: totals.total.saturating_add(record.sla_total_base),
            latest_contribution: record.sla_contribution.or(totals.latest_contribution),
        })
}

pub fn peer_review_average<'a>(
    reviews: impl IntoIterator<Item = &'a PeerReviewRecord>,
) -> Option<f64> {
    let values: Vec<f64> = reviews
        .into_iter()
        .map(|review| scoring::peer_review_percentage(review) as f64)
        .collect();
    mean(&values)
}
