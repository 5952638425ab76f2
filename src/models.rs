use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: String,
    pub passcode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum EvaluationType {
    Project,
    Maintenance,
    SideTask,
}

/// Project categories that carry a team-wide SLA counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SlaCategory {
    Restaurant,
    Massage,
    Ai,
}

impl SlaCategory {
    pub const ALL: [SlaCategory; 3] = [SlaCategory::Restaurant, SlaCategory::Massage, SlaCategory::Ai];

    pub fn label(self) -> &'static str {
        match self {
            SlaCategory::Restaurant => "Restaurant",
            SlaCategory::Massage => "Massage",
            SlaCategory::Ai => "AI",
        }
    }
}

/// The two scalar KPIs outside the project SLA counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiCategory {
    ResponseSpeed,
    Csat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub id: Uuid,
    pub staff_id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: EvaluationType,
    #[serde(default)]
    pub project: Option<SlaCategory>,
    pub communication_score: u32,
    pub speed_score: u32,
    pub process_compliance: u32,
    pub calls: u32,
    pub chats: u32,
    pub tasks: u32,
    pub sla_met_count: u32,
    pub sla_total_base: u32,
    #[serde(default)]
    pub latest_test_score: Option<u32>,
    /// Share of the team's category total this evaluation's SLA met count
    /// represented when it was recorded.
    #[serde(default)]
    pub sla_contribution: Option<u32>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaItem {
    pub label: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaSection {
    pub title: String,
    pub items: Vec<QaItem>,
    #[serde(default)]
    pub case_ref: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRecord {
    pub id: Uuid,
    pub staff_id: String,
    pub date: NaiveDate,
    pub sections: Vec<QaSection>,
    pub overall_percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Choice,
    Written,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestQuestion {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub distractors: Vec<String>,
    pub max_points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub date: NaiveDate,
    pub questions: Vec<TestQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubmission {
    pub id: Uuid,
    pub test_id: Uuid,
    pub staff_name: String,
    pub auto_score: u32,
    pub manual_score: u32,
    pub total_possible_points: u32,
    pub is_graded: bool,
    pub answers: BTreeMap<Uuid, String>,
    #[serde(default)]
    pub written_points: BTreeMap<Uuid, u32>,
    #[serde(default)]
    pub manager_feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewRecord {
    pub id: Uuid,
    pub target_staff_id: String,
    /// `None` for anonymous reviews.
    pub reviewer_name: Option<String>,
    pub teamwork: u32,
    pub helpfulness: u32,
    pub communication: u32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaCounter {
    pub total: u32,
    pub met: u32,
    pub target: u32,
}

impl Default for SlaCounter {
    fn default() -> Self {
        Self {
            total: 0,
            met: 0,
            target: 95,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSla {
    pub restaurant: SlaCounter,
    pub massage: SlaCounter,
    pub ai: SlaCounter,
}

impl ProjectSla {
    pub fn get(&self, category: SlaCategory) -> &SlaCounter {
        match category {
            SlaCategory::Restaurant => &self.restaurant,
            SlaCategory::Massage => &self.massage,
            SlaCategory::Ai => &self.ai,
        }
    }

    pub fn get_mut(&mut self, category: SlaCategory) -> &mut SlaCounter {
        match category {
            SlaCategory::Restaurant => &mut self.restaurant,
            SlaCategory::Massage => &mut self.massage,
            SlaCategory::Ai => &mut self.ai,
        }
    }
}

/// Customer satisfaction. `met` holds the 0-5 average rating; `total` is
/// carried for compatibility with stored data and is not read by any score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Csat {
    pub total: f64,
    pub met: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherKpis {
    /// Average first-response time in minutes.
    pub response_speed: f64,
    pub csat: Csat,
}

impl Default for OtherKpis {
    fn default() -> Self {
        Self {
            response_speed: 5.0,
            csat: Csat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retention {
    pub start_count: u32,
    pub end_count: u32,
    pub new_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRate {
    pub returning_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMetrics {
    pub retention: Retention,
    pub return_rate: ReturnRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshotRecord {
    pub id: Uuid,
    pub label: String,
    pub saved_at: DateTime<Utc>,
    pub project_sla: ProjectSla,
    pub other_kpis: OtherKpis,
    pub growth_metrics: GrowthMetrics,
    pub overall_score: u32,
}

/// Component averages behind a staff member's composite score. A component
/// is `None` when the staff member has no records of that kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffBreakdown {
    pub evaluation: Option<f64>,
    pub qa: Option<f64>,
    pub exam: Option<f64>,
    pub score: u32,
}

impl StaffBreakdown {
    pub fn has_data(&self) -> bool {
        self.evaluation.is_some() || self.qa.is_some() || self.exam.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RankedStaff {
    pub staff_id: String,
    pub name: String,
    pub role: String,
    pub breakdown: StaffBreakdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadTotals {
    pub calls: u32,
    pub chats: u32,
    pub tasks: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlaTotals {
    pub met: u32,
    pub total: u32,
    pub latest_contribution: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalStats {
    pub team_average: u32,
    pub csat: u32,
    pub response_speed: u32,
    pub sla_restaurant: u32,
    pub sla_massage: u32,
    pub sla_ai: u32,
    pub overall_sla: u32,
    pub retention: u32,
    pub return_rate: u32,
    pub overall_perf: u32,
}

impl GlobalStats {
    pub fn sla(&self, category: SlaCategory) -> u32 {
        match category {
            SlaCategory::Restaurant => self.sla_restaurant,
            SlaCategory::Massage => self.sla_massage,
            SlaCategory::Ai => self.sla_ai,
        }
    }
}
