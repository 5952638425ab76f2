use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::models::{EvaluationType, SlaCategory};
use crate::store::{AppState, NewEvaluation};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(serde::Deserialize)]
struct CsvRow {
    staff_id: String,
    date: NaiveDate,
    #[serde(rename = "type")]
    kind: EvaluationType,
    project: Option<SlaCategory>,
    communication: u32,
    speed: u32,
    process: u32,
    calls: u32,
    chats: u32,
    tasks: u32,
    sla_met: u32,
    sla_total: u32,
    latest_test_score: Option<u32>,
    #[serde(default)]
    note: String,
}

impl From<CsvRow> for NewEvaluation {
    fn from(row: CsvRow) -> Self {
        NewEvaluation {
            staff_id: row.staff_id,
            date: row.date,
            kind: row.kind,
            project: row.project,
            communication_score: row.communication,
            speed_score: row.speed,
            process_compliance: row.process,
            calls: row.calls,
            chats: row.chats,
            tasks: row.tasks,
            sla_met_count: row.sla_met,
            sla_total_base: row.sla_total,
            latest_test_score: row.latest_test_score,
            note: row.note,
        }
    }
}

pub fn import_csv(state: &mut AppState, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    import_evaluations(state, file)
}

/// Rows are validated like interactive entries; rejected rows are skipped.
pub fn import_evaluations<R: Read>(state: &mut AppState, input: R) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_reader(input);
    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(line, error = %err, "skipping malformed evaluation row");
                summary.skipped += 1;
                continue;
            }
        };

        match state.add_evaluation(row.into(), Utc::now()) {
            Ok(_) => summary.inserted += 1,
            Err(err) => {
                warn!(line, error = %err, "skipping rejected evaluation row");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
