use clap::ValueEnum;

use atelier::entity::prelude::SyncLogModel;
use atelier::store::ledger;

/// Output format for ledger history.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Ledger scope to filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScopeArg {
    Artworks,
    Artists,
    Contacts,
    All,
}

impl ScopeArg {
    fn as_str(self) -> &'static str {
        match self {
            ScopeArg::Artworks => "artworks",
            ScopeArg::Artists => "artists",
            ScopeArg::Contacts => "contacts",
            ScopeArg::All => "all",
        }
    }
}

/// One ledger row for display.
#[derive(Debug, Clone, tabled::Tabled)]
pub(crate) struct RunRow {
    #[tabled(rename = "Started")]
    pub started: String,
    #[tabled(rename = "Scope")]
    pub scope: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Processed")]
    pub processed: i32,
    #[tabled(rename = "New")]
    pub created: i32,
    #[tabled(rename = "Updated")]
    pub updated: i32,
    #[tabled(rename = "Took")]
    pub took: String,
    #[tabled(rename = "By")]
    pub triggered_by: String,
    #[tabled(rename = "Error")]
    pub error: String,
}

/// Longest error excerpt shown in the table.
const ERROR_EXCERPT: usize = 60;

fn format_took(run: &SyncLogModel) -> String {
    match run.duration() {
        Some(d) if d.num_minutes() > 0 => {
            format!("{}m{:02}s", d.num_minutes(), d.num_seconds() % 60)
        }
        Some(d) => format!("{}s", d.num_seconds()),
        None => "-".to_string(),
    }
}

fn excerpt(error: Option<&str>) -> String {
    match error {
        None => String::new(),
        Some(e) if e.chars().count() <= ERROR_EXCERPT => e.to_string(),
        Some(e) => {
            let cut: String = e.chars().take(ERROR_EXCERPT - 1).collect();
            format!("{cut}…")
        }
    }
}

impl From<&SyncLogModel> for RunRow {
    fn from(run: &SyncLogModel) -> Self {
        Self {
            started: run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            scope: run.entity_type.clone(),
            status: run.status.to_string(),
            processed: run.records_processed,
            created: run.records_created,
            updated: run.records_updated,
            took: format_took(run),
            triggered_by: run.triggered_by.clone().unwrap_or_default(),
            error: excerpt(run.error.as_deref()),
        }
    }
}

pub(crate) async fn handle_history(
    scope: Option<ScopeArg>,
    limit: u64,
    output: OutputFormat,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = atelier::db::connect(database_url).await?;
    let runs = ledger::recent_runs(&db, scope.map(ScopeArg::as_str), limit).await?;

    match output {
        OutputFormat::Table => {
            if runs.is_empty() {
                println!("No sync runs recorded yet.");
                return Ok(());
            }
            let rows: Vec<RunRow> = runs.iter().map(RunRow::from).collect();
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&runs)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier::entity::prelude::{SyncDirection, SyncStatus};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn run(status: SyncStatus, took_secs: Option<i64>, error: Option<&str>) -> SyncLogModel {
        let started = Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap().fixed_offset();
        SyncLogModel {
            id: Uuid::nil(),
            entity_type: "all".to_string(),
            direction: SyncDirection::Pull,
            status,
            records_processed: 12,
            records_created: 5,
            records_updated: 7,
            error: error.map(str::to_string),
            started_at: started,
            completed_at: took_secs.map(|s| started + Duration::seconds(s)),
            triggered_by: Some("schedule".to_string()),
        }
    }

    #[test]
    fn row_formats_a_finished_run() {
        let row = RunRow::from(&run(SyncStatus::Completed, Some(125), None));
        assert_eq!(row.started, "2026-02-03 04:05:06");
        assert_eq!(row.status, "completed");
        assert_eq!(row.took, "2m05s");
        assert_eq!(row.triggered_by, "schedule");
        assert!(row.error.is_empty());
    }

    #[test]
    fn row_marks_running_runs_and_truncates_errors() {
        let long = "x".repeat(200);
        let row = RunRow::from(&run(SyncStatus::Running, None, Some(&long)));
        assert_eq!(row.took, "-");
        assert_eq!(row.error.chars().count(), ERROR_EXCERPT);
        assert!(row.error.ends_with('…'));
    }

    #[test]
    fn short_runs_show_seconds() {
        let row = RunRow::from(&run(SyncStatus::Cancelled, Some(42), Some("2 errors: a; b")));
        assert_eq!(row.took, "42s");
        assert_eq!(row.error, "2 errors: a; b");
    }
}
