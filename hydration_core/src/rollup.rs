//! CSV rollup for archiving the intake journal.
//!
//! Converts the JSONL journal into the long-term CSV archive atomically, so
//! a crash mid-rollup never loses drink history.

use crate::{IntakeEvent, IntakeSource, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    logged_at: String,
    amount_ml: u32,
    source: String,
}

impl From<&IntakeEvent> for CsvRow {
    fn from(event: &IntakeEvent) -> Self {
        CsvRow {
            id: event.id.to_string(),
            date: event.date.to_string(),
            logged_at: event.logged_at.to_rfc3339(),
            amount_ml: event.amount_ml,
            source: match event.source {
                IntakeSource::Manual => "manual".into(),
                IntakeSource::Reminder => "reminder".into(),
            },
        }
    }
}

/// Roll up journal events into CSV and archive the journal atomically
///
/// This function:
/// 1. Reads all events from the journal
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the journal to .processed
/// 5. Returns the number of events processed
///
/// # Safety
/// - CSV is fsynced before the journal is renamed
/// - The journal is renamed (not deleted) to allow manual recovery if needed
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let events = crate::journal::read_events(journal_path)?;

    if events.is_empty() {
        tracing::info!("No events in journal to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is brand new
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for event in &events {
        let row = CsvRow::from(event);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} intake events to CSV", events.len());

    let processed_path = journal_path.with_extension("log.processed");
    std::fs::rename(journal_path, &processed_path)?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(events.len())
}

/// Clean up old processed journal files
///
/// This removes all .log.processed files in the given directory.
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed journal: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}
