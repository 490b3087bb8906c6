//! Intake journal: append-only log of every drink.
//!
//! Events are appended to a JSONL (JSON Lines) file with file locking.
//! Rollover discards the day's counters; history survives here until it is
//! rolled up into the CSV archive.

use crate::{IntakeEvent, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Intake sink trait for persisting drink events
pub trait IntakeSink {
    fn append(&mut self, event: &IntakeEvent) -> Result<()>;
}

/// JSONL-based intake sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl IntakeSink for JsonlSink {
    fn append(&mut self, event: &IntakeEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended intake event {} to journal", event.id);
        Ok(())
    }
}

/// Read all events from a journal file.
///
/// Damaged lines are skipped with a warning rather than failing the whole
/// read.
pub fn read_events(path: &Path) -> Result<Vec<IntakeEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<IntakeEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!("Failed to parse intake event at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} intake events from journal", events.len());
    Ok(events)
}

/// Events logged on a specific calendar date.
pub fn events_for_day(path: &Path, date: NaiveDate) -> Result<Vec<IntakeEvent>> {
    let events = read_events(path)?;
    Ok(events.into_iter().filter(|e| e.date == date).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntakeSource;
    use chrono::Utc;

    fn create_test_event(amount_ml: u32, days_ago: i64) -> IntakeEvent {
        let logged_at = Utc::now() - chrono::Duration::days(days_ago);
        IntakeEvent::new(logged_at, logged_at.date_naive(), amount_ml, IntakeSource::Manual)
    }

    #[test]
    fn test_append_and_read_single_event() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("intake.log");

        let event = create_test_event(250, 0);
        let event_id = event.id;

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&event).unwrap();

        let events = read_events(&journal_path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, event_id);
        assert_eq!(events[0].amount_ml, 250);
    }

    #[test]
    fn test_append_multiple_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("intake.log");

        let mut sink = JsonlSink::new(&journal_path);
        for _ in 0..5 {
            sink.append(&create_test_event(200, 0)).unwrap();
        }

        let events = read_events(&journal_path).unwrap();
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_read_empty_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("nonexistent.log");

        let events = read_events(&journal_path).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_damaged_line_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("intake.log");

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&create_test_event(200, 0)).unwrap();

        // Corrupt the journal with a garbage line, then append another event
        {
            use std::io::Write;
            let mut file = OpenOptions::new().append(true).open(&journal_path).unwrap();
            writeln!(file, "not json").unwrap();
        }
        sink.append(&create_test_event(300, 0)).unwrap();

        let events = read_events(&journal_path).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_events_for_day_filters() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("intake.log");

        let mut sink = JsonlSink::new(&journal_path);
        let today_event = create_test_event(250, 0);
        sink.append(&today_event).unwrap();
        sink.append(&create_test_event(300, 1)).unwrap();
        sink.append(&create_test_event(150, 2)).unwrap();

        let today = Utc::now().date_naive();
        let events = events_for_day(&journal_path, today).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, today_event.id);
    }
}
