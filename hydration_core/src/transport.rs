//! Reminder transport seam.
//!
//! The core never delivers a notification itself. It tells a transport to
//! cancel everything and schedule a fresh list, always in full, never as an
//! incremental patch. The shipped implementation hands the pending agenda to
//! the shell through a JSON file; the `watch` and `agenda` commands read it
//! back.

use crate::{ReminderSlot, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Platform reminder scheduler as seen by the core.
pub trait ReminderTransport {
    /// Schedule the given slots, returning one opaque id per slot.
    fn schedule_all(&mut self, slots: &[ReminderSlot]) -> Result<Vec<Uuid>>;

    /// Cancel every pending reminder.
    fn cancel_all(&mut self) -> Result<()>;
}

/// One scheduled reminder as handed to the shell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub id: Uuid,
    pub time: NaiveTime,
    pub amount_ml: u32,
}

/// File-based transport: the pending agenda lives in `agenda.json`.
pub struct AgendaFile {
    path: PathBuf,
}

impl AgendaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReminderTransport for AgendaFile {
    fn schedule_all(&mut self, slots: &[ReminderSlot]) -> Result<Vec<Uuid>> {
        let entries: Vec<AgendaEntry> = slots
            .iter()
            .map(|slot| AgendaEntry {
                id: Uuid::new_v4(),
                time: slot.time,
                amount_ml: slot.amount_ml,
            })
            .collect();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, contents)?;

        tracing::info!("Scheduled {} reminders to {:?}", entries.len(), self.path);
        Ok(entries.iter().map(|e| e.id).collect())
    }

    fn cancel_all(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::write(&self.path, "[]")?;
            tracing::debug!("Cancelled all pending reminders in {:?}", self.path);
        }
        Ok(())
    }
}

/// Read the pending agenda back. Missing file means nothing scheduled.
pub fn read_agenda(path: &Path) -> Result<Vec<AgendaEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let entries: Vec<AgendaEntry> = serde_json::from_str(&contents)?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(h: u32, amount: u32, ordinal: u32) -> ReminderSlot {
        ReminderSlot {
            time: NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            amount_ml: amount,
            ordinal,
        }
    }

    #[test]
    fn test_schedule_writes_agenda() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("agenda.json");
        let mut transport = AgendaFile::new(&path);

        let ids = transport
            .schedule_all(&[slot(7, 160, 0), slot(8, 160, 1)])
            .unwrap();
        assert_eq!(ids.len(), 2);

        let agenda = read_agenda(&path).unwrap();
        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].amount_ml, 160);
        assert_eq!(agenda[0].id, ids[0]);
    }

    #[test]
    fn test_cancel_empties_agenda() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("agenda.json");
        let mut transport = AgendaFile::new(&path);

        transport.schedule_all(&[slot(7, 160, 0)]).unwrap();
        transport.cancel_all().unwrap();

        assert!(read_agenda(&path).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_without_agenda_is_fine() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut transport = AgendaFile::new(temp_dir.path().join("agenda.json"));
        transport.cancel_all().unwrap();
    }

    #[test]
    fn test_missing_agenda_reads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let agenda = read_agenda(&temp_dir.path().join("nonexistent.json")).unwrap();
        assert!(agenda.is_empty());
    }
}
