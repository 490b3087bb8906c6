//! Profile and daily-state persistence with file locking.
//!
//! The tracker talks to storage through the [`Storage`] trait; the shipped
//! implementation keeps two JSON files in the data directory and writes them
//! atomically (temp file in the same directory, fsync, rename).

use crate::{DailyState, Error, Profile, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistence seam for the day tracker.
///
/// Every tracker operation awaits one of these calls to completion before it
/// is considered durable. Implementations must not partially write.
pub trait Storage {
    fn load_profile(&self) -> Result<Option<Profile>>;
    fn save_profile(&self, profile: &Profile) -> Result<()>;
    fn load_daily_state(&self) -> Result<Option<DailyState>>;
    fn save_daily_state(&self, day: &DailyState) -> Result<()>;
}

/// JSON-file storage under a data directory.
///
/// `profile.json` holds the long-lived profile; `today.json` holds the single
/// retained daily state (one day at a time, superseded at rollover).
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn profile_path(&self) -> PathBuf {
        self.dir.join("profile.json")
    }

    pub fn daily_state_path(&self) -> PathBuf {
        self.dir.join("today.json")
    }

    /// Read a locked file to a string, None if it does not exist.
    fn read_locked(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        file.unlock()?;
        read?;

        Ok(Some(contents))
    }

    /// Atomically write a file: temp file in the same directory, exclusive
    /// lock, fsync, rename over the original.
    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "storage path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl Storage for JsonStorage {
    /// A missing profile file means onboarding has not happened yet; a
    /// malformed one is a hard error. Profile data is never silently
    /// substituted with defaults.
    fn load_profile(&self) -> Result<Option<Profile>> {
        match Self::read_locked(&self.profile_path())? {
            None => Ok(None),
            Some(contents) => {
                let profile: Profile = serde_json::from_str(&contents)?;
                tracing::debug!("Loaded profile from {:?}", self.profile_path());
                Ok(Some(profile))
            }
        }
    }

    fn save_profile(&self, profile: &Profile) -> Result<()> {
        let contents = serde_json::to_string(profile)?;
        Self::write_atomic(&self.profile_path(), &contents)?;
        tracing::debug!("Saved profile to {:?}", self.profile_path());
        Ok(())
    }

    /// A corrupted daily-state file degrades to a fresh day with a warning.
    /// Unlike the profile, the ledger is rebuilt from scratch every rollover
    /// anyway, so a damaged file costs at most one day's counters.
    fn load_daily_state(&self) -> Result<Option<DailyState>> {
        let path = self.daily_state_path();
        match Self::read_locked(&path)? {
            None => Ok(None),
            Some(contents) => match serde_json::from_str::<DailyState>(&contents) {
                Ok(day) => {
                    tracing::debug!("Loaded daily state for {} from {:?}", day.date, path);
                    Ok(Some(day))
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse daily state {:?}: {}. Starting a fresh day.",
                        path,
                        e
                    );
                    Ok(None)
                }
            },
        }
    }

    fn save_daily_state(&self, day: &DailyState) -> Result<()> {
        let contents = serde_json::to_string(day)?;
        Self::write_atomic(&self.daily_state_path(), &contents)?;
        tracing::debug!("Saved daily state for {}", day.date);
        Ok(())
    }
}
