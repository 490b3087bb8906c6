#![forbid(unsafe_code)]

//! Core domain model and business logic for the Sip hydration system.
//!
//! This crate provides:
//! - Domain types (profile, daily ledger, reminder slots, intake events)
//! - Daily goal calculation
//! - Reminder schedule generation and skip redistribution
//! - The daily state machine (consumption tracking, rollover)
//! - Persistence (profile/day storage, intake journal, CSV rollup)
//! - The reminder transport seam

pub mod types;
pub mod error;
pub mod timeutil;
pub mod goal;
pub mod schedule;
pub mod redistribute;
pub mod config;
pub mod logging;
pub mod units;
pub mod store;
pub mod transport;
pub mod journal;
pub mod rollup;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use goal::daily_goal_ml;
pub use schedule::generate_schedule;
pub use redistribute::redistribute_ml;
pub use store::{JsonStorage, Storage};
pub use transport::{read_agenda, AgendaEntry, AgendaFile, ReminderTransport};
pub use journal::{IntakeSink, JsonlSink};
pub use units::DisplayUnits;
pub use tracker::HydrationTracker;
