use chrono::{Local, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use hydration_core::timeutil::{minutes_since_midnight, parse_hhmm};
use hydration_core::units::{fl_oz_to_ml, format_volume, format_weight};
use hydration_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sip")]
#[command(about = "Personal hydration goal and reminder system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the profile and start today's plan
    Setup {
        /// Body weight in kilograms (1-500)
        #[arg(long)]
        weight: f64,

        /// Activity level (none, light, moderate, heavy)
        #[arg(long)]
        activity: String,

        /// Climate (cold, mild, hot, very_hot)
        #[arg(long)]
        climate: String,

        /// Wake time, HH:MM
        #[arg(long)]
        wake: String,

        /// Sleep time, HH:MM
        #[arg(long)]
        sleep: String,

        /// Reminder interval in minutes (60 or 90)
        #[arg(long, default_value_t = 60)]
        interval: u32,
    },

    /// Show today's goal, progress and next reminder
    Status,

    /// Log a drink
    Drink {
        /// Amount drunk (millilitres, or fluid ounces with --oz)
        amount: f64,

        /// Interpret the amount as US fluid ounces
        #[arg(long)]
        oz: bool,
    },

    /// Mark the pending reminder done and credit its amount
    Done,

    /// Skip the pending reminder and spread its share over the rest
    Skip,

    /// Print the pending reminder agenda
    Agenda,

    /// Update profile settings
    Set {
        /// Body weight in kilograms (1-500)
        #[arg(long)]
        weight: Option<f64>,

        /// Activity level (none, light, moderate, heavy)
        #[arg(long)]
        activity: Option<String>,

        /// Climate (cold, mild, hot, very_hot)
        #[arg(long)]
        climate: Option<String>,

        /// Wake time, HH:MM
        #[arg(long)]
        wake: Option<String>,

        /// Sleep time, HH:MM
        #[arg(long)]
        sleep: Option<String>,

        /// Reminder interval in minutes (60 or 90)
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Foreground loop: announce due reminders and roll the day over
    Watch {
        /// Run a single check instead of looping (for scripting)
        #[arg(long)]
        once: bool,
    },

    /// Roll up the intake journal to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    hydration_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let today = Local::now().date_naive();
    let now = Local::now().time();

    match cli.command {
        Commands::Setup {
            weight,
            activity,
            climate,
            wake,
            sleep,
            interval,
        } => cmd_setup(
            data_dir, &config, weight, &activity, &climate, &wake, &sleep, interval, today,
        ),
        Commands::Status => cmd_status(data_dir, &config, today, now),
        Commands::Drink { amount, oz } => cmd_drink(data_dir, &config, amount, oz, today),
        Commands::Done => cmd_done(data_dir, &config, today),
        Commands::Skip => cmd_skip(data_dir, &config, today, now),
        Commands::Agenda => cmd_agenda(data_dir, &config),
        Commands::Set {
            weight,
            activity,
            climate,
            wake,
            sleep,
            interval,
        } => cmd_set(
            data_dir, &config, weight, activity, climate, wake, sleep, interval, today,
        ),
        Commands::Watch { once } => cmd_watch(data_dir, &config, once),
        Commands::Rollup { cleanup } => cmd_rollup(data_dir, cleanup),
    }
}

fn storage(data_dir: &PathBuf) -> JsonStorage {
    JsonStorage::new(data_dir)
}

fn transport(data_dir: &PathBuf) -> AgendaFile {
    AgendaFile::new(data_dir.join("agenda.json"))
}

fn journal_path(data_dir: &PathBuf) -> PathBuf {
    data_dir.join("intake.log")
}

fn open_tracker(
    data_dir: &PathBuf,
    today: NaiveDate,
) -> Result<HydrationTracker<JsonStorage, AgendaFile>> {
    HydrationTracker::open(storage(data_dir), transport(data_dir), today)
}

#[allow(clippy::too_many_arguments)]
fn cmd_setup(
    data_dir: PathBuf,
    config: &Config,
    weight: f64,
    activity: &str,
    climate: &str,
    wake: &str,
    sleep: &str,
    interval: u32,
    today: NaiveDate,
) -> Result<()> {
    let profile = Profile::new(
        weight,
        parse_activity(activity)?,
        parse_climate(climate)?,
        parse_hhmm(wake)?,
        parse_hhmm(sleep)?,
        ReminderInterval::from_minutes(interval)?,
    )?;

    let tracker = HydrationTracker::initialize(
        storage(&data_dir),
        transport(&data_dir),
        profile,
        today,
    )?;

    println!("✓ Profile saved");
    println!(
        "  Weight: {}",
        format_weight(tracker.profile().weight_kg, config.display.units)
    );
    println!(
        "  Daily goal: {}",
        format_volume(tracker.goal_ml(), config.display.units)
    );
    println!(
        "  {} reminders planned, {} each",
        tracker.day().planned_total,
        format_volume(tracker.day().slot_amount_ml, config.display.units)
    );

    Ok(())
}

fn cmd_status(data_dir: PathBuf, config: &Config, today: NaiveDate, now: NaiveTime) -> Result<()> {
    let tracker = open_tracker(&data_dir, today)?;
    let units = config.display.units;
    let day = tracker.day();

    println!("Hydration for {}", day.date);
    println!("  Goal:      {}", format_volume(tracker.goal_ml(), units));
    println!("  Consumed:  {}", format_volume(day.consumed_ml, units));
    println!("  Remaining: {}", format_volume(day.remaining_ml, units));
    println!(
        "  Reminders: {} done, {} skipped, {} left",
        day.completed,
        day.skipped,
        day.reminders_left()
    );

    match tracker.next_slot(now) {
        Some(slot) => println!(
            "  Next reminder: {} ({})",
            slot.time.format("%H:%M"),
            format_volume(slot.amount_ml, units)
        ),
        None => println!("  No more reminders today."),
    }

    Ok(())
}

fn cmd_drink(
    data_dir: PathBuf,
    config: &Config,
    amount: f64,
    oz: bool,
    today: NaiveDate,
) -> Result<()> {
    let amount_ml = if oz {
        fl_oz_to_ml(amount)
    } else if amount < 0.0 {
        0
    } else {
        amount.round() as u32
    };

    let mut tracker = open_tracker(&data_dir, today)?;
    tracker.record_consumption(amount_ml)?;

    let mut sink = JsonlSink::new(journal_path(&data_dir));
    sink.append(&IntakeEvent::new(
        Utc::now(),
        today,
        amount_ml,
        IntakeSource::Manual,
    ))?;

    println!(
        "✓ Logged {} ({} remaining)",
        format_volume(amount_ml, config.display.units),
        format_volume(tracker.day().remaining_ml, config.display.units)
    );

    Ok(())
}

fn cmd_done(data_dir: PathBuf, config: &Config, today: NaiveDate) -> Result<()> {
    let mut tracker = open_tracker(&data_dir, today)?;
    let credited = tracker.complete_reminder()?;

    let mut sink = JsonlSink::new(journal_path(&data_dir));
    sink.append(&IntakeEvent::new(
        Utc::now(),
        today,
        credited,
        IntakeSource::Reminder,
    ))?;

    println!(
        "✓ Reminder done, credited {} ({} remaining)",
        format_volume(credited, config.display.units),
        format_volume(tracker.day().remaining_ml, config.display.units)
    );

    Ok(())
}

fn cmd_skip(data_dir: PathBuf, config: &Config, today: NaiveDate, now: NaiveTime) -> Result<()> {
    let mut tracker = open_tracker(&data_dir, today)?;
    let new_amount = tracker.skip_reminder(now)?;
    let left = tracker.day().reminders_left();

    if new_amount == 0 {
        println!("✓ Reminder skipped; goal already covered, no more prompts needed");
    } else {
        println!(
            "✓ Reminder skipped; {} left at {} each",
            left,
            format_volume(new_amount, config.display.units)
        );
    }

    Ok(())
}

fn cmd_agenda(data_dir: PathBuf, config: &Config) -> Result<()> {
    let agenda = read_agenda(&data_dir.join("agenda.json"))?;

    if agenda.is_empty() {
        println!("No reminders scheduled.");
        return Ok(());
    }

    println!("Pending reminders:");
    for entry in agenda {
        println!(
            "  {}  {}",
            entry.time.format("%H:%M"),
            format_volume(entry.amount_ml, config.display.units)
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_set(
    data_dir: PathBuf,
    config: &Config,
    weight: Option<f64>,
    activity: Option<String>,
    climate: Option<String>,
    wake: Option<String>,
    sleep: Option<String>,
    interval: Option<u32>,
    today: NaiveDate,
) -> Result<()> {
    let mut tracker = open_tracker(&data_dir, today)?;

    let body_changed = weight.is_some() || activity.is_some() || climate.is_some();
    let routine_changed = wake.is_some() || sleep.is_some() || interval.is_some();

    if !body_changed && !routine_changed {
        return Err(Error::Validation("nothing to update; pass at least one setting".into()));
    }

    if body_changed {
        let new_weight = weight.unwrap_or(tracker.profile().weight_kg);
        let new_activity = match activity {
            Some(ref s) => parse_activity(s)?,
            None => tracker.profile().activity,
        };
        let new_climate = match climate {
            Some(ref s) => parse_climate(s)?,
            None => tracker.profile().climate,
        };
        let new_goal = tracker.update_body(new_weight, new_activity, new_climate)?;
        println!(
            "✓ Goal recalculated: {}",
            format_volume(new_goal, config.display.units)
        );
    }

    if routine_changed {
        let new_wake = match wake {
            Some(ref s) => parse_hhmm(s)?,
            None => tracker.profile().wake,
        };
        let new_sleep = match sleep {
            Some(ref s) => parse_hhmm(s)?,
            None => tracker.profile().sleep,
        };
        let new_interval = match interval {
            Some(m) => ReminderInterval::from_minutes(m)?,
            None => tracker.profile().interval,
        };
        tracker.update_routine(new_wake, new_sleep, new_interval)?;
        println!(
            "✓ Schedule regenerated: {} reminders planned",
            tracker.day().planned_total
        );
    }

    Ok(())
}

fn cmd_watch(data_dir: PathBuf, config: &Config, once: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let mut tracker = open_tracker(&data_dir, today)?;
    let mut last_tick = minutes_since_midnight(Local::now().time());

    println!(
        "Watching; checking every {} seconds. Ctrl-C to stop.",
        config.watch.poll_seconds
    );

    loop {
        let today = Local::now().date_naive();
        let now = Local::now().time();
        let now_m = minutes_since_midnight(now);

        // Liveness check only: a missed tick delays rollover, the next
        // open() would catch it anyway.
        if tracker.check_rollover(today)? {
            println!("— New day: {} —", today);
            last_tick = 0;
        }

        let agenda = read_agenda(&data_dir.join("agenda.json"))?;
        for entry in &agenda {
            let entry_m = minutes_since_midnight(entry.time);
            if entry_m > last_tick && entry_m <= now_m {
                println!(
                    "⏰ {}  time to drink {}",
                    entry.time.format("%H:%M"),
                    format_volume(entry.amount_ml, config.display.units)
                );
            }
        }
        last_tick = now_m;

        if once {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(config.watch.poll_seconds));
    }
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let journal = journal_path(&data_dir);
    let csv_path = data_dir.join("intake_history.csv");

    if !journal.exists() {
        println!("No journal file found - nothing to roll up.");
        return Ok(());
    }

    let count = hydration_core::rollup::journal_to_csv_and_archive(&journal, &csv_path)?;

    println!("✓ Rolled up {} intake events to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = hydration_core::rollup::cleanup_processed_logs(&data_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}

fn parse_activity(s: &str) -> Result<ActivityLevel> {
    match s.to_lowercase().as_str() {
        "none" => Ok(ActivityLevel::None),
        "light" => Ok(ActivityLevel::Light),
        "moderate" => Ok(ActivityLevel::Moderate),
        "heavy" => Ok(ActivityLevel::Heavy),
        other => Err(Error::Validation(format!(
            "unknown activity level '{}'; expected none, light, moderate or heavy",
            other
        ))),
    }
}

fn parse_climate(s: &str) -> Result<Climate> {
    match s.to_lowercase().as_str() {
        "cold" => Ok(Climate::Cold),
        "mild" => Ok(Climate::Mild),
        "hot" => Ok(Climate::Hot),
        "very_hot" | "veryhot" | "very-hot" => Ok(Climate::VeryHot),
        other => Err(Error::Validation(format!(
            "unknown climate '{}'; expected cold, mild, hot or very_hot",
            other
        ))),
    }
}
