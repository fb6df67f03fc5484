use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use zen_core::*;

#[derive(Parser)]
#[command(name = "zen")]
#[command(about = "Guided kegel, box breathing and meditation timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the practice session, or a single exercise (default)
    Run {
        /// Only run this exercise (kegel, box-breathing, meditation)
        #[arg(long)]
        exercise: Option<ExerciseKind>,

        /// Feed simulated clock ticks without waiting (for testing)
        #[arg(long)]
        simulate: bool,

        /// Don't write progress or journal entries
        #[arg(long)]
        no_record: bool,
    },

    /// Show today's progress and a monthly summary
    Progress {
        /// Month to summarize, as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Print the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        zen_core::logging::init_with_level("debug");
    } else {
        zen_core::logging::init();
    }

    let config = load_config(cli.config.as_deref())?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Run {
            exercise,
            simulate,
            no_record,
        }) => cmd_run(&config, data_dir, exercise, simulate, no_record),
        Some(Commands::Progress { month }) => cmd_progress(data_dir, month),
        Some(Commands::Config { init }) => cmd_config(&config, cli.config, init),
        None => {
            // Default to "run" command
            cmd_run(&config, data_dir, None, false, false)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => Config::load_from(path),
        Some(path) => {
            tracing::info!("No config file at {:?}, using defaults", path);
            Ok(Config::default())
        }
        None => Config::load(),
    }
}

struct DataPaths {
    progress: PathBuf,
    journal: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        Self {
            progress: data_dir.join("progress.json"),
            journal: data_dir.join("journal.jsonl"),
        }
    }
}

fn cmd_run(
    config: &Config,
    data_dir: PathBuf,
    exercise: Option<ExerciseKind>,
    simulate: bool,
    no_record: bool,
) -> Result<()> {
    config.validate()?;

    let order = match exercise {
        Some(kind) => vec![kind],
        None => config.session.order.clone(),
    };

    // Rejects invalid timings before anything starts
    let mut session = PracticeSession::new(&config.exercises, &order)?;
    session.add_observer(ConsoleCues::new(config.exercises.clone()));

    let paths = DataPaths::new(&data_dir);
    if !no_record {
        std::fs::create_dir_all(&data_dir)?;
    }
    let mut journal = JsonlJournal::new(&paths.journal);

    let interval = config.tick_interval_seconds();

    display_exercise_header(session.sequencer(), session.position(), session.len());
    let mut current_total = session.sequencer().total_duration();
    let mut current_rounds = session.sequencer().total_rounds();
    let mut started_at = Utc::now();

    session.start();

    let mut last_tick = Instant::now();
    let mut shown_countdown = None;

    loop {
        let delta = if simulate {
            interval
        } else {
            thread::sleep(Duration::from_secs_f64(interval));
            let now = Instant::now();
            let elapsed = now.duration_since(last_tick).as_secs_f64();
            last_tick = now;
            elapsed
        };

        match session.tick(delta) {
            SessionStep::Continuing => {
                if !simulate {
                    let snapshot = session.sequencer().snapshot();
                    let key = (snapshot.phase_index, snapshot.phase_remaining_display);
                    if shown_countdown != Some(key) {
                        shown_countdown = Some(key);
                        render_countdown(&snapshot)?;
                    }
                }
            }
            SessionStep::ExerciseFinished(kind) | SessionStep::SessionFinished(kind) => {
                if !no_record {
                    let record = ExerciseRecord::new(
                        kind,
                        started_at,
                        Utc::now(),
                        current_total,
                        current_rounds,
                    );
                    journal.append(&record)?;
                    ProgressStore::record_exercise(&paths.progress, &record)?;
                    println!("  ✓ {} recorded", kind);
                }

                if session.is_finished() {
                    break;
                }

                display_exercise_header(session.sequencer(), session.position(), session.len());
                current_total = session.sequencer().total_duration();
                current_rounds = session.sequencer().total_rounds();
                started_at = Utc::now();
                shown_countdown = None;
            }
            SessionStep::Idle => break,
        }
    }

    println!();
    println!(
        "Session finished: {}/{} exercises completed",
        session.completed().len(),
        session.len()
    );

    if !no_record {
        let store = ProgressStore::load(&paths.progress)?;
        println!(
            "Today's progress: {:.0}%",
            store.completion_on(Local::now().date_naive()) * 100.0
        );
    }

    Ok(())
}

fn cmd_progress(data_dir: PathBuf, month: Option<String>) -> Result<()> {
    let paths = DataPaths::new(&data_dir);
    let store = ProgressStore::load(&paths.progress)?;
    let today = Local::now().date_naive();

    let (year, month) = match month {
        Some(ref m) => parse_month(m)?,
        None => (today.year(), today.month()),
    };

    let done = store
        .day(today)
        .map(|d| d.completed.clone())
        .unwrap_or_default();

    println!("Today ({})", today);
    for kind in ExerciseKind::ALL {
        let mark = if done.contains(&kind) { "x" } else { " " };
        println!("  [{}] {}", mark, kind);
    }
    println!(
        "  {}/{} exercises ({:.0}%)",
        done.len(),
        ExerciseKind::ALL.len(),
        store.completion_on(today) * 100.0
    );

    let summary = store.month_summary(year, month)?;
    println!();
    println!("{}-{:02}", summary.year, summary.month);
    println!(
        "  Days practiced: {}/{}",
        summary.days_practiced, summary.days_in_month
    );
    println!("  Full days:      {}", summary.full_days);
    println!(
        "  Average:        {:.0}%",
        summary.average_completion * 100.0
    );

    let records = read_records(&paths.journal)?;
    println!("  Exercises logged (all time): {}", records.len());

    Ok(())
}

fn cmd_config(config: &Config, path: Option<PathBuf>, init: bool) -> Result<()> {
    let path = path.unwrap_or_else(Config::default_config_path);

    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            Config::default().save_to(&path)?;
            println!("✓ Wrote default config to {}", path.display());
        }
    }

    println!("# {}", path.display());
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn parse_month(input: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| Error::Config(format!("Invalid month '{}', expected YYYY-MM", input)))?;
    Ok((date.year(), date.month()))
}

fn display_exercise_header(sequencer: &ExerciseSequencer, position: usize, count: usize) {
    let snapshot = sequencer.snapshot();
    println!();
    println!("╭─────────────────────────────────────────╮");
    println!(
        "│  {} ({}/{})",
        sequencer.kind().display_name().to_uppercase(),
        position + 1,
        count
    );
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  {} round(s), {}",
        sequencer.total_rounds(),
        snapshot.formatted_total_remaining()
    );
    for spec in sequencer.plan().phases() {
        println!("  → {}: {}s", spec.phase, spec.duration_seconds);
    }
    println!();
}

fn render_countdown(snapshot: &SequencerSnapshot) -> Result<()> {
    print!(
        "\r    {:>3}s   {:>3.0}%   {} left ",
        snapshot.phase_remaining_display,
        snapshot.overall_progress * 100.0,
        snapshot.formatted_total_remaining()
    );
    io::stdout().flush()?;
    Ok(())
}

/// Prints a cue line every time a phase starts
struct ConsoleCues {
    settings: ExerciseSettings,
}

impl ConsoleCues {
    fn new(settings: ExerciseSettings) -> Self {
        Self { settings }
    }
}

impl SequencerObserver for ConsoleCues {
    fn on_phase_enter(&mut self, kind: ExerciseKind, phase: Phase, round: u32) {
        println!(
            "\r  ▸ {:<12} round {}/{}              ",
            phase.label(),
            round,
            self.settings.round_count(kind)
        );
    }

    fn on_complete(&mut self, kind: ExerciseKind) {
        println!("\r  ✓ {} complete                      ", kind);
    }
}
