//! `tutorsched` CLI — allocate term lessons and manage tutor availability.
//!
//! ## Usage
//!
//! ```sh
//! # Show the concrete dates of a term for a request created today
//! tutorsched term-window --term Sept-Christmas
//!
//! # Preview the lessons a request would produce
//! tutorsched occurrences --term Jan-Easter --weekday Tuesday \
//!     --frequency Bi-Weekly --start-time 16:00 --created 2025-11-03
//!
//! # Record a request, then allocate it to a tutor
//! tutorsched tutor register --user 2 --subject Python
//! tutorsched request create --student 1 --subject Python --term Sept-Christmas \
//!     --weekday Monday --frequency Weekly --duration 60
//! tutorsched request status --id 2 --status allocated --tutor 2 --start-time 10:00
//!
//! # Declare availability (overlapping blocks on the same day are merged)
//! tutorsched availability add --user 2 --weekday Monday --start 10:00 --end 12:00
//! tutorsched availability list --user 2
//! ```
//!
//! State is kept in a JSON file (`--state`, default `tutorsched.json`). Calendar
//! tables can be overridden with `--config` or `TUTORSCHED_CONFIG`. Set
//! `RUST_LOG=info` to see what the store does.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use lesson_engine::term::now_in;
use lesson_engine::{
    generate_occurrences, parse_reference, parse_start_time, parse_weekday, resolve_term_window,
    weekday_label, AllocatedLesson, CalendarConfig, Frequency, LessonId, LessonStatus,
    NewLessonRequest, RequestId, Schedule, ScheduleId, SchedulingStore, Term, UserId,
};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tutorsched",
    version,
    about = "Term lesson allocation and tutor availability"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file holding requests, lessons, tutors and availability
    #[arg(long, global = true, default_value = "tutorsched.json")]
    state: PathBuf,

    /// JSON file overriding term boundaries, frequency steps or durations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

/// When a request was made. Defaults to now in `--timezone`.
#[derive(Args)]
struct Created {
    /// Reference date or date-time (e.g. 2024-12-25 or 2024-12-25T10:00:00+01:00)
    #[arg(long)]
    created: Option<String>,

    /// IANA timezone used for "now" when --created is omitted
    #[arg(long, default_value = "UTC")]
    timezone: String,
}

impl Created {
    fn resolve(&self) -> Result<NaiveDateTime> {
        match &self.created {
            Some(raw) => Ok(parse_reference(raw)?),
            None => Ok(now_in(&self.timezone)?),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the calendar dates a term covers
    TermWindow {
        #[arg(long)]
        term: String,
        #[command(flatten)]
        created: Created,
    },
    /// List the lessons a recurring request would produce, without storing them
    Occurrences {
        #[arg(long)]
        term: String,
        #[arg(long)]
        weekday: String,
        #[arg(long)]
        frequency: String,
        /// Lesson start time as HH:MM
        #[arg(long)]
        start_time: String,
        #[command(flatten)]
        created: Created,
    },
    /// Manage lesson requests and their allocated lessons
    #[command(subcommand)]
    Request(RequestCommand),
    /// Manage tutor availability blocks
    #[command(subcommand)]
    Availability(AvailabilityCommand),
    /// Register and search tutors
    #[command(subcommand)]
    Tutor(TutorCommand),
}

#[derive(Subcommand)]
enum RequestCommand {
    /// Record a new lesson request
    Create {
        #[arg(long)]
        student: u64,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        term: String,
        #[arg(long)]
        weekday: String,
        #[arg(long)]
        frequency: String,
        /// Lesson length in minutes
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        preferred_tutor: Option<u64>,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        created: Created,
    },
    /// Allocate or unallocate a request
    Status {
        #[arg(long)]
        id: u64,
        /// allocated, unallocated (pending is accepted as unallocated)
        #[arg(long)]
        status: String,
        #[arg(long)]
        tutor: Option<u64>,
        /// Lesson start time as HH:MM
        #[arg(long)]
        start_time: Option<String>,
    },
    /// List stored requests
    List {
        #[arg(long)]
        student: Option<u64>,
    },
    /// Show the allocated lessons of one request
    Lessons {
        #[arg(long)]
        id: u64,
    },
    /// Delete a request and all of its lessons
    Delete {
        #[arg(long)]
        id: u64,
    },
    /// Cancel a single allocated lesson
    CancelLesson {
        #[arg(long)]
        lesson: u64,
    },
}

#[derive(Subcommand)]
enum AvailabilityCommand {
    /// Add a block, merging it with overlapping blocks on the same day
    Add {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        weekday: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Change an existing block's day and times
    Update {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        weekday: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Remove a block
    Remove {
        #[arg(long)]
        id: u64,
    },
    /// List a user's blocks, Sunday first
    List {
        #[arg(long)]
        user: u64,
    },
}

#[derive(Subcommand)]
enum TutorCommand {
    /// Register a user as a tutor of a subject
    Register {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        subject: String,
    },
    /// List tutors, optionally filtered by subject and available weekday
    List {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        day: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        command,
        state,
        config,
        json: as_json,
    } = Cli::parse();
    let config = load_config(config)?;

    match command {
        Commands::TermWindow { term, created } => {
            let window = resolve_term_window(&config, &term, created.resolve()?)?;
            if as_json {
                print_json(&window)?;
            } else {
                println!("{}: {} to {}", term, window.lower, window.upper);
            }
        }
        Commands::Occurrences {
            term,
            weekday,
            frequency,
            start_time,
            created,
        } => {
            let start_time = parse_start_time(&start_time)?;
            let window = resolve_term_window(&config, &term, created.resolve()?)?;
            let occurrences: Vec<_> =
                generate_occurrences(&config, &window, &weekday, &frequency, start_time)?.collect();
            if as_json {
                print_json(&occurrences)?;
            } else {
                for o in &occurrences {
                    println!(
                        "{}\t{}\t{}\t{}",
                        o.index,
                        o.date,
                        weekday_label(o.date.weekday()),
                        hhmm(o.time)
                    );
                }
            }
        }
        Commands::Request(command) => {
            let mut store = load_store(&state)?;
            run_request(command, &mut store, &config, as_json)?;
            save_store(&store, &state)?;
        }
        Commands::Availability(command) => {
            let mut store = load_store(&state)?;
            run_availability(command, &mut store, as_json)?;
            save_store(&store, &state)?;
        }
        Commands::Tutor(command) => {
            let mut store = load_store(&state)?;
            run_tutor(command, &mut store, as_json)?;
            save_store(&store, &state)?;
        }
    }

    Ok(())
}

fn run_request(
    command: RequestCommand,
    store: &mut SchedulingStore,
    config: &CalendarConfig,
    as_json: bool,
) -> Result<()> {
    match command {
        RequestCommand::Create {
            student,
            subject,
            term,
            weekday,
            frequency,
            duration,
            preferred_tutor,
            description,
            created,
        } => {
            let new = NewLessonRequest {
                student: UserId(student),
                preferred_tutor: preferred_tutor.map(UserId),
                subject,
                term: term.parse::<Term>()?,
                weekday: parse_weekday(&weekday)?,
                frequency: frequency.parse::<Frequency>()?,
                duration_minutes: duration,
                description,
                created_at: created.resolve()?,
            };
            let id = store
                .create_request(config, new)
                .context("Failed to create lesson request")?;
            if as_json {
                print_json(store.request(id)?)?;
            } else {
                println!("Created lesson request {}", id);
            }
        }
        RequestCommand::Status {
            id,
            status,
            tutor,
            start_time,
        } => {
            let id = RequestId(id);
            let status: LessonStatus = status.parse()?;
            let start_time = start_time.as_deref().map(parse_start_time).transpose()?;
            let count = store
                .update_request_status(config, id, status, tutor.map(UserId), start_time)
                .with_context(|| format!("Failed to update lesson request {}", id))?;
            if as_json {
                print_json(&json!({ "request": id, "status": status, "lessons": count }))?;
            } else {
                println!(
                    "Lesson request {} status updated to '{}' ({} lessons)",
                    id, status, count
                );
            }
        }
        RequestCommand::List { student } => {
            let requests: Vec<_> = match student {
                Some(student) => store.requests_for_student(UserId(student)),
                None => store.requests().collect(),
            };
            if as_json {
                print_json(&requests)?;
            } else {
                for r in requests {
                    println!(
                        "{}\t{}\t{}\t{} {}\t{}",
                        r.id,
                        r.status,
                        r.subject,
                        r.frequency,
                        weekday_label(r.weekday),
                        r.term
                    );
                }
            }
        }
        RequestCommand::Lessons { id } => {
            let id = RequestId(id);
            store.request(id)?;
            let lessons = store.lessons_for_request(id);
            if as_json {
                print_json(&lessons)?;
            } else {
                for lesson in lessons {
                    println!("{}", describe_lesson(lesson));
                }
            }
        }
        RequestCommand::Delete { id } => {
            let removed = store.delete_request(RequestId(id))?;
            println!("Deleted lesson request {}", removed.id);
        }
        RequestCommand::CancelLesson { lesson } => {
            let cancelled = store.cancel_lesson(LessonId(lesson))?;
            println!("Cancelled {}", describe_lesson(&cancelled));
        }
    }
    Ok(())
}

fn run_availability(
    command: AvailabilityCommand,
    store: &mut SchedulingStore,
    as_json: bool,
) -> Result<()> {
    match command {
        AvailabilityCommand::Add {
            user,
            weekday,
            start,
            end,
        } => {
            let schedule = store.add_block(
                UserId(user),
                parse_weekday(&weekday)?,
                parse_start_time(&start)?,
                parse_start_time(&end)?,
            )?;
            print_schedules(std::slice::from_ref(&schedule), as_json)?;
        }
        AvailabilityCommand::Update {
            id,
            weekday,
            start,
            end,
        } => {
            let schedule = store.update_block(
                ScheduleId(id),
                parse_weekday(&weekday)?,
                parse_start_time(&start)?,
                parse_start_time(&end)?,
            )?;
            print_schedules(std::slice::from_ref(&schedule), as_json)?;
        }
        AvailabilityCommand::Remove { id } => {
            let removed = store.remove_block(ScheduleId(id))?;
            println!("Removed block {}", removed.id);
        }
        AvailabilityCommand::List { user } => {
            print_schedules(&store.blocks_for(UserId(user)), as_json)?;
        }
    }
    Ok(())
}

fn run_tutor(command: TutorCommand, store: &mut SchedulingStore, as_json: bool) -> Result<()> {
    match command {
        TutorCommand::Register { user, subject } => {
            store.register_tutor(UserId(user), &subject)?;
            println!("Registered tutor {} for {}", user, subject.trim());
        }
        TutorCommand::List { subject, day } => {
            let day = day.as_deref().map(parse_weekday).transpose()?;
            let listings = store.find_tutors(subject.as_deref(), day);
            if as_json {
                print_json(&listings)?;
            } else {
                for listing in listings {
                    let blocks: Vec<String> = listing.schedules.iter().map(describe_block).collect();
                    println!("{}\t{}\t{}", listing.user, listing.subject, blocks.join(", "));
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<CalendarConfig> {
    let path = path.or_else(|| std::env::var_os("TUTORSCHED_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading calendar config");
            CalendarConfig::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Ok(CalendarConfig::default()),
    }
}

fn load_store(path: &Path) -> Result<SchedulingStore> {
    SchedulingStore::load(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))
}

fn save_store(store: &SchedulingStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("Failed to write state file: {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_schedules(schedules: &[Schedule], as_json: bool) -> Result<()> {
    if as_json {
        return print_json(schedules);
    }
    for schedule in schedules {
        println!("{} (block {})", describe_block(schedule), schedule.id);
    }
    Ok(())
}

fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn describe_block(schedule: &Schedule) -> String {
    format!(
        "{} {}-{}",
        weekday_label(schedule.weekday),
        hhmm(schedule.block.start()),
        hhmm(schedule.block.end())
    )
}

fn describe_lesson(lesson: &AllocatedLesson) -> String {
    format!(
        "#{}\t{}\t{}\t{}\ttutor {}\t(lesson {})",
        lesson.occurrence,
        lesson.date,
        hhmm(lesson.time),
        lesson.subject,
        lesson.tutor,
        lesson.id
    )
}
