// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use tutor_roster::{
    format_date, snapshot, Attendance, BillingMode, ClassEdit, Config, HomeworkDone, Removal,
    Roster, SnapshotStore, Student, StudentDraft, StudentId, StudentPatch,
};

/// Roster, class log and payment schedule for a music tutor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON config file (defaults to <data_dir>/config.json)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// List students
    List {
        /// Include inactive students
        #[arg(long)]
        all: bool,
    },
    /// Show one student with class log and payments
    Show { student: String },
    /// Add a student
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// monthly, bimonthly or paid-in-full
        #[arg(long, default_value = "monthly")]
        mode: BillingMode,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        start: String,
    },
    /// Edit a student's details
    Edit {
        student: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        mode: Option<BillingMode>,
    },
    /// Delete a student
    Remove {
        student: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Move a student to or from the inactive history
    Toggle { student: String },
    /// Edit the class log
    Class {
        #[command(subcommand)]
        action: ClassCommand,
    },
    /// Mark payment NUMBER (1-based) as paid
    Pay { student: String, number: usize },
    /// Print the payment schedule
    Schedule { student: String },
    /// Replace the roster with a snapshot saved by the first version of the app
    ImportLegacy {
        file: PathBuf,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ClassCommand {
    /// Log a class (defaults to today)
    Add {
        student: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change fields of class NUMBER (1-based)
    Set {
        student: String,
        number: usize,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        attendance: Option<Attendance>,
        #[arg(long)]
        homework: Option<HomeworkDone>,
        #[arg(long)]
        assignment: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete class NUMBER (1-based)
    Remove { student: String, number: usize },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to read configuration")?;

    let interactive = matches!(args.command, None | Some(Command::Tui));
    init_logging(&config, args.verbose, interactive && cfg!(feature = "tui"))?;

    let store = config
        .open_store()
        .with_context(|| format!("Failed to open storage in {}", config.data_dir.display()))?;
    info!("Using storage {}", store.describe());
    let mut roster =
        Roster::open(store, config.roster_options()).context("Failed to load the roster")?;

    match args.command {
        None | Some(Command::Tui) => run_ui_mode(&mut roster, &config),
        Some(Command::List { all }) => {
            print_list(&roster, all);
            Ok(())
        }
        Some(Command::Show { student }) => {
            let id = resolve(&roster, &student)?;
            print_student(&roster, id, &config)
        }
        Some(Command::Add {
            name,
            email,
            phone,
            mode,
            start,
        }) => {
            let draft = StudentDraft::new(name, mode, start).with_contact(email, phone);
            let id = roster.add(&draft).context("Student not added")?;
            println!("✓ Added {} ({})", roster.selected().name, id);
            Ok(())
        }
        Some(Command::Edit {
            student,
            name,
            email,
            phone,
            start,
            mode,
        }) => {
            let id = resolve(&roster, &student)?;
            let patch = StudentPatch {
                name,
                email,
                phone,
                start_date: start,
                billing_mode: mode,
            };
            if patch.is_empty() {
                bail!("Nothing to change; pass at least one of --name/--email/--phone/--start/--mode");
            }
            roster.update(id, patch).context("Student not updated")?;
            println!("✓ Updated {}", describe(&roster, id));
            Ok(())
        }
        Some(Command::Remove { student, yes }) => {
            let id = resolve(&roster, &student)?;
            let outcome = if yes {
                roster.remove(id, &mut true)
            } else {
                roster.remove(id, &mut prompt_yes_no)
            }
            .context("Student not removed")?;

            match outcome {
                Removal::Removed(removed) => println!("✓ Removed {}", removed.name),
                Removal::Declined => println!("Kept {}", describe(&roster, id)),
            }
            Ok(())
        }
        Some(Command::Toggle { student }) => {
            let id = resolve(&roster, &student)?;
            let status = roster.toggle_active(id).context("Status not changed")?;
            println!("✓ {} is now {}", describe(&roster, id), status.as_str());
            Ok(())
        }
        Some(Command::Class { action }) => run_class_command(&mut roster, action),
        Some(Command::Pay { student, number }) => {
            let id = resolve(&roster, &student)?;
            roster.select(id)?;
            let index = to_index(number, "payment")?;
            if roster.payments().mark_paid(index).context("Payment not recorded")? {
                println!("✓ Payment {} of {} marked as paid", number, describe(&roster, id));
            } else {
                println!("Payment {} of {} was already paid", number, describe(&roster, id));
            }
            Ok(())
        }
        Some(Command::Schedule { student }) => {
            let id = resolve(&roster, &student)?;
            for row in roster.payment_rows(id)? {
                println!(
                    "{:>2}. {}  {}",
                    row.index + 1,
                    format_date(row.due, &config.date_format),
                    row.status.as_str()
                );
            }
            Ok(())
        }
        Some(Command::ImportLegacy { file, yes }) => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let decoded = snapshot::decode(&raw)
                .with_context(|| format!("{} is not a roster export", file.display()))?;

            let prompt = format!(
                "Replace {} stored students with {} from {}?",
                roster.len(),
                decoded.students.len(),
                file.display()
            );
            if !yes && !prompt_yes_no(&prompt) {
                println!("Import cancelled");
                return Ok(());
            }

            let count = decoded.students.len();
            roster.replace_all(decoded.students).context("Import not saved")?;
            println!("✓ Imported {} students", count);
            Ok(())
        }
    }
}

fn run_class_command<S: SnapshotStore>(roster: &mut Roster<S>, action: ClassCommand) -> Result<()> {
    match action {
        ClassCommand::Add { student, date } => {
            let id = resolve(roster, &student)?;
            roster.select(id)?;
            let mut log = roster.class_log();
            let logged = match date {
                Some(date) => log.append_on(date),
                None => log.append(),
            };
            logged.context("Class not logged")?;
            let count = log.entries()?.len();
            println!("✓ Logged class {} for {}", count, describe(roster, id));
        }
        ClassCommand::Set {
            student,
            number,
            date,
            attendance,
            homework,
            assignment,
            notes,
        } => {
            let id = resolve(roster, &student)?;
            roster.select(id)?;
            let index = to_index(number, "class")?;

            let edits: Vec<ClassEdit> = [
                date.map(ClassEdit::Date),
                attendance.map(ClassEdit::Attendance),
                homework.map(ClassEdit::HomeworkDone),
                assignment.map(ClassEdit::NextAssignment),
                notes.map(ClassEdit::Notes),
            ]
            .into_iter()
            .flatten()
            .collect();
            if edits.is_empty() {
                bail!("Nothing to change; pass at least one field flag");
            }

            let mut log = roster.class_log();
            for edit in edits {
                log.set_field(index, edit).context("Class not updated")?;
            }
            println!("✓ Updated class {} of {}", number, describe(roster, id));
        }
        ClassCommand::Remove { student, number } => {
            let id = resolve(roster, &student)?;
            roster.select(id)?;
            let index = to_index(number, "class")?;
            let removed = roster.class_log().remove_at(index).context("Class not removed")?;
            println!("✓ Removed class of {} from {}", removed.date, describe(roster, id));
        }
    }
    Ok(())
}

fn init_logging(config: &Config, verbose: u8, to_file: bool) -> Result<()> {
    let level = match verbose {
        0 => config.log_level.parse().unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    if to_file {
        // Terminal UI owns the screen; keep log lines out of it
        fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())
            .with_context(|| format!("Failed to open {}", config.log_path().display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else {
        builder.target(env_logger::Target::Stderr);
    }

    builder.init();
    Ok(())
}

/// Student by id, or by exact name (first match)
fn resolve<S: SnapshotStore>(roster: &Roster<S>, selector: &str) -> Result<StudentId> {
    if let Ok(id) = selector.parse::<StudentId>() {
        if roster.get(id).is_some() {
            return Ok(id);
        }
    }
    roster
        .find_by_name(selector)
        .map(|s| s.id)
        .with_context(|| format!("No student named {selector:?}"))
}

fn describe<S: SnapshotStore>(roster: &Roster<S>, id: StudentId) -> String {
    roster
        .get(id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn to_index(number: usize, what: &str) -> Result<usize> {
    number
        .checked_sub(1)
        .with_context(|| format!("{what} numbers start at 1"))
}

fn prompt_yes_no(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_list<S: SnapshotStore>(roster: &Roster<S>, all: bool) {
    let students = roster.list(all);
    if students.is_empty() {
        println!("No students");
        return;
    }
    for student in students {
        let marker = if student.id == roster.selected_id() { "→" } else { " " };
        println!(
            "{} {:<28} {:<13} {:<8} {}/{} paid  {}",
            marker,
            student.name,
            student.billing_mode.as_str(),
            student.status.as_str(),
            student.payment.paid_count(),
            student.payment.statuses.len(),
            student.id
        );
    }
}

fn print_student<S: SnapshotStore>(roster: &Roster<S>, id: StudentId, config: &Config) -> Result<()> {
    let student: &Student = roster
        .get(id)
        .with_context(|| format!("Student {id} is not in the roster"))?;

    println!("{}", student.name);
    println!("  Email:   {}", student.email);
    println!("  Phone:   {}", student.phone);
    println!("  Mode:    {}", student.billing_mode);
    println!("  Start:   {}", format_date(student.start_date, &config.date_format));
    println!("  Status:  {}", student.status.as_str());

    println!("\nClasses");
    if student.class_log.is_empty() {
        println!("  (none)");
    }
    for (i, class) in student.class_log.iter().enumerate() {
        println!(
            "  {:>2}. {}  {:<9} homework: {:<3}  next: {}  notes: {}",
            i + 1,
            format_date(class.date, &config.date_format),
            class.attendance.as_str(),
            class.homework_done.as_str(),
            class.next_assignment,
            class.notes
        );
    }

    println!("\nPayments");
    for row in roster.payment_rows(id)? {
        println!(
            "  {:>2}. {}  {}",
            row.index + 1,
            format_date(row.due, &config.date_format),
            row.status.as_str()
        );
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode<S: SnapshotStore>(roster: &mut Roster<S>, config: &Config) -> Result<()> {
    let mut app = ui::App::new(roster, config.date_format.clone());
    ui::run_ui(&mut app)?;
    roster.flush().context("Unsaved changes could not be written")?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode<S: SnapshotStore>(roster: &mut Roster<S>, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands, e.g. `tutor-roster list`\n");
    print_list(roster, false);
    Ok(())
}
