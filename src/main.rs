//! Binary entry point: parse the command line, route logs to a file in the
//! data directory, open the SQLite-backed library and run the requested
//! command.
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use library_manager::config::{self, Cli, Command};
use library_manager::{run_app, seed_demo, App, Library, SystemClock};

fn init_logging(data_dir: &Path, level: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config::log_path(data_dir))
        .context("failed to open log file")?;
    let filter = match EnvFilter::try_from_env(config::LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).context("invalid --log-level filter")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_summary(library: &Library) {
    println!("Books:         {}", library.books().count());
    println!("Members:       {}", library.members().count());
    println!("Persons:       {}", library.persons().len());
    println!(
        "Loans:         {} ({} active)",
        library.loans().count(),
        library.loans().filter(|loan| loan.is_active()).count()
    );
    println!("Reservations:  {}", library.reservations().count());
    println!("Events:        {}", library.events().count());
    println!("Clubs:         {}", library.clubs().count());
    println!("Reading groups: {}", library.reading_groups().count());

    let overdue = library.overdue_loans();
    if overdue.is_empty() {
        println!("\nNo overdue loans.");
        return;
    }
    println!("\nOverdue loans:");
    for loan in overdue {
        let title = library
            .book(loan.book())
            .map(|book| book.title().to_string())
            .unwrap_or_default();
        let member = library
            .member(loan.member())
            .map(|member| member.person().full_name())
            .unwrap_or_default();
        println!(
            "  #{} {title} - {member}, due {}, fee {:.2}",
            loan.id(),
            loan.due_date(),
            loan.late_fee()
        );
    }
}

/// Initialize persistence and logging, then dispatch the subcommand.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir()?;
    fs::create_dir_all(&data_dir).context("failed to create data directory")?;
    init_logging(&data_dir, &cli.log_level)?;

    let db_path = config::db_path(&data_dir);
    let mut library =
        Library::open(&db_path, SystemClock).context("failed to open library database")?;
    info!(path = %db_path.display(), command = ?cli.command(), "library opened");

    match cli.command() {
        Command::Browse => {
            if seed_demo(&mut library).context("failed to seed demo data")? {
                info!("empty library seeded before browsing");
            }
            let mut app = App::new(library);
            run_app(&mut app)
        }
        Command::Seed => {
            if seed_demo(&mut library).context("failed to seed demo data")? {
                println!("Demo data written to {}.", db_path.display());
            } else {
                println!("Library already holds data; nothing seeded.");
            }
            Ok(())
        }
        Command::Summary => {
            print_summary(&library);
            Ok(())
        }
        Command::Sweep => {
            let report = library
                .refresh_statuses()
                .context("failed to refresh statuses")?;
            println!(
                "{} loan(s) newly overdue, {} reservation(s) expired.",
                report.newly_overdue.len(),
                report.newly_expired.len()
            );
            Ok(())
        }
    }
}
