//! `course-backup` — back up courses of a learning site from the command line.
//!
//! # Overview
//!
//! The tool picks courses by id, shortname or category (optionally with all
//! subcategories), checks the destination, and hands every course to the
//! backup engine one after the other.  Finished archives are copied to the
//! destination and removed from the course backup file area.
//!
//! # Usage
//!
//! ```text
//! course-backup --courseid=2 --destination=/srv/backup/course_2.mbz
//! course-backup --courseshortname=MATH101 --destination=/srv/backup/
//! course-backup --categoryid=2 -r --destination=/srv/backup/
//! course-backup --print-config
//! ```
//!
//! # Module layout
//!
//! | Module              | Responsibility                                |
//! |---------------------|-----------------------------------------------|
//! | [`cli`]             | Argument types parsed by clap, usage checks   |
//! | [`config`]          | `Config` struct + layered TOML loader         |
//! | [`catalog`]         | Course, category and user records             |
//! | [`resolve`]         | Selection → list of courses                   |
//! | [`destination`]     | Destination validation                        |
//! | [`engine`]          | Backup engine seam and local engine           |
//! | [`commands::run`]   | Per-course backup loop                        |
//! | [`ui`]              | Headings, trace lines, spinner, summary       |
//! | [`error`]           | Errors that stop a run                        |

mod catalog;
mod cli;
mod commands;
mod config;
mod destination;
mod engine;
mod error;
mod resolve;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use catalog::Catalog;
use clap::{CommandFactory, Parser};
use cli::Cli;
use engine::LocalEngine;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if cli.print_config {
        let cfg = config::load_merged(&cli.config)?;
        println!("{cfg:#?}");
        return Ok(ExitCode::SUCCESS);
    }

    // Usage problems are answered with the help text before anything is
    // read from disk.
    let selection = match cli.selection() {
        Ok(selection) => selection,
        Err(e) => {
            Cli::command().print_help()?;
            println!();
            eprintln!("{e}");
            return Ok(ExitCode::from(2));
        },
    };

    let cfg = config::load_merged(&cli.config)?;
    let catalog = Catalog::load(&cfg.site.catalog_path())?;
    let engine = LocalEngine::new(&cfg.site.dataroot, cfg.backup);

    let mut stdout = std::io::stdout();
    match commands::run::run(&catalog, &engine, &selection, cli.destination.as_deref(), &mut stdout) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        // The summary only marks the failed course; the cause is printed here.
        Err(e) => {
            ui::fatal(&e.to_string());
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Diagnostic logging on stderr.  `RUST_LOG` overrides the `-v` count.
fn setup_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("course_backup={level}")));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
