use std::collections::HashSet;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod bots;
mod db;
mod error;
mod iterutils;
mod loader;
mod models;
mod parser;
mod reports;
mod sample;
mod sessions;
mod stats;

use crate::error::Error;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Parses NASA HTTP access logs, removes crawler traffic, \
             reconstructs visitor sessions and reports on them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a log, remove bots, identify sessions and store the table
    Process {
        #[arg(long, value_name = "FILE", help = "Access log to ingest")]
        log: PathBuf,

        #[arg(
            long,
            value_name = "FILE",
            default_value = "sessions.db",
            help = "SQLite database to write"
        )]
        db: PathBuf,

        #[arg(
            long,
            value_name = "SECONDS",
            default_value_t = 1800,
            help = "Inactivity gap that splits a visitor's sessions"
        )]
        timeout: u64,

        #[arg(
            long,
            value_name = "EXT,EXT",
            value_delimiter = ',',
            help = "Keep only these page extensions (suffix-less pages always stay)"
        )]
        extensions: Option<Vec<String>>,

        #[arg(
            long,
            conflicts_with = "extensions",
            help = "Keep only document-like extensions (htm, html, pdf, ...)"
        )]
        documents_only: bool,

        #[arg(long, help = "Replace host names with truncated hashes")]
        hash_hosts: bool,

        #[arg(
            long,
            value_name = "DIR",
            default_value = "output/tables",
            help = "Directory for the extension and bot tables"
        )]
        out_dir: PathBuf,
    },
    /// Write the CSV report battery from a stored table
    Report {
        #[arg(long, value_name = "FILE", default_value = "sessions.db")]
        db: PathBuf,

        #[arg(long, value_name = "DIR", default_value = "output/tables")]
        out_dir: PathBuf,

        #[arg(long, default_value_t = 10, help = "Rows in the top-N tables")]
        top: usize,
    },
    /// Copy the first N lines of a log into a sample file
    Sample {
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        #[arg(long, value_name = "FILE", default_value = "sample_first_2000_lines.txt")]
        output: PathBuf,

        #[arg(long, default_value_t = 2000)]
        lines: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Process {
            log,
            db,
            timeout,
            extensions,
            documents_only,
            hash_hosts,
            out_dir,
        } => {
            let allowed = if documents_only {
                Some(
                    loader::DOCUMENT_EXTENSIONS
                        .iter()
                        .map(|e| (*e).to_owned())
                        .collect(),
                )
            } else {
                extensions.map(normalize_extensions)
            };
            process_log(&log, &db, &out_dir, timeout as f64, allowed, hash_hosts)
        }
        Command::Report { db, out_dir, top } => report(&db, &out_dir, top),
        Command::Sample {
            source,
            output,
            lines,
        } => {
            let written = sample::create_sample(&source, &output, lines)?;
            println!("Wrote {} lines to {}", written, output.display());
            Ok(())
        }
    }
}

fn normalize_extensions(extensions: Vec<String>) -> HashSet<String> {
    extensions
        .into_iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn process_log(
    log: &PathBuf,
    db_path: &PathBuf,
    out_dir: &PathBuf,
    timeout_seconds: f64,
    allowed_extensions: Option<HashSet<String>>,
    hash_hosts: bool,
) -> Result<(), Error> {
    let (mut records, stats) = loader::load_file(log)?;
    reports::write_extension_reports(&records, out_dir, reports::DEFAULT_TOP_N)?;
    if let Some(allowed) = &allowed_extensions {
        records = loader::filter_by_extensions(records, allowed);
    }

    let records = bots::flag_bots(records);
    reports::write_bot_reports(&records, out_dir)?;
    let proportions = bots::bot_proportions(&records);
    let mut records = bots::without_bots(records);

    sessions::assign_user_ids(&mut records, hash_hosts);
    let records = sessions::sessionize(records, timeout_seconds);

    let pool = db::init(db_path)?;
    db::save_records(&pool, &records)?;

    let summaries = sessions::session_summaries(&records);
    println!("Lines read:     {}", stats.total_lines);
    println!("Valid records:  {}", stats.valid);
    println!("Skipped lines:  {}", stats.skipped);
    println!("Bot requests:   {}", proportions.bot_requests);
    println!("Records stored: {}", records.len());
    println!("Sessions:       {}", summaries.len());
    println!("Database:       {}", db_path.display());
    Ok(())
}

fn report(db_path: &PathBuf, out_dir: &PathBuf, top_n: usize) -> Result<(), Error> {
    let pool = db::init(db_path)?;
    let (records, _) = db::load_records(&pool)?;
    if records.is_empty() {
        return Err(Error::EmptyStore);
    }
    reports::write_session_reports(&records, out_dir, top_n)?;
    println!("Reports written to {}", out_dir.display());
    Ok(())
}
