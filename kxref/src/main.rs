//! # kxref - Main Entry Point
//!
//! Parses the command line, merges the optional JSON configuration and runs
//! one ingestion. Progress goes to the log (`RUST_LOG=info`), the summary to
//! stdout unless `--quiet` is given.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;

use kxref::cli::{Args, Config};
use kxref::domain::ConfigError;
use kxref::ingest::ingest;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::ConfigEntry(_) | ConfigError::KernelVersion(_)) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

fn run() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_USAGE);
        }
    };
    let quiet = args.quiet;
    let config = Config::from_args(&args)?;

    if !quiet {
        println!("kxref v{}", env!("CARGO_PKG_VERSION"));
        println!("vmlinux: {}", config.vmlinux.display());
        if config.stripped.is_some() {
            println!("scan: {}", config.scan_target().display());
        }
        println!("db: {}", config.db.display());
    }

    let summary = ingest(&config, quiet)?;

    if !quiet {
        println!(
            "{}: {} functions, {} symbol rows, {} xrefs ({} resolved, {} unresolved)",
            summary.instance,
            summary.scan.functions,
            summary.scan.symbol_rows,
            summary.scan.call_sites,
            summary.worker.resolved,
            summary.worker.unresolved,
        );
    }
    Ok(())
}
