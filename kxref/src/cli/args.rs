//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "kxref",
    about = "Extract the call graph of a kernel image into a relational database",
    after_help = "\
EXAMPLES:
    kxref --vmlinux vmlinux -k 6.1.12                       Scan and resolve the same image
    kxref --vmlinux vmlinux --stripped vmlinux.work -k 6.1  Scan a stripped copy
    kxref -f kxref.json --no-symbols                        Xrefs only, settings from JSON"
)]
pub struct Args {
    /// Kernel image carrying DWARF line tables (default: vmlinux)
    #[arg(long, value_name = "FILE")]
    pub vmlinux: Option<PathBuf>,

    /// Image to scan for symbols and call sites (default: --vmlinux)
    #[arg(long, value_name = "FILE")]
    pub stripped: Option<PathBuf>,

    /// SQLite database to write (default: kernel_bin.sqlite)
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Kernel version of the image, e.g. 6.1.12-rc3
    #[arg(short = 'k', long, value_name = "VERSION")]
    pub kernel_version: Option<String>,

    /// Free-form note stored with the instance (default: upstream)
    #[arg(short, long)]
    pub note: Option<String>,

    /// Kconfig entry to record, repeatable
    #[arg(short = 'c', long = "config", value_name = "KEY=VALUE")]
    pub configs: Vec<String>,

    /// Skip symbols_files rows
    #[arg(long)]
    pub no_symbols: bool,

    /// Skip xrefs rows (and DWARF resolution)
    #[arg(long)]
    pub no_xrefs: bool,

    /// Path prefix recorded as provenance tag
    #[arg(long, value_name = "PREFIX")]
    pub addr2line_prefix: Option<String>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(short = 'f', long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
