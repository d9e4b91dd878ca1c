//! # kxref - Kernel Call-Graph Extractor
//!
//! kxref reads a Linux kernel image, finds every function symbol and every
//! direct call instruction, resolves each call site to the `file:line` it was
//! compiled from, and stores the result in a relational database. One run
//! produces one *instance*: a kernel build identified by version and note.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐            ┌──────────────────────────────┐
//! │ stripped image       │            │ vmlinux (DWARF line tables)  │
//! │ .symtab + .text      │            └──────────────┬───────────────┘
//! └──────────┬───────────┘                           │
//!            ▼                                       ▼
//! ┌──────────────────────┐  enqueue   ┌──────────────────────────────┐
//! │ Scanner              │──────────▶ │ Pipeline                     │
//! │ symbols, call sites  │  (≤ 16)    │ Worker ─▶ Resolver (mutex)   │
//! └──────────────────────┘            │        ─▶ Sink::execute      │
//!                                     └──────────────┬───────────────┘
//!                                                    ▼
//!                                     ┌──────────────────────────────┐
//!                                     │ SQLite: instances, configs,  │
//!                                     │ symbols_files, xrefs, ...    │
//!                                     └──────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`scanner`]: function symbols from `.symtab`, direct call sites decoded
//!   from x86-64 machine code
//! - [`pipeline`]: bounded queue, single worker, source-line selection
//! - [`symbolization`]: DWARF lookups via `addr2line`, path canonicalization
//! - [`sink`]: statement execution against SQLite
//! - [`image`]: read-only memory maps of the input images
//! - [`ingest`]: one complete run, from pre-flight checks to totals
//! - [`cli`]: command-line arguments and JSON configuration
//! - [`domain`]: shared types and error enums
//!
//! ## Typical Usage
//!
//! ```bash
//! # Resolve against the same image that is scanned
//! kxref --vmlinux vmlinux -k 6.1.12 -c CONFIG_SMP=y
//!
//! # Scan a stripped copy, resolve against the debug build
//! RUST_LOG=info kxref --vmlinux vmlinux --stripped vmlinux.stripped -k 6.1.12
//! ```

pub mod cli;
pub mod domain;
pub mod image;
pub mod ingest;
pub mod pipeline;
pub mod preflight;
pub mod scanner;
pub mod sink;
pub mod symbolization;
