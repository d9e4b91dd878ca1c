//! # Address Resolution
//!
//! Converts call-site addresses of the kernel image into `file:line` strings
//! using the **DWARF line tables** of the unstripped `vmlinux`.
//!
//! ## The Resolution Problem
//!
//! The scanner works on the stripped image: it knows that the instruction at
//! `0xffffffff810a1c3e` inside `copy_process` calls `0xffffffff81234560`, but
//! not which source line that call sits on. The debug binary knows, through
//! its `.debug_line` section (address → file/line) and `.debug_info`
//! (inlining structure).
//!
//! **Libraries used**:
//! - `gimli`: Low-level DWARF parser
//! - `addr2line`: High-level frame iteration built on gimli
//! - `object`: ELF binary parser
//!
//! ## Inlined Call Sites
//!
//! Kernel code is heavily inlined. A call instruction inside an inlined
//! helper resolves to several frames:
//!
//! ```text
//! 0xffffffff810a1c3e
//!   #0 kernel/fork.c:1021        dup_task_struct   (inlined)
//!   #1 kernel/fork.c:2095        copy_process      (outermost)
//! ```
//!
//! The [`Resolver`] returns all of them, innermost first. Picking one is the
//! worker's job (see [`crate::pipeline`]).
//!
//! ## Serialization
//!
//! The line reader carries cursor state across a lookup, so every lookup
//! runs under one exclusive lock. A read-write lock would buy nothing: every
//! caller mutates the cursor.
//!
//! ## Module Structure
//!
//! - **`resolver`**: [`Resolver`], the [`LineReader`] seam and
//!   [`ResolutionRecord`]
//! - **`dwarf_reader`**: [`DwarfReader`], the addr2line-backed reader
//! - **`canonical`**: lexical path canonicalization applied to every record
//!
//! ## Example
//!
//! ```rust,ignore
//! let resolver = Resolver::open("vmlinux")?;
//! for record in resolver.lookup(0xffffffff810a1c3e) {
//!     println!("{} in {:?}", record.file_line(), record.function);
//! }
//! ```

pub mod canonical;
pub mod dwarf_reader;
pub mod resolver;

pub use canonical::canonicalize_path;
pub use dwarf_reader::DwarfReader;
pub use resolver::{LineReader, ResolutionRecord, Resolver};
