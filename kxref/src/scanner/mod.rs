//! # Symbol Scanner
//!
//! Walks the (stripped) kernel image and feeds the resolution pipeline:
//!
//! 1. Collect function symbols from `.symtab` ([`collect_functions`])
//! 2. Emit one `symbols_files` row per symbol, pre-formatted
//! 3. Decode each distinct function body and emit one `xrefs` job per direct
//!    call site, with the call instruction's address to resolve and the
//!    function's name as expected symbol
//!
//! Everything goes through the same [`Dispatcher`], so rows reach the sink
//! in scan order.

pub mod call_sites;
pub mod symbols;

use std::path::{Path, PathBuf};

use kxref_common::{SymbolFileRow, XrefRow};
use log::{debug, info, warn};
use memmap2::Mmap;
use object::{Architecture, Object};

use crate::domain::{normalize_symbol, InstanceId, ScanError};
use crate::image::map_image;
use crate::pipeline::{Dispatcher, Request};
use crate::sink::SinkHandle;

pub use call_sites::{find_call_sites, CallSite};
pub use symbols::{collect_functions, function_bytes, FunctionSymbol};

/// Which row families to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMode {
    pub symbols: bool,
    pub xrefs: bool,
}

impl Default for ScanMode {
    fn default() -> Self {
        Self { symbols: true, xrefs: true }
    }
}

/// Counters reported at the end of a scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub functions: usize,
    pub symbol_rows: usize,
    pub call_sites: usize,
    /// Call sites whose source line came from the resolution cache
    pub cache_hits: usize,
    /// Functions whose bytes could not be read
    pub skipped: usize,
}

/// Scanner over one memory-mapped kernel image
pub struct Scanner {
    path: PathBuf,
    data: Mmap,
}

impl Scanner {
    /// Map the image at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref().to_path_buf();
        let data =
            map_image(&path).map_err(|source| ScanError::Read { path: path.clone(), source })?;
        Ok(Self { path, data })
    }

    fn parse(&self) -> Result<object::File<'_>, ScanError> {
        object::File::parse(&*self.data)
            .map_err(|source| ScanError::Parse { path: self.path.clone(), source })
    }

    /// Function symbols of the image, sorted by address
    ///
    /// # Errors
    /// Returns an error if the image is not a parseable object file
    pub fn functions(&self) -> Result<Vec<FunctionSymbol>, ScanError> {
        Ok(collect_functions(&self.parse()?))
    }

    /// Scan the image and enqueue every row for `instance`
    ///
    /// # Errors
    /// Returns an error if the image cannot be parsed, has no function
    /// symbols, is not x86-64 while xrefs are requested, or the pipeline
    /// stops accepting jobs
    pub fn run(
        &self,
        dispatcher: &Dispatcher,
        sink: &SinkHandle,
        instance: InstanceId,
        mode: ScanMode,
    ) -> Result<ScanStats, ScanError> {
        let obj = self.parse()?;
        // Also checked by pre-flight
        if mode.xrefs && obj.architecture() != Architecture::X86_64 {
            return Err(ScanError::UnsupportedArchitecture(obj.architecture()));
        }

        let functions = collect_functions(&obj);
        if functions.is_empty() {
            return Err(ScanError::NoSymbols(self.path.clone()));
        }
        info!("Scanning {} function symbols in {}", functions.len(), self.path.display());

        let mut stats = ScanStats { functions: functions.len(), ..ScanStats::default() };
        let mut last_address = None;

        for function in &functions {
            if mode.symbols {
                let row = SymbolFileRow {
                    instance_id: instance.0,
                    symbol_name: normalize_symbol(&function.name).to_string(),
                    symbol_offset: function.address,
                    symbol_type: function.symbol_type,
                };
                dispatcher.submit(sink, Request::Raw(row.to_sql()))?;
                stats.symbol_rows += 1;
            }

            // Aliases share a body; decode it once
            if !mode.xrefs || last_address == Some(function.address) {
                continue;
            }
            last_address = Some(function.address);

            let Some(code) = function_bytes(&obj, function) else {
                warn!("No code bytes for {} at 0x{:x}", function.name, function.address);
                stats.skipped += 1;
                continue;
            };

            let sites = find_call_sites(code, function.address);
            debug!("{}: {} call sites", function.name, sites.len());
            for site in sites {
                emit_xref(dispatcher, sink, instance, function, site, &mut stats)?;
            }
        }

        info!(
            "Scan done: {} symbol rows, {} call sites ({} from cache), {} functions skipped",
            stats.symbol_rows, stats.call_sites, stats.cache_hits, stats.skipped
        );
        Ok(stats)
    }
}

fn emit_xref(
    dispatcher: &Dispatcher,
    sink: &SinkHandle,
    instance: InstanceId,
    function: &FunctionSymbol,
    site: CallSite,
    stats: &mut ScanStats,
) -> Result<(), ScanError> {
    let row = XrefRow {
        instance_id: instance.0,
        caller_offset: function.address,
        calling_offset: site.calling_offset,
        callee_offset: site.callee_offset,
    };
    stats.call_sites += 1;

    let request = match dispatcher.has_seen(site.calling_offset) {
        Some(source_line) => {
            stats.cache_hits += 1;
            Request::Raw(row.to_sql(&source_line))
        }
        None => Request::Resolve {
            address: site.calling_offset,
            expected_symbol: normalize_symbol(&function.name).to_string(),
            template: row.to_template(),
        },
    };
    dispatcher.submit(sink, request)?;
    Ok(())
}
