use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use addr2line::Context;
use gimli::{EndianArcSlice, RunTimeEndian};
use log::{debug, info};
use object::{Object, ObjectSection};

use super::resolver::{LineReader, ResolutionRecord};
use crate::domain::ResolveError;
use crate::image::map_image;

/// DWARF-backed line reader for a single debug-info-bearing binary
///
/// Only the DWARF sections are copied out of the mapped image, into
/// reference-counted slices, so the reader owns everything it needs and can
/// move to the worker thread.
pub struct DwarfReader {
    ctx: Context<EndianArcSlice<RunTimeEndian>>,
}

impl DwarfReader {
    /// Load DWARF debug info from the binary at `binary_path`
    ///
    /// # Errors
    /// Returns [`ResolveError::DebugInfoUnavailable`] if the file cannot be
    /// read or parsed, or carries no `.debug_line` section
    pub fn open<P: AsRef<Path>>(binary_path: P) -> Result<Self, ResolveError> {
        let path = binary_path.as_ref();
        let unavailable = |reason: String| ResolveError::DebugInfoUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let binary_data =
            map_image(path).map_err(|e| unavailable(format!("failed to map binary: {e}")))?;

        let obj_file = object::File::parse(&*binary_data)
            .map_err(|e| unavailable(format!("failed to parse object file: {e}")))?;

        let has_line_table =
            obj_file.section_by_name(".debug_line").is_some_and(|s| s.size() > 0);
        if !has_line_table {
            return Err(unavailable("no .debug_line section".to_string()));
        }

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianArcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(Cow::Borrowed(&[][..]));
                Ok(EndianArcSlice::new(Arc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)
            .map_err(|e| unavailable(format!("failed to load DWARF sections: {e}")))?;
        let ctx = Context::from_dwarf(dwarf)
            .map_err(|e| unavailable(format!("failed to index DWARF: {e}")))?;

        info!("Loaded DWARF line tables from {}", path.display());
        Ok(Self { ctx })
    }
}

impl LineReader for DwarfReader {
    fn frames(&mut self, address: u64) -> Vec<ResolutionRecord> {
        let mut records = Vec::new();

        let mut frame_iter = match self.ctx.find_frames(address).skip_all_loads() {
            Ok(iter) => iter,
            Err(e) => {
                debug!("find_frames failed for 0x{address:x}: {e}");
                return records;
            }
        };

        // Frames come innermost first; the outermost (non-inlined) frame is last
        while let Ok(Some(frame)) = frame_iter.next() {
            let Some(location) = frame.location else {
                continue;
            };
            let Some(file) = location.file else {
                continue;
            };

            let function = frame
                .function
                .and_then(|f| f.raw_name().ok().map(Cow::into_owned));

            records.push(ResolutionRecord {
                file: file.to_string(),
                line: location.line.unwrap_or(0),
                function,
            });
        }

        records
    }
}
