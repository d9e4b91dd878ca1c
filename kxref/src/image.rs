//! Read-only views of kernel images
//!
//! A debug vmlinux runs to hundreds of megabytes and is opened by pre-flight,
//! the scanner and the DWARF reader in turn. Mapping it lets all three share
//! the page cache instead of each holding a private copy.

#![allow(unsafe_code)] // Mmap::map requires unsafe

use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::Mmap;

/// Map the image at `path` read-only
///
/// # Errors
/// Returns an error if the file cannot be opened or mapped
pub fn map_image(path: &Path) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only; kxref never writes to its inputs and
    // the image must not be rewritten while a run has it open
    unsafe { Mmap::map(&file) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_contents() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"\x7fELF").unwrap();
        let map = map_image(file.path()).unwrap();
        assert_eq!(&map[..], b"\x7fELF");
    }

    #[test]
    fn test_map_missing_file() {
        let err = map_image(Path::new("/nonexistent/vmlinux")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
