//! Pre-flight checks for kxref
//!
//! Validates the inputs of a run before the database is touched, so a typo
//! in a path does not leave a half-written instance behind.

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use object::{Architecture, Object, ObjectSection};
use std::path::Path;

use crate::cli::Config;
use crate::image::map_image;

/// Run all pre-flight checks for `config`
///
/// Each input image is mapped and parsed once; when nothing is stripped the
/// same parse serves both the debug-info and the scan checks.
pub fn run_preflight_checks(config: &Config, quiet: bool) -> Result<()> {
    check_binary_exists(&config.vmlinux, "--vmlinux")?;
    if let Some(stripped) = &config.stripped {
        check_binary_exists(stripped, "--stripped")?;
    }

    match &config.stripped {
        Some(stripped) => {
            if config.xrefs {
                let data = load_image(&config.vmlinux)?;
                let obj = parse_image(&data, &config.vmlinux)?;
                check_debug_lines(&obj, &config.vmlinux, quiet)?;
            }
            let data = load_image(stripped)?;
            check_scan_target(&parse_image(&data, stripped)?, stripped, config.xrefs)?;
        }
        None => {
            let data = load_image(&config.vmlinux)?;
            let obj = parse_image(&data, &config.vmlinux)?;
            if config.xrefs {
                check_debug_lines(&obj, &config.vmlinux, quiet)?;
            }
            check_scan_target(&obj, &config.vmlinux, config.xrefs)?;
        }
    }

    check_db_location(&config.db)?;
    Ok(())
}

/// Check if an input image exists and is a regular file
fn check_binary_exists(path: &Path, flag: &str) -> Result<()> {
    if !path.exists() {
        bail!(
            "Kernel image not found: {}\n\n\
             Make sure the path is correct, or pass it with {flag}.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             {flag} must point to a kernel image, not a directory.",
            path.display()
        );
    }
    Ok(())
}

fn load_image(path: &Path) -> Result<Mmap> {
    map_image(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_image<'data>(data: &'data [u8], path: &Path) -> Result<object::File<'data>> {
    object::File::parse(data).with_context(|| format!("Not an object file: {}", path.display()))
}

fn section_present(obj: &object::File<'_>, name: &str) -> bool {
    obj.section_by_name(name).is_some_and(|s| s.size() > 0)
}

/// Check that the image used for resolution carries DWARF line tables
fn check_debug_lines(obj: &object::File<'_>, path: &Path, quiet: bool) -> Result<()> {
    if !section_present(obj, ".debug_line") {
        bail!(
            "No DWARF line information in {}\n\n\
             Build the kernel with CONFIG_DEBUG_INFO=y, or pass --no-xrefs \
             to record symbols only.",
            path.display()
        );
    }
    if !quiet && !section_present(obj, ".debug_info") {
        eprintln!(
            "warning: {} has line tables but no .debug_info, \
             inlined call sites cannot be matched by function name",
            path.display()
        );
    }
    Ok(())
}

/// Check that the scanned image can be decoded and still has its symbol table
fn check_scan_target(obj: &object::File<'_>, path: &Path, xrefs: bool) -> Result<()> {
    if xrefs && obj.architecture() != Architecture::X86_64 {
        bail!(
            "Unsupported architecture {:?} in {}\n\n\
             Call sites can only be decoded in x86-64 images. \
             Pass --no-xrefs to record symbols only.",
            obj.architecture(),
            path.display()
        );
    }
    if !section_present(obj, ".symtab") {
        bail!(
            "No symbol table in {}\n\n\
             Scan an image that was not fully stripped (strip --strip-debug keeps .symtab).",
            path.display()
        );
    }
    Ok(())
}

/// Check that the database's directory exists
fn check_db_location(db: &Path) -> Result<()> {
    let parent = db.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    if !parent.is_dir() {
        bail!(
            "Database directory does not exist: {}\n\n\
             Create it first or choose another --db path.",
            parent.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_not_found() {
        let result = check_binary_exists(Path::new("/nonexistent/vmlinux"), "--vmlinux");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Kernel image not found"));
        assert!(err.contains("--vmlinux"));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_binary_exists(dir.path(), "--stripped").unwrap_err().to_string();
        assert!(err.contains("Not a file"));
    }

    /// A bare 64-bit little-endian ELF header with no sections
    fn elf_header(machine: u16) -> Vec<u8> {
        let mut header = vec![0x7f, b'E', b'L', b'F', 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        header.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        header.extend_from_slice(&machine.to_le_bytes());
        header.extend_from_slice(&1u32.to_le_bytes());
        header.extend_from_slice(&[0; 24]); // entry, phoff, shoff
        header.extend_from_slice(&0u32.to_le_bytes());
        for field in [64u16, 56, 0, 64, 0, 0] {
            header.extend_from_slice(&field.to_le_bytes());
        }
        header
    }

    fn write_image(bytes: &[u8]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), bytes).unwrap();
        file
    }

    #[test]
    fn test_garbage_image() {
        let file = write_image(b"not an elf");
        let data = load_image(file.path()).unwrap();
        let err = parse_image(&data, file.path()).unwrap_err().to_string();
        assert!(err.contains("Not an object file"));
    }

    #[test]
    fn test_aarch64_scan_target_rejected_with_xrefs() {
        const EM_AARCH64: u16 = 183;
        let file = write_image(&elf_header(EM_AARCH64));
        let data = load_image(file.path()).unwrap();
        let obj = parse_image(&data, file.path()).unwrap();

        let err = check_scan_target(&obj, file.path(), true).unwrap_err().to_string();
        assert!(err.contains("Unsupported architecture"), "{err}");
        assert!(err.contains("--no-xrefs"));

        // Symbols alone do not need the decoder
        let err = check_scan_target(&obj, file.path(), false).unwrap_err().to_string();
        assert!(err.contains("No symbol table"), "{err}");
    }

    #[test]
    fn test_missing_debug_lines() {
        const EM_X86_64: u16 = 62;
        let file = write_image(&elf_header(EM_X86_64));
        let data = load_image(file.path()).unwrap();
        let obj = parse_image(&data, file.path()).unwrap();
        let err = check_debug_lines(&obj, file.path(), true).unwrap_err().to_string();
        assert!(err.contains("No DWARF line information"));
    }

    #[test]
    fn test_symbols_only_run_skips_architecture_check() {
        let stripped = write_image(&elf_header(183));
        let config = Config {
            vmlinux: stripped.path().to_path_buf(),
            stripped: Some(stripped.path().to_path_buf()),
            xrefs: false,
            ..Config::default()
        };
        // Symbols only: the architecture is fine, the missing .symtab is not
        let err = run_preflight_checks(&config, true).unwrap_err().to_string();
        assert!(err.contains("No symbol table"), "{err}");
    }

    #[test]
    fn test_db_location() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_db_location(&dir.path().join("kernel.sqlite")).is_ok());
        assert!(check_db_location(Path::new("kernel.sqlite")).is_ok());
        assert!(check_db_location(&dir.path().join("missing/kernel.sqlite")).is_err());
    }

    #[test]
    fn test_preflight_missing_vmlinux() {
        let config = Config {
            vmlinux: "/nonexistent/vmlinux".into(),
            ..Config::default()
        };
        assert!(run_preflight_checks(&config, true).is_err());
    }
}
