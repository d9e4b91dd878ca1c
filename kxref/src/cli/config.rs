//! Run configuration: defaults, optional JSON file, command-line overrides

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::args::Args;
use crate::domain::{ConfigError, KernelVersion};
use crate::scanner::ScanMode;

/// Effective settings of one run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub vmlinux: PathBuf,
    pub stripped: Option<PathBuf>,
    pub db: PathBuf,
    pub kernel_version: Option<String>,
    pub note: String,
    pub configs: BTreeMap<String, String>,
    pub symbols: bool,
    pub xrefs: bool,
    pub addr2line_prefix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vmlinux: PathBuf::from("vmlinux"),
            stripped: None,
            db: PathBuf::from("kernel_bin.sqlite"),
            kernel_version: None,
            note: "upstream".to_string(),
            configs: BTreeMap::new(),
            symbols: true,
            xrefs: true,
            addr2line_prefix: None,
        }
    }
}

impl Config {
    /// Build the configuration from the command line
    ///
    /// # Errors
    /// Returns an error if the JSON file cannot be read or parsed, or a
    /// `--config` entry is not `KEY=VALUE`
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args)?;
        Ok(config)
    }

    /// Load a JSON configuration file; missing fields keep their defaults
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(vmlinux) = &args.vmlinux {
            self.vmlinux.clone_from(vmlinux);
        }
        if let Some(stripped) = &args.stripped {
            self.stripped = Some(stripped.clone());
        }
        if let Some(db) = &args.db {
            self.db.clone_from(db);
        }
        if let Some(version) = &args.kernel_version {
            self.kernel_version = Some(version.clone());
        }
        if let Some(note) = &args.note {
            self.note.clone_from(note);
        }
        if let Some(prefix) = &args.addr2line_prefix {
            self.addr2line_prefix = Some(prefix.clone());
        }
        for entry in &args.configs {
            let (key, value) = parse_config_entry(entry)?;
            self.configs.insert(key, value);
        }
        if args.no_symbols {
            self.symbols = false;
        }
        if args.no_xrefs {
            self.xrefs = false;
        }
        Ok(())
    }

    /// Image the scanner reads
    #[must_use]
    pub fn scan_target(&self) -> &Path {
        self.stripped.as_deref().unwrap_or(&self.vmlinux)
    }

    /// Parsed kernel version, `0.0.0` when none was given
    ///
    /// # Errors
    /// Returns an error if the version string is malformed
    pub fn kernel_version(&self) -> Result<KernelVersion, ConfigError> {
        self.kernel_version.as_deref().map_or_else(|| Ok(KernelVersion::default()), str::parse)
    }

    #[must_use]
    pub fn mode(&self) -> ScanMode {
        ScanMode { symbols: self.symbols, xrefs: self.xrefs }
    }
}

/// Split a `KEY=VALUE` entry
///
/// # Errors
/// Returns an error if there is no `=` or the key is empty
pub fn parse_config_entry(entry: &str) -> Result<(String, String), ConfigError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::ConfigEntry(entry.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::from_args(&Args::default()).unwrap();
        assert_eq!(config.vmlinux, PathBuf::from("vmlinux"));
        assert_eq!(config.scan_target(), Path::new("vmlinux"));
        assert_eq!(config.note, "upstream");
        assert_eq!(config.mode(), ScanMode { symbols: true, xrefs: true });
        assert_eq!(config.kernel_version().unwrap(), KernelVersion::default());
    }

    #[test]
    fn test_args_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"vmlinux": "/build/vmlinux", "note": "from-file", "configs": {{"CONFIG_SMP": "y"}}}}"#
        )
        .unwrap();

        let args = Args {
            config_file: Some(file.path().to_path_buf()),
            note: Some("from-cli".to_string()),
            stripped: Some(PathBuf::from("/build/vmlinux.work")),
            configs: vec!["CONFIG_KASAN=n".to_string()],
            no_xrefs: true,
            ..Args::default()
        };
        let config = Config::from_args(&args).unwrap();

        assert_eq!(config.vmlinux, PathBuf::from("/build/vmlinux"));
        assert_eq!(config.scan_target(), Path::new("/build/vmlinux.work"));
        assert_eq!(config.note, "from-cli");
        assert_eq!(config.configs.len(), 2);
        assert_eq!(config.configs["CONFIG_SMP"], "y");
        assert!(!config.mode().xrefs);
    }

    #[test]
    fn test_unknown_json_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"vmlinux_path": "x"}}"#).unwrap();
        assert!(matches!(Config::from_file(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_entry() {
        assert_eq!(
            parse_config_entry("CONFIG_HZ=250").unwrap(),
            ("CONFIG_HZ".to_string(), "250".to_string())
        );
        assert_eq!(parse_config_entry("CONFIG_CMDLINE=a=b").unwrap().1, "a=b");
        assert!(parse_config_entry("CONFIG_HZ").is_err());
        assert!(parse_config_entry("=y").is_err());
    }

    #[test]
    fn test_bad_kernel_version() {
        let config = Config { kernel_version: Some("six".to_string()), ..Config::default() };
        assert!(config.kernel_version().is_err());
    }
}
