//! Run settings shared by every generator.
//!
//! Settings start from built-in defaults, then an optional JSON file, then
//! global command-line flags. The result is passed explicitly to each
//! generator; nothing is read from process-wide state afterwards.
use crate::cli::GlobalArgs;
use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for settings files.
pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

const DEFAULT_GMX: &str = "gmx";
const DEFAULT_TOPOLOGY: &str = "forcefield/topol.top";
const DEFAULT_WALKERS: usize = 4;
const DEFAULT_TASK_FILE: &str = "args.list";
const DEFAULT_TEMPLATE_PREFIX: &str = "template";

/// On-disk settings; every field but the schema version is optional.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub schema_version: u32,
    #[serde(default)]
    pub gmx: Option<PathBuf>,
    #[serde(default)]
    pub topology: Option<PathBuf>,
    #[serde(default)]
    pub walkers: Option<usize>,
    #[serde(default)]
    pub task_file: Option<String>,
    #[serde(default)]
    pub template_prefix: Option<String>,
    #[serde(default)]
    pub keep_backups: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Engine executable; a bare name is looked up on `PATH`.
    pub gmx: PathBuf,
    pub topology: PathBuf,
    pub walkers: usize,
    pub task_file: String,
    pub template_prefix: String,
    pub keep_backups: bool,
    pub fail_fast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gmx: PathBuf::from(DEFAULT_GMX),
            topology: PathBuf::from(DEFAULT_TOPOLOGY),
            walkers: DEFAULT_WALKERS,
            task_file: DEFAULT_TASK_FILE.to_string(),
            template_prefix: DEFAULT_TEMPLATE_PREFIX.to_string(),
            keep_backups: false,
            fail_fast: false,
        }
    }
}

impl Settings {
    /// Merge defaults, the optional settings file and CLI flags, then
    /// validate and locate the engine.
    pub fn resolve(args: &GlobalArgs) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(path) = &args.config {
            settings.apply_file(load_settings_file(path)?);
        }
        settings.apply_args(args);
        settings.validate()?;
        settings.gmx = resolve_executable(&settings.gmx)?;
        Ok(settings)
    }

    pub fn apply_file(&mut self, file: SettingsFile) {
        if let Some(gmx) = file.gmx {
            self.gmx = gmx;
        }
        if let Some(topology) = file.topology {
            self.topology = topology;
        }
        if let Some(walkers) = file.walkers {
            self.walkers = walkers;
        }
        if let Some(task_file) = file.task_file {
            self.task_file = task_file;
        }
        if let Some(prefix) = file.template_prefix {
            self.template_prefix = prefix;
        }
        if let Some(keep_backups) = file.keep_backups {
            self.keep_backups = keep_backups;
        }
    }

    pub fn apply_args(&mut self, args: &GlobalArgs) {
        if let Some(gmx) = &args.gmx {
            self.gmx = gmx.clone();
        }
        if let Some(topology) = &args.topology {
            self.topology = topology.clone();
        }
        if let Some(walkers) = args.walkers {
            self.walkers = walkers;
        }
        if let Some(task_file) = &args.task_file {
            self.task_file = task_file.clone();
        }
        self.keep_backups |= args.keep_backups;
        self.fail_fast |= args.fail_fast;
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.walkers >= 1, "walkers must be at least 1");
        validate_file_name(&self.task_file, "task_file")?;
        validate_file_name(&self.template_prefix, "template_prefix")?;
        ensure!(
            !self.gmx.as_os_str().is_empty(),
            "gmx must name an executable"
        );
        Ok(())
    }

    /// `<dir>/<template_prefix>.<extension>`
    pub fn template_path(&self, dir: &Path, extension: &str) -> PathBuf {
        dir.join(format!("{}.{extension}", self.template_prefix))
    }
}

pub fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    let bytes = fs::read(path).with_context(|| format!("read settings {}", path.display()))?;
    let file: SettingsFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse settings JSON {}", path.display()))?;
    if file.schema_version != SETTINGS_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported settings schema_version {} in {}",
            file.schema_version,
            path.display()
        ));
    }
    Ok(file)
}

/// Paths are used as given; bare names are searched on `PATH`.
pub fn resolve_executable(path: &Path) -> Result<PathBuf> {
    if path.components().count() > 1 {
        return Ok(path.to_path_buf());
    }
    which::which(path).with_context(|| format!("locate engine {} on PATH", path.display()))
}

fn validate_file_name(value: &str, label: &str) -> Result<()> {
    ensure!(!value.trim().is_empty(), "{label} must be non-empty");
    ensure!(
        !value.contains('/') && !value.contains('\\'),
        "{label} must be a plain file name (got {value:?})"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_settings(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("mdprep.json");
        fs::write(&path, text).expect("write settings");
        path
    }

    #[test]
    fn file_then_flags_override_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = write_settings(
            dir.path(),
            r#"{"schema_version": 1, "walkers": 8, "task_file": "jobs.list", "keep_backups": true}"#,
        );
        let mut settings = Settings::default();
        settings.apply_file(load_settings_file(&path).expect("load settings"));
        settings.apply_args(&GlobalArgs {
            walkers: Some(2),
            topology: Some(PathBuf::from("ff/system.top")),
            fail_fast: true,
            ..GlobalArgs::default()
        });
        assert_eq!(settings.walkers, 2);
        assert_eq!(settings.task_file, "jobs.list");
        assert_eq!(settings.topology, PathBuf::from("ff/system.top"));
        assert!(settings.keep_backups);
        assert!(settings.fail_fast);
        assert_eq!(settings.template_prefix, "template");
        settings.validate().expect("valid settings");
    }

    #[test]
    fn unknown_fields_and_versions_are_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let unknown = write_settings(dir.path(), r#"{"schema_version": 1, "nwalkers": 4}"#);
        assert!(load_settings_file(&unknown).is_err());
        let future = write_settings(dir.path(), r#"{"schema_version": 2}"#);
        let err = load_settings_file(&future).expect_err("future schema");
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let zero = Settings {
            walkers: 0,
            ..Settings::default()
        };
        assert!(zero.validate().is_err());
        let nested = Settings {
            task_file: "out/args.list".to_string(),
            ..Settings::default()
        };
        assert!(nested.validate().is_err());
        let blank = Settings {
            template_prefix: " ".to_string(),
            ..Settings::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn template_paths_use_prefix() {
        let settings = Settings::default();
        assert_eq!(
            settings.template_path(Path::new("template"), "mdp"),
            PathBuf::from("template/template.mdp")
        );
    }

    #[cfg(unix)]
    #[test]
    fn executables_resolve_from_path_or_as_given() {
        let given = resolve_executable(Path::new("./bin/gmx")).expect("path kept");
        assert_eq!(given, PathBuf::from("./bin/gmx"));
        let found = resolve_executable(Path::new("sh")).expect("sh on PATH");
        assert!(found.is_absolute());
        assert!(resolve_executable(Path::new("mdprep-no-such-engine")).is_err());
    }
}
