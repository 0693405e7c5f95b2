//! Shared test infrastructure for integration tests.
//!
//! Each test gets a scratch directory and a stand-in engine script that logs
//! its arguments, touches the `-o` output, and fails for matching outputs.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const TOPOLOGY: &str = "ff/topol.top";

/// Scratch directory plus the stand-in engine living in it.
pub struct Workspace {
    dir: TempDir,
    gmx: PathBuf,
    log: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_failing_output("__never__")
    }

    /// Engine calls whose `-o` argument contains `pattern` exit 1.
    pub fn with_failing_output(pattern: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let gmx = dir.path().join("bin").join("gmx");
        let log = dir.path().join("calls.log");
        fs::create_dir_all(gmx.parent().expect("bin dir")).expect("create bin dir");
        write_engine_script(&gmx, &log, pattern);
        Self { dir, gmx, log }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        let path = self.dir.path().join(rel);
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    pub fn json(&self, rel: &str) -> serde_json::Value {
        serde_json::from_str(&self.read(rel)).expect("parse generated JSON")
    }

    /// One line per engine call: `ARGS|group=G|backup=B`.
    pub fn calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Run mdprep in the workspace with the stand-in engine and topology.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_mdprep"))
            .current_dir(self.dir.path())
            .arg("--gmx")
            .arg(&self.gmx)
            .arg("--topology")
            .arg(TOPOLOGY)
            .args(args)
            .env_remove("RUST_LOG")
            .env_remove("GMX_MAXBACKUP")
            .output()
            .expect("run mdprep")
    }
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "mdprep failed: {}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn assert_close(actual: &serde_json::Value, expected: f64) {
    let actual = actual
        .as_f64()
        .unwrap_or_else(|| panic!("expected a number, found {actual}"));
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, found {actual}"
    );
}

fn write_engine_script(path: &Path, log: &Path, fail_pattern: &str) {
    let script = format!(
        r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
group=""
if [ "$1" = "trjconv" ]; then read group; fi
echo "$*|group=$group|backup=${{GMX_MAXBACKUP-unset}}" >> "{log}"
case "$out" in
  *{fail_pattern}*) echo "Fatal error: cannot write $out" >&2; exit 1;;
esac
echo "NOTE 1 [file $out]: engine output for $1"
touch "$out"
"#,
        log = log.display(),
    );
    fs::write(path, script).expect("write engine script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod engine script");
    }
}
