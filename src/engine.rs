//! Calls into the external MD engine.
//!
//! Each call blocks until the child exits. Output is captured so failures can
//! be reported with the tail of the engine's stderr.
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

const BACKUP_ENV: &str = "GMX_MAXBACKUP";
const MAX_STDERR_BYTES: usize = 2048;
/// trjconv asks which group to write; group 0 is the whole system.
const SYSTEM_GROUP: &[u8] = b"0\n";

#[derive(Debug, Clone)]
pub struct Engine {
    exe: PathBuf,
    keep_backups: bool,
}

/// Inputs of one `grompp` call.
#[derive(Debug, Clone, Copy)]
pub struct Grompp<'a> {
    pub mdp: &'a Path,
    pub coordinates: &'a Path,
    pub topology: &'a Path,
    pub output: &'a Path,
}

/// A finished engine call.
#[derive(Debug)]
pub struct Invocation {
    pub command_line: String,
    pub status: ExitStatus,
    pub stderr: String,
}

impl Invocation {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn status_string(&self) -> String {
        exit_status_string(&self.status)
    }

    /// Last stderr line, the one engines usually put the reason on.
    pub fn stderr_tail(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(str::trim)
            .unwrap_or_default()
    }
}

impl Engine {
    pub fn new(exe: PathBuf, keep_backups: bool) -> Self {
        Self { exe, keep_backups }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Compile a run input: `grompp -f MDP -c COORDS -p TOPOLOGY -o OUTPUT`.
    pub fn grompp(&self, job: &Grompp<'_>) -> Result<Invocation> {
        let args = vec![
            OsString::from("grompp"),
            "-f".into(),
            job.mdp.into(),
            "-c".into(),
            job.coordinates.into(),
            "-p".into(),
            job.topology.into(),
            "-o".into(),
            job.output.into(),
        ];
        self.run(args, None)
    }

    /// Rewrite `input` with a rectangular box of edge `length` nm.
    pub fn trjconv_box(
        &self,
        input: &Path,
        structure: &Path,
        length: f64,
        output: &Path,
    ) -> Result<Invocation> {
        let edge = format!("{length:.5}");
        let args = vec![
            OsString::from("trjconv"),
            "-f".into(),
            input.into(),
            "-s".into(),
            structure.into(),
            "-box".into(),
            edge.as_str().into(),
            edge.as_str().into(),
            edge.as_str().into(),
            "-o".into(),
            output.into(),
        ];
        self.run(args, Some(SYSTEM_GROUP))
    }

    fn run(&self, args: Vec<OsString>, stdin: Option<&[u8]>) -> Result<Invocation> {
        let command_line = format_command_line(&self.exe, &args);
        let mut command = Command::new(&self.exe);
        command
            .args(&args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !self.keep_backups {
            command.env(BACKUP_ENV, "-1");
        }

        tracing::debug!(command = %command_line, "engine call");
        let start = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("spawn {command_line}"))?;
        if let (Some(bytes), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // The engine may exit without reading; its status tells the story.
            if let Err(err) = pipe.write_all(bytes) {
                if err.kind() != ErrorKind::BrokenPipe {
                    return Err(err).with_context(|| format!("write stdin of {command_line}"));
                }
            }
        }
        let output = child
            .wait_with_output()
            .with_context(|| format!("wait for {command_line}"))?;

        log_engine_output("stdout", &output.stdout);
        log_engine_output("stderr", &output.stderr);
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            status = %exit_status_string(&output.status),
            "engine call complete"
        );

        Ok(Invocation {
            command_line,
            status: output.status,
            stderr: tail_bytes(&output.stderr, MAX_STDERR_BYTES),
        })
    }
}

/// Engine notes and warnings go to the debug log, one event per line.
fn log_engine_output(stream: &'static str, bytes: &[u8]) {
    for line in String::from_utf8_lossy(bytes).lines() {
        let line = line.trim_end();
        if !line.is_empty() {
            tracing::debug!(stream, "{line}");
        }
    }
}

pub fn format_command_line(exe: &Path, args: &[OsString]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(exe.to_string_lossy().to_string());
    words.extend(args.iter().map(|arg| arg.to_string_lossy().to_string()));
    shell_words::join(words)
}

fn tail_bytes(bytes: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut start = text.len().saturating_sub(max_bytes);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

fn exit_status_string(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}
