//! Bookkeeping for engine calls that exit non-zero.
use crate::engine::Invocation;
use crate::util::truncate_string;
use anyhow::{anyhow, Result};

const MAX_REASON_BYTES: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub item: String,
    pub command_line: String,
    pub status: String,
    pub reason: String,
}

impl EngineFailure {
    fn describe(&self) -> String {
        let mut line = format!("{}: `{}` failed with {}", self.item, self.command_line, self.status);
        if !self.reason.is_empty() {
            line.push_str(&format!(" ({})", self.reason));
        }
        line
    }
}

/// Collects failed engine calls; in fail-fast mode the first one aborts.
#[derive(Debug, Default)]
pub struct FailureReport {
    fail_fast: bool,
    failures: Vec<EngineFailure>,
}

impl FailureReport {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, item: &str, invocation: Invocation) -> Result<()> {
        if invocation.success() {
            return Ok(());
        }
        let failure = EngineFailure {
            item: item.to_string(),
            command_line: invocation.command_line.clone(),
            status: invocation.status_string(),
            reason: truncate_string(invocation.stderr_tail(), MAX_REASON_BYTES),
        };
        tracing::warn!(
            item,
            command = %failure.command_line,
            status = %failure.status,
            reason = %failure.reason,
            "engine call failed"
        );
        if self.fail_fast {
            return Err(anyhow!(failure.describe()));
        }
        self.failures.push(failure);
        Ok(())
    }

    pub fn failures(&self) -> &[EngineFailure] {
        &self.failures
    }

    /// Error summarising every recorded failure, if any.
    pub fn finish(self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let mut message = format!("{} engine invocation(s) failed:", self.failures.len());
        for failure in &self.failures {
            message.push_str("\n  ");
            message.push_str(&failure.describe());
        }
        Err(anyhow!(message))
    }
}
