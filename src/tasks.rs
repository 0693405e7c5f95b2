//! Task lists consumed by downstream job submission.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ordered work-item identifiers, flushed once at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    entries: Vec<String>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read task list {}", path.display()))?;
        Ok(Self {
            entries: text
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn push(&mut self, id: impl Into<String>) {
        self.entries.push(id.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sorted(mut self) -> Self {
        self.entries.sort();
        self
    }

    /// Write every identifier newline-terminated, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(entry);
            text.push('\n');
        }
        fs::write(path, text.as_bytes())
            .with_context(|| format!("write task list {}", path.display()))
    }
}
