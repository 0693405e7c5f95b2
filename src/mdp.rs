//! Line-oriented editing of mdp settings files.
//!
//! The buffer keeps every line with its original terminator, so only the
//! value of an addressed key changes when a file is rewritten.
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;

/// Ordered lines of an mdp file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MdpBuffer {
    lines: Vec<String>,
}

impl MdpBuffer {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read mdp {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string().as_bytes())
            .with_context(|| format!("write mdp {}", path.display()))
    }

    /// Replace the value of `key` on every line that sets it.
    ///
    /// Returns the number of lines changed. An absent key leaves the buffer
    /// untouched.
    pub fn set(&mut self, key: &str, value: impl fmt::Display) -> usize {
        let pattern = key_pattern(key);
        let value = value.to_string();
        let mut changed = 0;
        for line in &mut self.lines {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let (Some(head), Some(old)) = (caps.get(1), caps.get(3)) else {
                continue;
            };
            let rewritten = format!("{} {}{}", head.as_str(), value, &line[old.end()..]);
            *line = rewritten;
            changed += 1;
        }
        changed
    }

    /// Current value of `key`, from the first line that sets it.
    pub fn get(&self, key: &str) -> Option<&str> {
        let pattern = key_pattern(key);
        self.lines.iter().find_map(|line| {
            pattern
                .captures(line)
                .and_then(|caps| caps.get(3))
                .map(|m| m.as_str())
                .filter(|value| !value.is_empty())
        })
    }
}

impl fmt::Display for MdpBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

// Group 1 is the key through `=`, group 3 the first value token.
fn key_pattern(key: &str) -> Regex {
    Regex::new(&format!(
        r"^([ \t]*{}[ \t]*=)([ \t]*)([^\s;]*)",
        regex::escape(key)
    ))
    .expect("escaped mdp key pattern compiles")
}
