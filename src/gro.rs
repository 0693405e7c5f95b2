//! Box vectors from `.gro` coordinate files.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Periodic box in nm, one row per box vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxVectors {
    pub v1: [f64; 3],
    pub v2: [f64; 3],
    pub v3: [f64; 3],
}

impl BoxVectors {
    /// Parse the box line: `v1x v2y v3z [v1y v1z v2x v2z v3x v3y]`.
    pub fn parse_line(line: &str) -> Result<Self> {
        let values = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .with_context(|| format!("parse box value {field:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        match values.as_slice() {
            [x, y, z] => Ok(Self {
                v1: [*x, 0.0, 0.0],
                v2: [0.0, *y, 0.0],
                v3: [0.0, 0.0, *z],
            }),
            [v1x, v2y, v3z, v1y, v1z, v2x, v2z, v3x, v3y] => Ok(Self {
                v1: [*v1x, *v1y, *v1z],
                v2: [*v2x, *v2y, *v2z],
                v3: [*v3x, *v3y, *v3z],
            }),
            _ => Err(anyhow!(
                "box line has {} values, expected 3 or 9",
                values.len()
            )),
        }
    }

    /// Box from the last non-blank line of a `.gro` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read gro {}", path.display()))?;
        let line = text
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| anyhow!("gro file {} is empty", path.display()))?;
        Self::parse_line(line).with_context(|| format!("box line of {}", path.display()))
    }

    pub fn length_x(&self) -> f64 {
        self.v1[0]
    }

    pub fn is_rectangular(&self) -> bool {
        [self.v1[1], self.v1[2], self.v2[0], self.v2[2], self.v3[0], self.v3[1]]
            .iter()
            .all(|value| *value == 0.0)
    }
}
