//! Numeric sample tables written alongside NPT runs.
//!
//! A table is whitespace-separated columns with a header row. Column 1 holds
//! the box length in Angstrom.
use anyhow::{anyhow, ensure, Context, Result};
use std::fs;
use std::path::Path;

const ANGSTROM_TO_NM: f64 = 0.1;
const BOX_LENGTH_COLUMN: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    rows: Vec<Vec<f64>>,
}

impl SampleTable {
    /// Parse a table, skipping `skip_rows` leading lines. Blank lines and
    /// `#` comments are ignored; every row must have the same width.
    pub fn parse(text: &str, skip_rows: usize) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (idx, line) in text.lines().enumerate().skip(skip_rows) {
            let data = line.split('#').next().unwrap_or_default().trim();
            if data.is_empty() {
                continue;
            }
            let row = data
                .split_whitespace()
                .map(|field| {
                    field
                        .parse::<f64>()
                        .with_context(|| format!("line {}: parse {field:?}", idx + 1))
                })
                .collect::<Result<Vec<_>>>()?;
            if let Some(first) = rows.first() {
                ensure!(
                    first.len() == row.len(),
                    "line {}: expected {} columns, found {}",
                    idx + 1,
                    first.len(),
                    row.len()
                );
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn load(path: &Path, skip_rows: usize) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read samples {}", path.display()))?;
        Self::parse(&text, skip_rows).with_context(|| format!("parse samples {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean of `column` over rows `start..`.
    pub fn column_mean(&self, column: usize, start: usize) -> Result<f64> {
        let selected = self.rows.get(start..).unwrap_or_default();
        ensure!(
            !selected.is_empty(),
            "no samples selected (start row {start} of {})",
            self.rows.len()
        );
        let mut sum = 0.0;
        for row in selected {
            sum += row
                .get(column)
                .ok_or_else(|| anyhow!("sample rows have no column {column}"))?;
        }
        Ok(sum / selected.len() as f64)
    }

    /// Average box length in nm over the trailing `fraction` of samples.
    pub fn mean_box_length_nm(&self, fraction: f64) -> Result<f64> {
        let start = trailing_start(self.rows.len(), fraction);
        Ok(ANGSTROM_TO_NM * self.column_mean(BOX_LENGTH_COLUMN, start)?)
    }
}

/// First row of the trailing `fraction` of `rows` samples.
pub fn trailing_start(rows: usize, fraction: f64) -> usize {
    (rows as f64 * (1.0 - fraction)).floor() as usize
}
