//! Labeled-example CSV reading and deterministic row sampling.
//!
//! Review CSVs are headerless `label,title,review` rows. Raw labels are
//! `1` (negative) or `2` (positive) and are mapped to binary sentiment at
//! read time.

use std::fs::File;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Fixed seed for reproducible sampling across repeated invocations.
pub const SAMPLING_SEED: u64 = 42;

/// A single review with its binary sentiment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub review: String,
    /// `1` for positive, `0` for negative.
    pub sentiment: u8,
}

/// Errors encountered while reading or sampling dataset files.
#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Csv(csv::Error),
    MalformedRow { line: u64, reason: String },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(error) => write!(f, "I/O error: {error}"),
            DatasetError::Csv(error) => write!(f, "CSV error: {error}"),
            DatasetError::MalformedRow { line, reason } => {
                write!(f, "malformed row at line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(error: std::io::Error) -> Self {
        DatasetError::Io(error)
    }
}

impl From<csv::Error> for DatasetError {
    fn from(error: csv::Error) -> Self {
        DatasetError::Csv(error)
    }
}

/// Map a raw dataset label to binary sentiment: `2` is positive, anything
/// else is negative.
pub fn binary_sentiment(raw_label: i64) -> u8 {
    u8::from(raw_label == 2)
}

/// Number of rows a fraction selects from a dataset of `total` rows.
pub fn sampled_row_count(total: usize, fraction: f64) -> usize {
    (fraction * total as f64).round() as usize
}

/// Deterministically pick `sampled_row_count(total, fraction)` distinct row
/// indices, returned in ascending order so file order is preserved.
fn sample_indices(total: usize, fraction: f64, seed: u64) -> Vec<usize> {
    let count = sampled_row_count(total, fraction).min(total);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, total, count).into_vec();
    indices.sort_unstable();
    indices
}

/// Read labeled examples from a headerless `label,title,review` CSV,
/// subsampling a fraction of rows when `subset < 1.0`.
pub fn read_labeled_csv(
    path: &Path,
    subset: f64,
    seed: u64,
) -> Result<Vec<LabeledExample>, DatasetError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut examples = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(row_index as u64 + 1);
        if record.len() < 3 {
            return Err(DatasetError::MalformedRow {
                line,
                reason: format!("expected 3 fields (label,title,review), found {}", record.len()),
            });
        }
        let raw_label: i64 =
            record[0]
                .trim()
                .parse()
                .map_err(|_| DatasetError::MalformedRow {
                    line,
                    reason: format!("label '{}' is not an integer", &record[0]),
                })?;
        examples.push(LabeledExample {
            review: record[2].to_string(),
            sentiment: binary_sentiment(raw_label),
        });
    }

    if subset < 1.0 {
        let indices = sample_indices(examples.len(), subset, seed);
        let sampled = indices.into_iter().map(|i| examples[i].clone()).collect();
        examples = sampled;
    }

    Ok(examples)
}

/// Sample a fraction of rows from `input` into `output`, preserving row
/// order. Rows are treated as opaque records; no header handling and no
/// stratification by label. Returns the number of rows written.
pub fn sample_csv(
    input: &Path,
    output: &Path,
    subset: f64,
    seed: u64,
) -> Result<usize, DatasetError> {
    let file = File::open(input)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }

    let indices = sample_indices(rows.len(), subset, seed);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(output)?;
    for &index in &indices {
        writer.write_record(&rows[index])?;
    }
    writer.flush()?;
    Ok(indices.len())
}
