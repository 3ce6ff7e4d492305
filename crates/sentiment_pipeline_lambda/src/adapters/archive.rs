//! Gzipped-tar archive extraction and data-root discovery.

use std::fs::{self, File};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::StageError;

/// Decompress a `.tgz` archive into `output_dir` and return the archive's
/// entry names in archive order.
pub fn extract_tgz(archive_path: &Path, output_dir: &Path) -> Result<Vec<String>, StageError> {
    fs::create_dir_all(output_dir).map_err(|error| {
        StageError::Data(format!(
            "failed to create output directory '{}': {error}",
            output_dir.display()
        ))
    })?;

    let file = File::open(archive_path).map_err(|error| {
        StageError::Data(format!(
            "failed to open archive '{}': {error}",
            archive_path.display()
        ))
    })?;

    let mut archive = Archive::new(GzDecoder::new(file));
    let entries = archive.entries().map_err(|error| {
        StageError::Data(format!(
            "failed to read archive '{}': {error}",
            archive_path.display()
        ))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let mut entry =
            entry.map_err(|error| StageError::Data(format!("corrupt archive entry: {error}")))?;
        let name = entry
            .path()
            .map_err(|error| StageError::Data(format!("invalid archive entry path: {error}")))?
            .to_string_lossy()
            .into_owned();
        entry.unpack_in(output_dir).map_err(|error| {
            StageError::Data(format!("failed to unpack archive entry '{name}': {error}"))
        })?;
        names.push(name);
    }
    Ok(names)
}

/// Pick the dataset directory inside the decompressed tree. An explicit
/// root always wins; otherwise the first non-hidden top-level entry is
/// used. Hidden entries (leading `.`) are archive noise, not data.
pub fn select_data_root(
    entries: &[String],
    explicit: Option<&str>,
) -> Result<String, StageError> {
    if let Some(root) = explicit {
        let trimmed = root.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StageError::Data("explicit data_root cannot be empty".to_string()));
        }
        return Ok(trimmed.to_string());
    }

    for entry in entries {
        let top = entry
            .trim_start_matches("./")
            .split('/')
            .next()
            .unwrap_or("");
        if top.is_empty() || top.starts_with('.') {
            continue;
        }
        return Ok(top.to_string());
    }

    Err(StageError::Data(
        "archive contains no visible top-level data directory".to_string(),
    ))
}

/// Test-only fixture builder shared by handler tests.
#[cfg(test)]
pub(crate) fn build_archive(path: &Path, entries: &[(&str, &str)]) {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    let file = File::create(path).expect("archive file should create");
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .expect("archive entry should append");
    }
    builder
        .into_inner()
        .expect("archive should finalize")
        .finish()
        .expect("gzip stream should finish")
        .flush()
        .expect("archive should flush");
}
