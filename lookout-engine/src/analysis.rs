//! ## lookout-engine::analysis
//! **One-shot detection of an uploaded or local file**
//!
//! Shared by `POST /predict` and `lookout analyze`. Each run writes its own
//! `predictions_<unix>.csv`; the live results file is never touched.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use lookout_core::{ResultTable, TableSummary};
use lookout_detection::{InputKind, PipelineInvoker};

use crate::error::AnalysisError;

#[derive(Debug, Clone)]
pub struct Analysis {
    pub input: PathBuf,
    pub kind: InputKind,
    /// Prediction table written by the pipeline.
    pub output: PathBuf,
    pub table: ResultTable,
    pub summary: TableSummary,
}

impl Analysis {
    /// File name of the prediction table, as served by `/download`.
    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Blocking: runs the pipeline on `input`, writing into `output_dir`.
pub fn analyze(
    pipeline: &dyn PipelineInvoker,
    input: &Path,
    output_dir: &Path,
) -> Result<Analysis, AnalysisError> {
    let kind = InputKind::from_path(input)
        .ok_or_else(|| AnalysisError::UnsupportedInput(input.to_path_buf()))?;

    fs::create_dir_all(output_dir)?;
    let output = reserve_output(output_dir, &format!("predictions_{}", unix_now()))?;

    let table = match pipeline.run(input, &output, kind.is_raw_capture()) {
        Ok(table) => table,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&output) {
                warn!("Failed to release {}: {remove_err}", output.display());
            }
            return Err(e.into());
        }
    };
    let summary = TableSummary::from_table(&table);
    info!(
        input = %input.display(),
        output = %output.display(),
        flows = summary.flows,
        "One-shot analysis finished"
    );

    Ok(Analysis {
        input: input.to_path_buf(),
        kind,
        output,
        table,
        summary,
    })
}

/// Store an upload under `upload_dir`, keeping only the final component of the
/// client's file name. An existing name gets a `<unix>_` prefix.
pub fn store_upload(
    upload_dir: &Path,
    client_name: &str,
    contents: &[u8],
) -> Result<PathBuf, AnalysisError> {
    let name = sanitize_file_name(client_name)
        .ok_or_else(|| AnalysisError::UnsupportedInput(PathBuf::from(client_name)))?;
    fs::create_dir_all(upload_dir)?;

    let mut candidates = vec![name.clone()];
    let stamp = unix_now();
    candidates.push(format!("{stamp}_{name}"));
    candidates.extend((1..100).map(|n| format!("{stamp}_{n}_{name}")));

    for candidate in candidates {
        let path = upload_dir.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(contents)?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(std::io::Error::new(ErrorKind::AlreadyExists, format!("no free name for {name}")).into())
}

/// Final path component of a client-supplied name; `None` if nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Claim `<stem>.csv` (or `<stem>_<n>.csv`) with create-new so concurrent runs
/// never share an output; the pipeline overwrites the empty placeholder.
fn reserve_output(dir: &Path, stem: &str) -> Result<PathBuf, AnalysisError> {
    for attempt in 0..1000 {
        let path = if attempt == 0 {
            dir.join(format!("{stem}.csv"))
        } else {
            dir.join(format!("{stem}_{attempt}.csv"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(std::io::Error::new(ErrorKind::AlreadyExists, format!("no free name for {stem}.csv")).into())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
