//! ## lookout-engine::cycle
//! **One capture → persist → detect → commit iteration**
//!
//! ### Expectations:
//! - Blocking; the supervisor runs it on the blocking pool
//! - The stop signal is checked before capture, after capture and before
//!   inference; the capture primitive also polls it between reads
//! - The results file is only ever replaced by rename, so readers see the
//!   previous table or the new one, never a partial write
//! - `last_artifact` changes only after the results file has been replaced

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info};

use lookout_capture::{savefile, PacketSource};
use lookout_core::{StopSignal, TableSummary};
use lookout_detection::PipelineInvoker;

use crate::error::CycleError;
use crate::settings::LiveSettings;
use crate::state::LiveState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The stop signal fired before inference.
    Stopped,
    /// The capture window saw no packets.
    NoPackets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// File name of the raw capture, now the `last_artifact`.
    pub artifact: String,
    pub packets: usize,
    pub summary: TableSummary,
    pub pipeline_time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Skipped(SkipReason),
}

pub struct CaptureCycle {
    source: Arc<dyn PacketSource>,
    pipeline: Arc<dyn PipelineInvoker>,
    settings: LiveSettings,
    state: Arc<LiveState>,
}

impl CaptureCycle {
    pub fn new(
        source: Arc<dyn PacketSource>,
        pipeline: Arc<dyn PipelineInvoker>,
        settings: LiveSettings,
        state: Arc<LiveState>,
    ) -> Self {
        Self {
            source,
            pipeline,
            settings,
            state,
        }
    }

    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }

    pub fn run(&self, signal: &StopSignal) -> Result<CycleOutcome, CycleError> {
        if signal.is_triggered() {
            return Ok(CycleOutcome::Skipped(SkipReason::Stopped));
        }

        let started = Local::now();
        let traffic = self.source.capture(self.settings.window, signal)?;

        if signal.is_triggered() {
            debug!(packets = traffic.len(), "Stop requested during capture; window discarded");
            return Ok(CycleOutcome::Skipped(SkipReason::Stopped));
        }
        if traffic.is_empty() {
            debug!("No packets captured in this window");
            return Ok(CycleOutcome::Skipped(SkipReason::NoPackets));
        }

        let capture_path = savefile::persist(&self.settings.capture_dir, &traffic, &started)
            .map_err(CycleError::Savefile)?;
        let artifact = file_name(&capture_path);

        if signal.is_triggered() {
            info!(artifact = %artifact, "Stop requested; raw capture kept, inference skipped");
            return Ok(CycleOutcome::Skipped(SkipReason::Stopped));
        }

        let (summary, pipeline_time) = self.detect_and_replace(&capture_path)?;
        self.state.commit_artifact(artifact.clone());

        info!(
            artifact = %artifact,
            flows = summary.flows,
            attacks = summary.summary.attack,
            "Capture cycle committed"
        );

        Ok(CycleOutcome::Completed(CycleReport {
            artifact,
            packets: traffic.len(),
            summary,
            pipeline_time,
        }))
    }

    /// Run the pipeline into a staging directory beside the results file, then
    /// rename its output over the canonical file.
    fn detect_and_replace(&self, capture: &Path) -> Result<(TableSummary, Duration), CycleError> {
        let results_file = &self.settings.results_file;
        let results_dir = parent_dir(results_file);
        fs::create_dir_all(&results_dir).map_err(|source| CycleError::Persist {
            path: results_dir.clone(),
            source,
        })?;

        // Same directory as the target so the final rename stays on one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(".lookout-staging")
            .tempdir_in(&results_dir)
            .map_err(|source| CycleError::Persist {
                path: results_dir.clone(),
                source,
            })?;
        let staged = staging.path().join(
            results_file
                .file_name()
                .unwrap_or_else(|| OsStr::new("results.csv")),
        );

        let timer = Instant::now();
        let table = self.pipeline.run(capture, &staged, true)?;
        let pipeline_time = timer.elapsed();

        fs::rename(&staged, results_file).map_err(|source| CycleError::Persist {
            path: results_file.clone(),
            source,
        })?;

        Ok((TableSummary::from_table(&table), pipeline_time))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
