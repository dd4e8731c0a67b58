//! # Lookout Engine
//!
//! Orchestration of the live capture-and-detect loop.
//!
//! - `supervisor`: owns the single background worker (start / stop / state)
//! - `cycle`: one capture → persist → detect → commit iteration
//! - `status`: sanitized snapshot of worker state plus the latest results
//! - `analysis`: one-shot detection of an uploaded or local file

pub mod analysis;
pub mod cycle;
pub mod error;
pub mod settings;
pub mod state;
pub mod status;
pub mod supervisor;

pub use analysis::{analyze, store_upload, Analysis};
pub use cycle::{CaptureCycle, CycleOutcome, CycleReport, SkipReason};
pub use error::{AnalysisError, CycleError, SupervisorError};
pub use settings::{packet_source, LiveSettings};
pub use state::LiveState;
pub use status::{StatusReader, StatusSnapshot};
pub use supervisor::CaptureSupervisor;
