//! # Lookout Detection Seam
//!
//! The ML pipeline (feature extraction and classification) lives outside this
//! workspace. This crate is the narrow seam to it: hand over a capture or a
//! feature file plus an output path, get a [`ResultTable`] back.
//!
//! [`ResultTable`]: lookout_core::ResultTable

pub mod input;
pub mod pipeline;

pub use input::InputKind;
pub use pipeline::{CommandPipeline, PipelineError, PipelineInvoker};
