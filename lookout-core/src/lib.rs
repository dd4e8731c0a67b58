//! # lookout-core
//!
//! Shared domain layer for the live-capture detection front end.
//!
//! ### Key Submodules:
//! - `table`: detection result tables (`ResultTable`) and their JSON-safe views
//! - `summary`: label / attack-type aggregation over a table
//! - `signal`: cooperative stop signal shared between a supervisor and its worker
//!
//! Nothing in here touches the network or spawns tasks; the capture, detection
//! and engine crates build on these types.

pub mod error;
pub mod signal;
pub mod summary;
pub mod table;

pub use error::TableError;
pub use signal::StopSignal;
pub use summary::{LabelCounts, TableSummary};
pub use table::{Cell, Label, ResultRow, ResultTable};
