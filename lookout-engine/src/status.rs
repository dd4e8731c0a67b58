//! ## lookout-engine::status
//! **Point-in-time view of the live loop for `GET /live_status`**
//!
//! ### Expectations:
//! - Built fresh per request, never cached
//! - No results file is a valid empty state, as is an unreadable one
//! - Every value in `all_flows` is a finite number, a string or `null`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use lookout_core::{LabelCounts, ResultTable, TableError, TableSummary};

use crate::state::LiveState;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub last_capture: Option<String>,
    pub flows: usize,
    pub summary: LabelCounts,
    pub attack_types: BTreeMap<String, u64>,
    pub all_flows: Vec<Value>,
    /// Rows whose label was missing or unknown; `flows == summary.total() + unrecognized`.
    #[serde(skip)]
    pub unrecognized: usize,
}

#[derive(Debug, Clone)]
pub struct StatusReader {
    state: Arc<LiveState>,
    results_file: PathBuf,
}

impl StatusReader {
    pub fn new(state: Arc<LiveState>, results_file: PathBuf) -> Self {
        Self {
            state,
            results_file,
        }
    }

    /// Blocking: reads the results file.
    pub fn read(&self) -> StatusSnapshot {
        let table = match ResultTable::load(&self.results_file) {
            Ok(table) => Some(table),
            Err(TableError::NotFound(_)) => None,
            Err(e) => {
                warn!(path = %self.results_file.display(), "Ignoring unreadable results file: {e}");
                None
            }
        };

        // A cycle renames its table into place before committing the capture
        // name, so reading the state second never pairs a table with an older name.
        let (running, last_capture) = self.state.snapshot();
        let mut snapshot = StatusSnapshot {
            running,
            last_capture,
            ..StatusSnapshot::default()
        };

        if let Some(table) = table {
            let summary = TableSummary::from_table(&table);
            snapshot.flows = summary.flows;
            snapshot.summary = summary.summary;
            snapshot.attack_types = summary.attack_types;
            snapshot.unrecognized = summary.unrecognized;
            snapshot.all_flows = table.records();
        }
        snapshot
    }
}
