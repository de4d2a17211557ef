//! Reconciliation statistics

use serde::{Deserialize, Serialize};

/// What happened to one row during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Row had no cells
    Empty,
    /// Missing URL, or not an http(s) link
    NoUrl,
    /// Every tracked field already set
    Complete,
    /// Fetched; `cells_written` may be zero if nothing usable came back
    Fetched { cells_written: usize },
    /// Fetch hit a connectivity failure; row left for the next pass
    FetchFailed,
}

/// Per-sheet counters for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub rows_seen: usize,
    pub rows_without_url: usize,
    pub rows_complete: usize,
    pub rows_fetched: usize,
    pub rows_failed: usize,
    pub cells_written: usize,
}

impl ReconcileStats {
    pub fn record(&mut self, outcome: RowOutcome) {
        self.rows_seen += 1;
        match outcome {
            RowOutcome::Empty | RowOutcome::NoUrl => self.rows_without_url += 1,
            RowOutcome::Complete => self.rows_complete += 1,
            RowOutcome::Fetched { cells_written } => {
                self.rows_fetched += 1;
                self.cells_written += cells_written;
            }
            RowOutcome::FetchFailed => self.rows_failed += 1,
        }
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} rows: {} complete, {} without URL, {} fetched ({} cells written), {} failed",
            self.rows_seen,
            self.rows_complete,
            self.rows_without_url,
            self.rows_fetched,
            self.cells_written,
            self.rows_failed
        )
    }
}
