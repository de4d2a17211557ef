//! Run Driver
//!
//! Executes one run over a list of jobs. Every sheet goes through the same
//! sequence:
//! 1. Resolve and validate its layout
//! 2. Read the layout's column range
//! 3. Snapshot the raw rows
//! 4. Reconcile the rows
//!
//! # Error Handling
//! - Sheet isolation: a failing sheet is logged and recorded, the run moves
//!   on to the next sheet
//! - The run as a whole fails if any sheet failed (`RunReport::into_result`)

use crate::gateway::{range_spec, SheetGateway};
use crate::jobs::SheetJob;
use crate::layout::Layout;
use crate::reconciler::{ReconcileStats, Reconciler};
use crate::snapshot::{ObjectStore, SnapshotWriter};
use serde::Serialize;
use sheetkeeper_common::config::LayoutConfig;
use sheetkeeper_common::{time, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Result of one sheet within a run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SheetOutcome {
    Reconciled {
        snapshot_key: String,
        stats: ReconcileStats,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub document_id: String,
    pub sheet: String,
    #[serde(flatten)]
    pub outcome: SheetOutcome,
}

impl SheetReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SheetOutcome::Failed { .. })
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub run_timestamp: String,
    pub sheets: Vec<SheetReport>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &SheetReport> {
        self.sheets.iter().filter(|s| s.is_failed())
    }

    /// `Err(Error::RunFailed)` listing every failed sheet, else the report
    pub fn into_result(self) -> Result<RunReport> {
        let failures: Vec<String> = self
            .sheets
            .iter()
            .filter_map(|s| match &s.outcome {
                SheetOutcome::Failed { error } => {
                    Some(format!("{} / {}: {}", s.document_id, s.sheet, error))
                }
                SheetOutcome::Reconciled { .. } => None,
            })
            .collect();

        if failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::RunFailed(format!(
                "{} of {} sheets failed\n{}",
                failures.len(),
                self.sheets.len(),
                failures.join("\n")
            )))
        }
    }
}

/// Drives runs against one gateway, reconciler and snapshot store
pub struct RunDriver {
    gateway: Arc<dyn SheetGateway>,
    reconciler: Reconciler,
    store: Arc<dyn ObjectStore>,
    snapshot_prefix: String,
    default_layout: LayoutConfig,
    layout_overrides: HashMap<String, LayoutConfig>,
}

impl RunDriver {
    pub fn new(
        gateway: Arc<dyn SheetGateway>,
        reconciler: Reconciler,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            gateway,
            reconciler,
            store,
            snapshot_prefix: String::new(),
            default_layout: LayoutConfig::default(),
            layout_overrides: HashMap::new(),
        }
    }

    pub fn with_snapshot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.snapshot_prefix = prefix.into();
        self
    }

    /// Default layout plus per-sheet overrides (keyed by sheet name)
    pub fn with_layouts(
        mut self,
        default_layout: LayoutConfig,
        overrides: HashMap<String, LayoutConfig>,
    ) -> Self {
        self.default_layout = default_layout;
        self.layout_overrides = overrides;
        self
    }

    /// Run all jobs with a fresh run timestamp
    pub async fn run(&self, jobs: &[SheetJob]) -> RunReport {
        self.run_with_timestamp(jobs, time::current_run_timestamp())
            .await
    }

    /// Run all jobs, keying snapshots by `run_timestamp`
    pub async fn run_with_timestamp(&self, jobs: &[SheetJob], run_timestamp: String) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, run_timestamp = %run_timestamp);

        async {
            let snapshots = SnapshotWriter::new(self.store.clone(), run_timestamp.clone())
                .with_prefix(self.snapshot_prefix.clone());

            let sheet_count: usize = jobs.iter().map(|j| j.sheets.len()).sum();
            info!(jobs = jobs.len(), sheets = sheet_count, "Starting run");

            let mut sheets = Vec::with_capacity(sheet_count);
            for job in jobs {
                for sheet in &job.sheets {
                    let outcome = match self.run_sheet(&snapshots, &job.document_id, sheet).await {
                        Ok((snapshot_key, stats)) => SheetOutcome::Reconciled { snapshot_key, stats },
                        Err(e) => {
                            error!(
                                document_id = %job.document_id,
                                sheet = %sheet,
                                error = %e,
                                "Sheet failed"
                            );
                            SheetOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };

                    sheets.push(SheetReport {
                        document_id: job.document_id.clone(),
                        sheet: sheet.clone(),
                        outcome,
                    });
                }
            }

            let report = RunReport {
                run_id,
                run_timestamp: run_timestamp.clone(),
                sheets,
            };

            info!(
                sheets = report.sheets.len(),
                failed = report.failures().count(),
                "Run finished"
            );

            report
        }
        .instrument(span)
        .await
    }

    async fn run_sheet(
        &self,
        snapshots: &SnapshotWriter,
        document_id: &str,
        sheet: &str,
    ) -> Result<(String, ReconcileStats)> {
        let layout = Layout::from_config(self.layout_config(sheet))?;
        let range = range_spec(sheet, &layout.column_range());

        info!(document_id = %document_id, range = %range, "Fetching sheet");
        let rows = self.gateway.read_range(document_id, &range).await?;
        info!(
            document_id = %document_id,
            sheet = %sheet,
            rows = rows.len(),
            "Fetched {} rows",
            rows.len()
        );

        let snapshot_key = snapshots.snapshot(document_id, sheet, &rows).await?;
        let stats = self
            .reconciler
            .reconcile(document_id, sheet, &rows, &layout)
            .await?;

        Ok((snapshot_key, stats))
    }

    fn layout_config(&self, sheet: &str) -> &LayoutConfig {
        self.layout_overrides
            .get(sheet)
            .unwrap_or(&self.default_layout)
    }
}
