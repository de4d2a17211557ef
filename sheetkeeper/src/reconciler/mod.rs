//! Row Reconciler
//!
//! One pass over a sheet's rows. For each row:
//! 1. Skip empty rows and rows without an http(s) URL
//! 2. Work out which tracked fields are blank
//! 3. Skip rows that are already complete (repeat runs converge)
//! 4. Query the rich-media source (unless the host is excluded), then fall
//!    back to the page-title source if the title is still unknown
//! 5. Write each blank field that now has a value, one cell at a time
//!
//! # Error Handling
//! - Connectivity failures while fetching abandon the row, not the sheet
//! - Gateway write failures abort the sheet (cells already written stay)
//! - Populated fields are never overwritten, whatever the sources return

pub mod statistics;

pub use statistics::{ReconcileStats, RowOutcome};

use crate::gateway::{cell_address, CellMatrix, SheetGateway};
use crate::layout::{Field, Layout, RowFields};
use crate::sources::ExclusionPolicy;
use crate::types::{MetadataSource, SourceError, VideoMetadata};
use chrono::NaiveDate;
use sheetkeeper_common::human_time::format_clock_duration;
use sheetkeeper_common::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suffix one video platform appends to its page titles
const PLATFORM_TITLE_SUFFIX: &str = " - YouTube";

/// Cell values derived from fetched metadata, ready to write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedValues {
    pub duration: Option<String>,
    pub upload_date: Option<String>,
    pub title: Option<String>,
}

impl DerivedValues {
    /// Derive cell values from a rich-media result
    pub fn from_metadata(metadata: &VideoMetadata) -> Self {
        Self {
            duration: metadata.duration.map(format_clock_duration),
            upload_date: metadata.upload_date.as_deref().and_then(format_upload_date),
            title: metadata.title.as_deref().and_then(non_blank),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Url => None,
            Field::Duration => self.duration.as_deref(),
            Field::UploadDate => self.upload_date.as_deref(),
            Field::Title => self.title.as_deref(),
        }
    }
}

/// `YYYYMMDD` to `YYYY-MM-DD`; `None` unless it is exactly eight digits
/// forming a real date
pub fn format_upload_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Remove the platform suffix if the title ends with it
pub fn strip_platform_suffix(title: &str) -> &str {
    title.strip_suffix(PLATFORM_TITLE_SUFFIX).unwrap_or(title)
}

/// Trimmed value, `None` if nothing is left
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Row reconciler for one run
pub struct Reconciler {
    gateway: Arc<dyn SheetGateway>,
    primary: Arc<dyn MetadataSource>,
    fallback: Arc<dyn MetadataSource>,
    exclusions: ExclusionPolicy,
}

impl Reconciler {
    /// `primary` is the rich-media source, `fallback` the page-title source
    pub fn new(
        gateway: Arc<dyn SheetGateway>,
        primary: Arc<dyn MetadataSource>,
        fallback: Arc<dyn MetadataSource>,
        exclusions: ExclusionPolicy,
    ) -> Self {
        Self {
            gateway,
            primary,
            fallback,
            exclusions,
        }
    }

    /// Reconcile all rows of one sheet.
    ///
    /// `rows` are as read from the layout's column range starting at sheet
    /// row 1, so `rows[i]` lives on sheet row `i + 1`.
    pub async fn reconcile(
        &self,
        document_id: &str,
        sheet: &str,
        rows: &CellMatrix,
        layout: &Layout,
    ) -> Result<ReconcileStats> {
        let mut stats = ReconcileStats::default();

        for (index, cells) in rows.iter().enumerate() {
            let outcome = self
                .reconcile_row(document_id, sheet, index + 1, cells, layout)
                .await?;
            stats.record(outcome);
        }

        info!(
            document_id = %document_id,
            sheet = %sheet,
            "Reconciled: {}",
            stats.display_string()
        );

        Ok(stats)
    }

    async fn reconcile_row(
        &self,
        document_id: &str,
        sheet: &str,
        row_number: usize,
        cells: &[String],
        layout: &Layout,
    ) -> Result<RowOutcome> {
        if cells.is_empty() {
            return Ok(RowOutcome::Empty);
        }

        let row = RowFields::from_cells(cells, layout);
        let url = match row.http_url() {
            Some(url) => url,
            None => return Ok(RowOutcome::NoUrl),
        };

        let missing = row.missing(layout);
        if missing.is_empty() {
            return Ok(RowOutcome::Complete);
        }

        info!(
            sheet = %sheet,
            row = row_number,
            missing = ?missing,
            "{}{}: incomplete row for URL {}; fetching",
            layout.first_column(),
            row_number,
            url
        );

        let derived = match self.fetch(url, &missing).await {
            Ok(derived) => derived,
            Err(e) => {
                warn!(
                    sheet = %sheet,
                    row = row_number,
                    url = %url,
                    error = %e,
                    "Fetch failed; leaving row for next run"
                );
                return Ok(RowOutcome::FetchFailed);
            }
        };

        let mut cells_written = 0;
        for field in &missing {
            let (Some(value), Some(column)) = (derived.get(*field), layout.column(*field)) else {
                continue;
            };

            let address = cell_address(sheet, column, row_number);
            info!(field = %field, address = %address, "    => {:?}", value);
            self.gateway.write_cell(document_id, &address, value).await?;
            cells_written += 1;
        }

        if cells_written == 0 {
            debug!(sheet = %sheet, row = row_number, url = %url, "No usable metadata found");
        }

        Ok(RowOutcome::Fetched { cells_written })
    }

    /// Query sources in precedence order and derive cell values
    async fn fetch(
        &self,
        url: &str,
        missing: &[Field],
    ) -> std::result::Result<DerivedValues, SourceError> {
        let mut derived = DerivedValues::default();

        if self.exclusions.excludes(url) {
            debug!(url = %url, "Host excluded from {} lookup", self.primary.name());
        } else if let Some(metadata) = self.primary.lookup(url).await? {
            debug!(source = self.primary.name(), metadata = ?metadata, "Metadata found");
            derived = DerivedValues::from_metadata(&metadata);
        }

        if derived.title.is_none() && missing.contains(&Field::Title) {
            if let Some(metadata) = self.fallback.lookup(url).await? {
                debug!(source = self.fallback.name(), title = ?metadata.title, "Fallback title found");
                derived.title = metadata.title.as_deref().and_then(non_blank);
            }
        }

        derived.title = derived
            .title
            .as_deref()
            .map(strip_platform_suffix)
            .and_then(non_blank);

        Ok(derived)
    }
}
