//! Sheet Gateway
//!
//! The only path by which spreadsheet state is read or mutated. Writes are
//! never batched: each cell update is its own request, so a failure part way
//! through a row leaves earlier cells updated and later ones untouched.

pub mod auth;
pub mod google_sheets;

pub use auth::{ServiceAccountKey, ServiceAccountTokens, StaticToken, TokenProvider};
pub use google_sheets::GoogleSheetsGateway;

use async_trait::async_trait;
use sheetkeeper_common::Result;

/// Rows of cell strings as returned by a range read
pub type CellMatrix = Vec<Vec<String>>;

/// Spreadsheet read/write access
#[async_trait]
pub trait SheetGateway: Send + Sync {
    /// Read a rectangular A1 range (e.g. `'Links'!A:B`).
    ///
    /// Trailing empty cells and rows may be omitted by the backend.
    async fn read_range(&self, document_id: &str, range: &str) -> Result<CellMatrix>;

    /// Write one cell at an A1 address (e.g. `'Links'!B7`)
    async fn write_cell(&self, document_id: &str, address: &str, value: &str) -> Result<()>;
}

/// Sheet name as an A1 prefix, always quoted (`'My Sheet'!`)
pub fn sheet_prefix(sheet: &str) -> String {
    format!("'{}'!", sheet.replace('\'', "''"))
}

/// A1 range for whole columns of a sheet, e.g. `'Links'!A:B`
pub fn range_spec(sheet: &str, column_range: &str) -> String {
    format!("{}{}", sheet_prefix(sheet), column_range)
}

/// A1 address of one cell; `row_number` is 1-indexed
pub fn cell_address(sheet: &str, column: char, row_number: usize) -> String {
    format!("{}{}{}", sheet_prefix(sheet), column, row_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_spec() {
        assert_eq!(range_spec("Links", "A:B"), "'Links'!A:B");
        assert_eq!(range_spec("My Videos", "C:F"), "'My Videos'!C:F");
    }

    #[test]
    fn test_cell_address() {
        assert_eq!(cell_address("Links", 'B', 1), "'Links'!B1");
        assert_eq!(cell_address("Links", 'D', 42), "'Links'!D42");
    }

    #[test]
    fn test_quotes_in_sheet_name_are_doubled() {
        assert_eq!(sheet_prefix("Bob's"), "'Bob''s'!");
    }
}
