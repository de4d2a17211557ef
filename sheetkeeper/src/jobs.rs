//! Job description parsing
//!
//! Format: `doc1:SheetA:SheetB::doc2:SheetC`. Groups are separated by `::`,
//! and inside a group the first token is the document id.

use sheetkeeper_common::{Error, Result};

const GROUP_SEPARATOR: &str = "::";
const TOKEN_SEPARATOR: char = ':';

/// One spreadsheet document and the tabs to reconcile in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetJob {
    pub document_id: String,
    pub sheets: Vec<String>,
}

/// Parse a job description into an ordered list of jobs
pub fn parse_job_description(description: &str) -> Result<Vec<SheetJob>> {
    if description.trim().is_empty() {
        return Err(Error::Config("Job description is empty".to_string()));
    }

    description
        .split(GROUP_SEPARATOR)
        .map(parse_group)
        .collect()
}

fn parse_group(group: &str) -> Result<SheetJob> {
    let mut tokens = group.split(TOKEN_SEPARATOR).map(str::trim);

    let document_id = tokens.next().unwrap_or_default();
    if document_id.is_empty() {
        return Err(Error::Config(format!(
            "Job group '{}' has no document id",
            group
        )));
    }

    let sheets: Vec<String> = tokens.map(str::to_string).collect();
    if sheets.is_empty() {
        return Err(Error::Config(format!(
            "Job group for document {} lists no sheets",
            document_id
        )));
    }
    if sheets.iter().any(|s| s.is_empty()) {
        return Err(Error::Config(format!(
            "Job group for document {} has an empty sheet name",
            document_id
        )));
    }

    Ok(SheetJob {
        document_id: document_id.to_string(),
        sheets,
    })
}
