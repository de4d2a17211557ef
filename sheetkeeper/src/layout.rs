//! Sheet column layouts
//!
//! A layout fixes which fields a sheet tracks and in which columns. Two
//! layouts exist:
//! - **Simple**: URL, Title
//! - **Extended**: URL, Duration, UploadDate, Title
//!
//! Columns must be single letters and contiguous, left to right, starting at
//! the URL column. A violation is a deployment misconfiguration and is
//! rejected when the layout is built, before any row is read.

use sheetkeeper_common::config::LayoutConfig;
use sheetkeeper_common::{Error, Result};
use std::fmt;

/// A tracked row field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    Duration,
    UploadDate,
    Title,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Url => "url",
            Field::Duration => "duration",
            Field::UploadDate => "upload_date",
            Field::Title => "title",
        };
        f.write_str(name)
    }
}

/// Layout kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Simple,
    Extended,
}

/// Validated column layout for one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    kind: LayoutKind,
    url_column: char,
}

const SIMPLE_FIELDS: &[Field] = &[Field::Url, Field::Title];
const EXTENDED_FIELDS: &[Field] = &[Field::Url, Field::Duration, Field::UploadDate, Field::Title];

impl Layout {
    /// Simple layout: `title` must sit directly right of `url`
    pub fn simple(url: &str, title: &str) -> Result<Self> {
        let url_column = parse_column(url)?;
        let title_column = parse_column(title)?;
        expect_adjacent(Field::Url, url_column, Field::Title, title_column)?;

        Ok(Self {
            kind: LayoutKind::Simple,
            url_column,
        })
    }

    /// Extended layout: duration, upload date and title follow `url` with no gaps
    pub fn extended(url: &str, duration: &str, upload_date: &str, title: &str) -> Result<Self> {
        let url_column = parse_column(url)?;
        let duration_column = parse_column(duration)?;
        let upload_date_column = parse_column(upload_date)?;
        let title_column = parse_column(title)?;

        expect_adjacent(Field::Url, url_column, Field::Duration, duration_column)?;
        expect_adjacent(
            Field::Duration,
            duration_column,
            Field::UploadDate,
            upload_date_column,
        )?;
        expect_adjacent(Field::UploadDate, upload_date_column, Field::Title, title_column)?;

        Ok(Self {
            kind: LayoutKind::Extended,
            url_column,
        })
    }

    /// Build from configuration.
    ///
    /// Both `duration_column` and `upload_date_column` select the extended
    /// layout; setting only one of them is an error.
    pub fn from_config(config: &LayoutConfig) -> Result<Self> {
        match (&config.duration_column, &config.upload_date_column) {
            (None, None) => Self::simple(&config.url_column, &config.title_column),
            (Some(duration), Some(upload_date)) => Self::extended(
                &config.url_column,
                duration,
                upload_date,
                &config.title_column,
            ),
            _ => Err(Error::Config(
                "Extended layout needs both duration_column and upload_date_column".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Fields in column order, URL first
    pub fn fields(&self) -> &'static [Field] {
        match self.kind {
            LayoutKind::Simple => SIMPLE_FIELDS,
            LayoutKind::Extended => EXTENDED_FIELDS,
        }
    }

    /// Fields the reconciler fills in (everything but the URL)
    pub fn tracked_fields(&self) -> &'static [Field] {
        &self.fields()[1..]
    }

    /// Column letter for a field, if the layout tracks it
    pub fn column(&self, field: Field) -> Option<char> {
        self.offset(field)
            .map(|offset| (self.url_column as u8 + offset) as char)
    }

    /// Position of a field within a row read from this layout's range
    pub fn offset(&self, field: Field) -> Option<u8> {
        self.fields()
            .iter()
            .position(|f| *f == field)
            .map(|p| p as u8)
    }

    pub fn first_column(&self) -> char {
        self.url_column
    }

    pub fn last_column(&self) -> char {
        (self.url_column as u8 + (self.fields().len() as u8 - 1)) as char
    }

    /// Column range for reading, e.g. `A:D`
    pub fn column_range(&self) -> String {
        format!("{}:{}", self.first_column(), self.last_column())
    }
}

/// Parse a single column letter (A-Z, case-insensitive)
fn parse_column(raw: &str) -> Result<char> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
        _ => Err(Error::Config(format!(
            "Column must be a single letter A-Z, got {:?}",
            raw
        ))),
    }
}

fn expect_adjacent(left: Field, left_col: char, right: Field, right_col: char) -> Result<()> {
    if right_col as u32 == left_col as u32 + 1 {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Layout columns must be contiguous: {} column {} must directly follow {} column {}",
            right, right_col, left, left_col
        )))
    }
}

// ============================================================================
// Row decoding
// ============================================================================

/// One row decoded against a layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFields {
    pub url: Option<String>,
    pub duration: Option<String>,
    pub upload_date: Option<String>,
    pub title: Option<String>,
}

impl RowFields {
    /// Decode raw cells; short rows leave trailing fields absent
    pub fn from_cells(cells: &[String], layout: &Layout) -> Self {
        let cell = |field: Field| {
            layout
                .offset(field)
                .and_then(|offset| cells.get(offset as usize))
                .cloned()
        };

        Self {
            url: cell(Field::Url),
            duration: cell(Field::Duration),
            upload_date: cell(Field::UploadDate),
            title: cell(Field::Title),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Url => self.url.as_deref(),
            Field::Duration => self.duration.as_deref(),
            Field::UploadDate => self.upload_date.as_deref(),
            Field::Title => self.title.as_deref(),
        }
    }

    /// Non-blank value present (whitespace-only counts as blank)
    pub fn has(&self, field: Field) -> bool {
        self.get(field).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    /// The URL, if it is an absolute http(s) link
    pub fn http_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
    }

    /// Tracked fields without a value
    pub fn missing(&self, layout: &Layout) -> Vec<Field> {
        layout
            .tracked_fields()
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }
}
