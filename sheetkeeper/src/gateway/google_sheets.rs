//! Google Sheets gateway
//!
//! Sheets API v4 `values` endpoints over HTTPS:
//! - Read: `GET {base}/spreadsheets/{id}/values/{range}`
//! - Write: `PUT {base}/spreadsheets/{id}/values/{range}?valueInputOption=RAW`
//!
//! Every request asks its `TokenProvider` for the bearer token, so minted
//! tokens are refreshed between requests of a long run.

use super::auth::TokenProvider;
use super::{CellMatrix, SheetGateway};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use sheetkeeper_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("sheetkeeper/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Response body of a values read
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: CellMatrix,
}

/// Request body of a values write
#[derive(Debug, Serialize)]
struct ValueUpdate<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// Sheets API v4 client
pub struct GoogleSheetsGateway {
    http_client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GoogleSheetsGateway {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            tokens,
        })
    }

    /// `{base}/spreadsheets/{id}/values/{range}` with path segments escaped
    fn values_url(&self, document_id: &str, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid Sheets API base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Sheets API base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", document_id, "values", range]);

        Ok(url)
    }

    async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Sheets(format!("{} returned {}: {}", context, status, body)))
    }
}

#[async_trait]
impl SheetGateway for GoogleSheetsGateway {
    async fn read_range(&self, document_id: &str, range: &str) -> Result<CellMatrix> {
        let url = self.values_url(document_id, range)?;
        let token = self.tokens.access_token().await?;
        debug!(document_id = %document_id, range = %range, "Reading sheet range");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::Sheets(format!("Read {} failed: {}", range, e)))?;

        let response = Self::check_status(response, &format!("Read {}", range)).await?;

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| Error::Sheets(format!("Parse of {} failed: {}", range, e)))?;

        Ok(value_range.values)
    }

    async fn write_cell(&self, document_id: &str, address: &str, value: &str) -> Result<()> {
        let mut url = self.values_url(document_id, address)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let token = self.tokens.access_token().await?;

        debug!(document_id = %document_id, address = %address, value = %value, "Writing cell");

        let body = ValueUpdate {
            range: address,
            major_dimension: "ROWS",
            values: [[value]],
        };

        let response = self
            .http_client
            .put(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Sheets(format!("Write {} failed: {}", address, e)))?;

        Self::check_status(response, &format!("Write {}", address)).await?;
        Ok(())
    }
}
