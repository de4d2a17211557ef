//! Run entry point shared by the CLI and the HTTP trigger

use crate::driver::{RunDriver, RunReport};
use crate::gateway::{
    GoogleSheetsGateway, ServiceAccountKey, ServiceAccountTokens, StaticToken, TokenProvider,
};
use crate::jobs::parse_job_description;
use crate::reconciler::Reconciler;
use crate::snapshot::S3ObjectStore;
use crate::sources::{ExclusionPolicy, PageTitleSource, RichMediaSource};
use async_trait::async_trait;
use sheetkeeper_common::config::{ServiceConfig, SheetsApiConfig};
use sheetkeeper_common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Performs one complete run
#[async_trait]
pub trait Runner: Send + Sync {
    /// `Ok` only if every sheet of the run succeeded
    async fn run(&self) -> Result<RunReport>;
}

/// Runner backed by the production adapters (Sheets API, yt-dlp, S3)
pub struct ConfiguredRunner {
    config: ServiceConfig,
}

impl ConfiguredRunner {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    async fn build_driver(&self) -> Result<RunDriver> {
        let config = &self.config;

        let gateway = Arc::new(GoogleSheetsGateway::new(
            config.sheets_api.base_url.clone(),
            token_provider(&config.sheets_api)?,
        )?);

        let exclusions = ExclusionPolicy::new(&config.rich_media.excluded_hosts);
        debug!(
            command = %config.rich_media.command,
            excluded_hosts = ?exclusions.hosts(),
            "Rich media source configured"
        );

        let reconciler = Reconciler::new(
            gateway.clone(),
            Arc::new(RichMediaSource::new(config.rich_media.command.clone())),
            Arc::new(PageTitleSource::new()?),
            exclusions,
        );

        let store = Arc::new(S3ObjectStore::new(&config.storage).await?);

        Ok(RunDriver::new(gateway, reconciler, store)
            .with_snapshot_prefix(config.storage.prefix.clone())
            .with_layouts(config.layout.clone(), config.layouts.clone()))
    }
}

/// Static token if configured, else tokens minted from the service-account key
pub fn token_provider(sheets_api: &SheetsApiConfig) -> Result<Arc<dyn TokenProvider>> {
    if let Some(token) = &sheets_api.access_token {
        debug!("Using static Sheets access token");
        return Ok(Arc::new(StaticToken::new(token.clone())));
    }

    let credentials = sheets_api.credentials.as_deref().ok_or_else(|| {
        Error::Config("sheets_api.access_token or sheets_api.credentials is not set".to_string())
    })?;
    let tokens = ServiceAccountTokens::new(ServiceAccountKey::from_base64(credentials)?)?;
    info!(client_email = %tokens.client_email(), "Using service account credentials");
    Ok(Arc::new(tokens))
}

#[async_trait]
impl Runner for ConfiguredRunner {
    async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let jobs = parse_job_description(self.config.sheets.as_deref().unwrap_or_default())?;

        let driver = self.build_driver().await?;
        driver.run(&jobs).await.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_run_fails_before_any_io() {
        let runner = ConfiguredRunner::new(ServiceConfig::default());
        match runner.run().await {
            Err(Error::Config(message)) => {
                assert!(message.contains("SHEETKEEPER_SHEETS"));
                assert!(message.contains("SHEETKEEPER_BUCKET"));
                assert!(message.contains("SHEETKEEPER_ACCESS_TOKEN"));
            }
            other => panic!("expected config error, got {:?}", other.map(|r| r.run_id)),
        }
    }

    #[tokio::test]
    async fn test_malformed_job_description_is_config_error() {
        let mut config = ServiceConfig::default();
        config.sheets = Some("doc-without-sheets".to_string());
        config.storage.bucket = Some("bucket".to_string());
        config.sheets_api.access_token = Some("token".to_string());

        let runner = ConfiguredRunner::new(config);
        assert!(matches!(runner.run().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_static_token_overrides_credentials() {
        let sheets_api = SheetsApiConfig {
            access_token: Some("static".to_string()),
            credentials: Some("not even base64".to_string()),
            ..SheetsApiConfig::default()
        };
        let provider = token_provider(&sheets_api).unwrap();
        assert_eq!(provider.access_token().await.unwrap(), "static");
    }

    #[test]
    fn test_bad_credentials_are_config_error() {
        let sheets_api = SheetsApiConfig {
            credentials: Some("not even base64".to_string()),
            ..SheetsApiConfig::default()
        };
        assert!(matches!(token_provider(&sheets_api), Err(Error::Config(_))));
    }

    #[test]
    fn test_no_auth_is_config_error() {
        assert!(matches!(
            token_provider(&SheetsApiConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
