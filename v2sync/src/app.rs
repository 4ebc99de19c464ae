use crate::config::{self, ConfigDocument, FileError, TemplateError};
use crate::platform::{ReloadError, ServiceManager};
use crate::subscription::{
    self, FetchError, FetchOptions, SubscriptionFormatError, SubscriptionSource,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Fetch subscription failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Decode subscription failed: {0}")]
    Subscription(#[from] SubscriptionFormatError),
    #[error("Subscription has no usable server ({0} lines rejected)")]
    NoServers(usize),
    #[error("Merge config failed: {0}")]
    Template(#[from] TemplateError),
    #[error("Config file error: {0}")]
    File(#[from] FileError),
    #[error("Config is written but reload failed: {0}")]
    Reload(#[from] ReloadError),
}

impl SyncError {
    /// Whether the new config already replaced the old one on disk.
    pub fn config_written(&self) -> bool {
        matches!(self, SyncError::Reload(_))
    }
}

/// Outcome of the fetch, decode and merge stages.
#[derive(Debug)]
pub struct MergedConfig {
    pub document: ConfigDocument,
    pub servers: usize,
    pub rejected: usize,
}

pub struct App<M: ServiceManager> {
    source: SubscriptionSource,
    fetch_options: FetchOptions,
    template_path: PathBuf,
    config_path: PathBuf,
    // None skips the restart
    service: Option<String>,
    service_manager: M,
}

impl<M: ServiceManager> App<M> {
    pub fn new(
        source: SubscriptionSource,
        fetch_options: FetchOptions,
        template_path: PathBuf,
        config_path: PathBuf,
        service: Option<String>,
        service_manager: M,
    ) -> Self {
        Self {
            source,
            fetch_options,
            template_path,
            config_path,
            service,
            service_manager,
        }
    }

    /// Fetch, decode and merge without touching the config on disk.
    pub async fn prepare(&self) -> Result<MergedConfig, SyncError> {
        let raw = self.source.fetch(&self.fetch_options).await?;
        tracing::info!("Fetched subscription: {} bytes", raw.len());
        let subscription = subscription::decode(&raw)?;
        tracing::info!(
            "Decoded {} servers, {} lines rejected",
            subscription.servers.len(),
            subscription.rejected.len()
        );
        if subscription.servers.is_empty() {
            return Err(SyncError::NoServers(subscription.rejected.len()));
        }
        let template = config::load_template(&self.template_path)?;
        let document = config::merge(&template, &subscription.servers)?;
        Ok(MergedConfig {
            document,
            servers: subscription.servers.len(),
            rejected: subscription.rejected.len(),
        })
    }

    /// Full run: the config is written only after every earlier stage succeeded,
    /// and the service is restarted only after a successful write.
    pub async fn run(&self) -> Result<MergedConfig, SyncError> {
        let merged = self.prepare().await?;
        config::persist_document(&merged.document, &self.config_path)?;
        tracing::info!("Wrote config to {}", self.config_path.to_string_lossy());
        if let Some(service) = &self.service {
            self.service_manager.restart(service)?;
            tracing::info!("Restarted {}", service);
        }
        Ok(merged)
    }
}
