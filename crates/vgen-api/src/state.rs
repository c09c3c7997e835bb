//! Application state.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use vgen_firestore::FirestoreClient;
use vgen_notify::EmailClient;
use vgen_provider::VeoClient;
use vgen_reconciler::{FirestoreJobStore, Reconciler};
use vgen_storage::R2Client;

use crate::config::AppConfig;

/// A backing service probed by `/ready`.
#[async_trait]
pub trait DependencyCheck: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), String>;
}

#[async_trait]
impl DependencyCheck for FirestoreClient {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn check(&self) -> Result<(), String> {
        // A missing document still proves the API answered.
        self.get_document("_health", "_check")
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DependencyCheck for R2Client {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn check(&self) -> Result<(), String> {
        self.check_connectivity().await.map_err(|e| e.to_string())
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reconciler: Arc<Reconciler>,
    pub checks: Vec<Arc<dyn DependencyCheck>>,
}

impl AppState {
    pub fn new(config: AppConfig, reconciler: Arc<Reconciler>) -> Self {
        Self {
            config: Arc::new(config),
            reconciler,
            checks: Vec::new(),
        }
    }

    pub fn with_check(mut self, check: Arc<dyn DependencyCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Build the production clients and wire them into a reconciler.
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let firestore = FirestoreClient::from_env()
            .await
            .context("Failed to create Firestore client")?;
        let storage = Arc::new(
            R2Client::from_env()
                .await
                .context("Failed to create R2 client")?,
        );
        let provider =
            VeoClient::new(config.provider_config()).context("Failed to create Veo client")?;
        let notifier = EmailClient::from_env().context("Failed to create email client")?;

        let reconciler = Reconciler::new(
            Arc::new(FirestoreJobStore::new(firestore.clone())),
            Arc::new(provider),
            storage.clone(),
            Arc::new(notifier),
            config.reconciler_config(),
        );

        Ok(Self::new(config, Arc::new(reconciler))
            .with_check(Arc::new(firestore))
            .with_check(storage))
    }
}
