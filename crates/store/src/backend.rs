use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{LeadRecord, StoreError};

#[cfg(feature = "backend-redb")]
pub mod redb;
pub mod rest;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbLeadStore;
pub use self::rest::RestLeadStore;

/// Append-only lead storage.
///
/// One call per accepted submission; there is no update, delete or query
/// contract.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, record: &LeadRecord) -> Result<(), StoreError>;

    /// Short backend name for logs and readiness output.
    fn name(&self) -> &'static str;

    /// Whether inserts can succeed at all.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Configuration for selecting and building a backend.
///
/// ```
/// use store::StoreBackendConfig;
///
/// let config: StoreBackendConfig =
///     serde_json::from_str(r#"{"backend": "redb", "path": "/data/leads.redb"}"#).unwrap();
/// assert_eq!(config, StoreBackendConfig::redb("/data/leads.redb"));
/// assert_eq!(StoreBackendConfig::default(), StoreBackendConfig::Disabled);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// No storage. Inserts fail, so only the storing route is affected.
    #[default]
    Disabled,
    /// Process memory. Leads are lost on restart.
    Memory,
    /// Embedded redb file.
    Redb { path: String },
    /// Hosted Postgres behind a PostgREST-style API.
    Rest {
        url: String,
        api_key: String,
        #[serde(default = "default_table")]
        table: String,
    },
}

fn default_table() -> String {
    "leads".to_string()
}

impl StoreBackendConfig {
    pub fn memory() -> Self {
        StoreBackendConfig::Memory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        StoreBackendConfig::Redb { path: path.into() }
    }

    /// Build the configured backend.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] when the redb file cannot be opened or
    /// the redb backend was disabled at compile time.
    pub fn build(&self, client: reqwest::Client) -> Result<Arc<dyn LeadStore>, StoreError> {
        match self {
            StoreBackendConfig::Disabled => Ok(Arc::new(UnconfiguredLeadStore)),
            StoreBackendConfig::Memory => Ok(Arc::new(InMemoryLeadStore::new())),
            StoreBackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Arc::new(RedbLeadStore::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
            StoreBackendConfig::Rest {
                url,
                api_key,
                table,
            } => Ok(Arc::new(RestLeadStore::new(
                client,
                url.clone(),
                api_key.clone(),
                table.clone(),
            ))),
        }
    }
}

/// Stand-in used when no storage is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredLeadStore;

#[async_trait]
impl LeadStore for UnconfiguredLeadStore {
    async fn insert(&self, _record: &LeadRecord) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// An in-memory store using a `RwLock` around a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    records: RwLock<Vec<LeadRecord>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted so far, in insertion order.
    pub fn records(&self) -> Vec<LeadRecord> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn insert(&self, record: &LeadRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::backend("lead store lock poisoned"))?
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use schema::LeadStatus;
    use uuid::Uuid;

    pub(crate) fn sample_record() -> LeadRecord {
        LeadRecord {
            id: Uuid::new_v4(),
            source: "apply".into(),
            name: "Taro".into(),
            email: "taro@example.com".into(),
            company: String::new(),
            phone: String::new(),
            detail: "Please contact me about pricing".into(),
            client_ip: "203.0.113.7".into(),
            user_agent: "test".into(),
            submitted_at: Utc::now(),
            status: LeadStatus::Received,
        }
    }

    #[tokio::test]
    async fn memory_store_appends() {
        let store = InMemoryLeadStore::new();
        let record = sample_record();
        store.insert(&record).await.unwrap();
        store.insert(&sample_record()).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0], record);
    }

    #[tokio::test]
    async fn disabled_store_fails_at_insert_time() {
        let store = StoreBackendConfig::Disabled
            .build(reqwest::Client::new())
            .expect("building a disabled store never fails");
        assert!(!store.is_configured());
        assert_eq!(
            store.insert(&sample_record()).await,
            Err(StoreError::NotConfigured)
        );
    }

    #[test]
    fn rest_config_defaults_table() {
        let config: StoreBackendConfig = serde_json::from_str(
            r#"{"backend": "rest", "url": "https://db.example.com", "api_key": "k"}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            StoreBackendConfig::Rest {
                url: "https://db.example.com".into(),
                api_key: "k".into(),
                table: "leads".into(),
            }
        );
    }
}
