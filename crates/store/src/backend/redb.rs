//! Redb (Rust embedded database) backend for lead storage.
//!
//! Each lead is one row keyed by its id, holding the JSON-encoded record.
//! Writes run in a blocking task so the async request handler is not
//! stalled by the commit fsync.
//!
//! # Configuration Example
//! ```yaml
//! storage:
//!   backend: "redb"
//!   path: "/data/leads.redb"
//! ```

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, TableDefinition};
use tracing::debug;

use crate::{LeadRecord, LeadStore, StoreError};

/// Table definition for lead rows.
const LEADS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("leads");

/// Redb-backed lead store.
///
/// The `Arc<Database>` wrapper allows sharing across threads; redb handles
/// its own locking.
pub struct RedbLeadStore {
    db: Arc<Database>,
}

impl RedbLeadStore {
    /// Open or create a database at `path` and make sure the table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::backend(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(LEADS_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn insert_blocking(db: &Database, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(LEADS_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))
    }
}

#[async_trait]
impl LeadStore for RedbLeadStore {
    async fn insert(&self, record: &LeadRecord) -> Result<(), StoreError> {
        let key = record.id.to_string();
        let value = serde_json::to_vec(record).map_err(|e| StoreError::Encode(e.to_string()))?;
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || Self::insert_blocking(&db, &key, &value))
            .await
            .map_err(|e| StoreError::backend(format!("storage task failed: {e}")))??;

        debug!(lead_id = %record.id, "redb_lead_inserted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::sample_record;
    use redb::ReadableTable;
    use tempfile::NamedTempFile;

    fn read_back(store: &RedbLeadStore, key: &str) -> Option<LeadRecord> {
        let read_txn = store.db.begin_read().unwrap();
        let table = read_txn.open_table(LEADS_TABLE).unwrap();
        table
            .get(key)
            .unwrap()
            .map(|value| serde_json::from_slice(value.value()).unwrap())
    }

    #[tokio::test]
    async fn insert_persists_one_row() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbLeadStore::open(temp_file.path()).unwrap();

        let record = sample_record();
        store.insert(&record).await.unwrap();

        assert_eq!(read_back(&store, &record.id.to_string()), Some(record));
    }

    #[tokio::test]
    async fn rows_survive_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let record = sample_record();
        {
            let store = RedbLeadStore::open(temp_file.path()).unwrap();
            store.insert(&record).await.unwrap();
        }
        let store = RedbLeadStore::open(temp_file.path()).unwrap();
        assert_eq!(read_back(&store, &record.id.to_string()), Some(record));
    }
}
