//! Lead storage.
//!
//! Every accepted application becomes exactly one [`LeadRecord`] appended
//! through a [`LeadStore`]. Backends:
//!
//! - [`InMemoryLeadStore`] - tests and throwaway local runs
//! - [`RedbLeadStore`] - embedded file, the default for self-hosting
//! - [`RestLeadStore`] - hosted Postgres behind a REST API
//! - [`UnconfiguredLeadStore`] - no storage configured; every insert fails
//!
//! Pick one with [`StoreBackendConfig::build`].

mod backend;
mod error;
mod record;

#[cfg(feature = "backend-redb")]
pub use crate::backend::RedbLeadStore;
pub use crate::backend::{
    InMemoryLeadStore, LeadStore, RestLeadStore, StoreBackendConfig, UnconfiguredLeadStore,
};
pub use crate::error::StoreError;
pub use crate::record::LeadRecord;
