//! Storage for TaskHub records.
//!
//! [`RecordStore`] is the concurrent in-memory map every manager owns. The
//! [`Storage`] trait is the pluggable snapshot persistence layer, with a
//! JSON file reference implementation.

#![warn(missing_docs)]

pub mod record_store;
pub mod trait_;
#[cfg(feature = "json")]
pub mod json_storage;

pub use record_store::RecordStore;
pub use trait_::{Storage, StorageError, Result};
#[cfg(feature = "json")]
pub use json_storage::JsonStorage;
