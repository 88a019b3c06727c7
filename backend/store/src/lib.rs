//! Record store implementations.
//!
//! Both stores enforce uniqueness of `id_number` at insert time, so two
//! concurrent runs racing on the same identity can never both be accepted.

pub mod memory;
pub mod sqlite_store;

pub use memory::InMemoryRecordStore;
pub use sqlite_store::SqliteRecordStore;
