//! Key-value ledger storage for the apartment block registry.
//!
//! The registry never talks to a concrete database. It reads and writes
//! opaque byte values under string keys through the [`LedgerStore`] trait,
//! and relies on the backend for durability and ordering.
//!
//! # Storage Backends
//!
//! - [`InMemoryLedgerStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileLedgerStore`] -- append-only, CRC-framed record log on disk
//!
//! # Design Rules
//!
//! 1. A `write` has fully completed (and, for file stores, been flushed)
//!    before it returns `Ok`.
//! 2. Writes overwrite: the last value written under a key wins.
//! 3. The store never interprets values.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileLedgerStore, LogConfig, SyncMode};
pub use memory::InMemoryLedgerStore;
pub use traits::LedgerStore;
