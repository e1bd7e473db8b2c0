//! Apartment block registry over a key-value ledger.
//!
//! Blocks and their renters are stored one record per block under a key
//! derived from the block's street and number. A separate existence index,
//! kept under one reserved key, records which blocks have been created so
//! counts and scans never need to walk the whole key space.
//!
//! # Architecture
//!
//! - The **repository** reads and writes whole block records.
//! - The **index** is a reloadable projection of its reserved key. It is
//!   re-read at the top of every invocation by default, so several processes
//!   can share one ledger without trusting stale memory.
//! - The **registry** runs the operations, writing the block record before
//!   the index entry so an interrupted create leaves an orphan record (which
//!   is recoverable) rather than a dangling index entry (which is not).
//! - The **dispatcher** turns an operation name and positional arguments into
//!   a typed [`Invocation`], rejecting unknown names and short argument lists
//!   before any ledger access.
//!
//! # Modules
//!
//! - [`error`]: [`RegistryError`] and the `Result` alias
//! - [`config`]: [`RegistryConfig`] and the index reload policy
//! - [`repository`]: [`BlockRepository`]
//! - [`index`]: [`ExistenceIndex`]
//! - [`registry`]: [`Registry`] and its operations
//! - [`dispatch`]: [`Operation`] and [`Invocation`]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod registry;
pub mod repository;

pub use config::{IndexReload, RegistryConfig, DEFAULT_INDEX_KEY};
pub use dispatch::{Invocation, Operation};
pub use error::{RegistryError, Result};
pub use index::ExistenceIndex;
pub use registry::Registry;
pub use repository::BlockRepository;
