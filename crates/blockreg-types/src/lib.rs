//! Foundation types for the apartment block registry.
//!
//! This crate provides the identifier codec and the record types stored on
//! the ledger. Every other `blockreg` crate depends on `blockreg-types`.
//!
//! # Key Types
//!
//! - [`BlockId`]: Deterministic, unambiguous key derived from street and number
//! - [`Block`]: An apartment block record with its append-only renter list
//! - [`Renter`]: An occupant stamped with a move-in time

pub mod block;
pub mod error;
pub mod id;

pub use block::{Block, Renter};
pub use error::TypeError;
pub use id::BlockId;
