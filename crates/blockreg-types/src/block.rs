//! Ledger records for apartment blocks and their renters.
//!
//! Both records are serialized as JSON with camel-cased field names
//! (`nOfRooms`, `movedIn`) so the stored documents carry the registry's field
//! set verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::BlockId;

/// An occupant of an apartment block.
///
/// Renters are immutable once registered; there is no update or removal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Renter {
    /// Given name. Lookups match on this field exactly.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// When the renter was registered.
    pub moved_in: DateTime<Utc>,
}

impl Renter {
    /// Create a renter who moved in at `moved_in`.
    pub fn new(name: impl Into<String>, surname: impl Into<String>, moved_in: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            moved_in,
        }
    }

    /// Create a renter stamped with the current time.
    pub fn moving_in_now(name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self::new(name, surname, Utc::now())
    }
}

/// A registered apartment block.
///
/// The `id` is always derived from `street` and `number`; it is never taken
/// from user input directly. The renter list only ever grows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub street: String,
    pub number: String,
    pub n_of_rooms: String,
    #[serde(default)]
    pub renters: Vec<Renter>,
}

impl Block {
    /// Create an empty block at the given location.
    pub fn new(street: impl Into<String>, number: impl Into<String>, n_of_rooms: impl Into<String>) -> Self {
        let street = street.into();
        let number = number.into();
        Self {
            id: BlockId::derive(&street, &number),
            street,
            number,
            n_of_rooms: n_of_rooms.into(),
            renters: Vec::new(),
        }
    }

    /// Append a renter and return the new renter count.
    pub fn add_renter(&mut self, renter: Renter) -> usize {
        self.renters.push(renter);
        self.renters.len()
    }

    /// First renter whose name matches exactly, in registration order.
    pub fn find_renter(&self, name: &str) -> Option<&Renter> {
        self.renters.iter().find(|r| r.name == name)
    }

    /// Number of registered renters.
    pub fn renter_count(&self) -> usize {
        self.renters.len()
    }

    /// Returns `true` if nobody lives in the block.
    pub fn is_empty(&self) -> bool {
        self.renters.is_empty()
    }

    /// Returns `true` if `id` matches the id derived from the location fields.
    pub fn id_matches_location(&self) -> bool {
        self.id == BlockId::derive(&self.street, &self.number)
    }

    /// Serialize to the JSON document stored on the ledger.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode a block from its stored JSON document.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
