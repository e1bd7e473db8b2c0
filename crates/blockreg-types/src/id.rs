use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator placed between the encoded street and the encoded number.
pub const SEPARATOR: char = '#';

/// Escape character used inside each encoded component.
pub const ESCAPE: char = '\\';

/// Ledger key of an apartment block, derived from its street and number.
///
/// Each component is escaped (`\` becomes `\\`, `#` becomes `\#`) and the two
/// are joined with a single unescaped `#`. Decoding is therefore unique, so
/// distinct `(street, number)` pairs never share an id: `("A1", "2")` yields
/// `A1#2` while `("A", "12")` yields `A#12`.
///
/// Every block id contains exactly one unescaped separator, which keeps the
/// id space disjoint from reserved ledger keys that contain none.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(String);

impl BlockId {
    /// Derive the id for a block at `street` and `number`.
    pub fn derive(street: &str, number: &str) -> Self {
        let mut id = String::with_capacity(street.len() + number.len() + 1);
        escape_into(street, &mut id);
        id.push(SEPARATOR);
        escape_into(number, &mut id);
        Self(id)
    }

    /// Parse a raw ledger key as a block id.
    ///
    /// Fails if the key is not something [`BlockId::derive`] could have
    /// produced.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        decode(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Recover the `(street, number)` pair this id was derived from.
    pub fn location(&self) -> Result<(String, String), TypeError> {
        decode(&self.0)
    }

    /// The raw ledger key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({:?})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlockId {
    type Error = TypeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        decode(&raw)?;
        Ok(Self(raw))
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

impl AsRef<str> for BlockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn escape_into(component: &str, out: &mut String) {
    for ch in component.chars() {
        if ch == ESCAPE || ch == SEPARATOR {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

fn decode(raw: &str) -> Result<(String, String), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidBlockId {
        id: raw.to_string(),
        reason: reason.into(),
    };

    let mut street = String::new();
    let mut number = String::new();
    let mut separated = false;
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        let current = if separated { &mut number } else { &mut street };
        match ch {
            ESCAPE => match chars.next() {
                Some(next) if next == ESCAPE || next == SEPARATOR => current.push(next),
                Some(next) => return Err(invalid(&format!("invalid escape sequence \\{next}"))),
                None => return Err(invalid("dangling escape at end of id")),
            },
            SEPARATOR if separated => return Err(invalid("more than one separator")),
            SEPARATOR => separated = true,
            other => current.push(other),
        }
    }

    if !separated {
        return Err(invalid("missing separator"));
    }
    Ok((street, number))
}
