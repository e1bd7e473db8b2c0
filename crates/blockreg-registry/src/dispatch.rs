//! Mapping from operation names and positional arguments to typed invocations.
//!
//! Dispatch is stateless: [`Invocation::parse`] either yields a fully typed
//! request or an error, and nothing touches the ledger until it succeeds.
//! Arities are minimums; trailing extra arguments are ignored.

use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, Result};

/// A named registry operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateBlock,
    RegisterRenter,
    QueryRenter,
    BlocksCount,
    RentersCount,
    FindEmptyBlock,
    RepairIndex,
}

impl Operation {
    /// Every operation, in the order they are listed to users.
    pub const ALL: [Operation; 7] = [
        Operation::CreateBlock,
        Operation::RegisterRenter,
        Operation::QueryRenter,
        Operation::BlocksCount,
        Operation::RentersCount,
        Operation::FindEmptyBlock,
        Operation::RepairIndex,
    ];

    /// Canonical invocation name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateBlock => "newBlock",
            Operation::RegisterRenter => "registerRenter",
            Operation::QueryRenter => "queryRenter",
            Operation::BlocksCount => "blocksCount",
            Operation::RentersCount => "rentersCount",
            Operation::FindEmptyBlock => "findEmptyBlock",
            Operation::RepairIndex => "repairIndex",
        }
    }

    /// Minimum number of positional arguments.
    pub fn arity(self) -> usize {
        match self {
            Operation::CreateBlock => 3,
            Operation::RegisterRenter => 4,
            Operation::QueryRenter => 3,
            Operation::BlocksCount => 0,
            Operation::RentersCount => 2,
            Operation::FindEmptyBlock => 0,
            Operation::RepairIndex => 0,
        }
    }

    /// Positional argument names, for usage listings.
    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Operation::CreateBlock => &["street", "number", "nOfRooms"],
            Operation::RegisterRenter => &["street", "number", "name", "surname"],
            Operation::QueryRenter => &["street", "number", "name"],
            Operation::RentersCount => &["street", "number"],
            Operation::BlocksCount | Operation::FindEmptyBlock | Operation::RepairIndex => &[],
        }
    }

    /// Returns `true` if the operation can modify the ledger.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::CreateBlock | Operation::RegisterRenter | Operation::RepairIndex
        )
    }
}

impl FromStr for Operation {
    type Err = RegistryError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "newBlock" | "createBlock" => Ok(Operation::CreateBlock),
            "registerRenter" => Ok(Operation::RegisterRenter),
            "queryRenter" => Ok(Operation::QueryRenter),
            "blocksCount" => Ok(Operation::BlocksCount),
            "rentersCount" => Ok(Operation::RentersCount),
            "findEmptyBlock" => Ok(Operation::FindEmptyBlock),
            "repairIndex" => Ok(Operation::RepairIndex),
            other => Err(RegistryError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated request, ready to run against a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    CreateBlock {
        street: String,
        number: String,
        n_of_rooms: String,
    },
    RegisterRenter {
        street: String,
        number: String,
        name: String,
        surname: String,
    },
    QueryRenter {
        street: String,
        number: String,
        name: String,
    },
    BlocksCount,
    RentersCount {
        street: String,
        number: String,
    },
    FindEmptyBlock,
    RepairIndex,
}

impl Invocation {
    /// Resolve `name` and check `args` against the operation's arity.
    pub fn parse<A: AsRef<str>>(name: &str, args: &[A]) -> Result<Self> {
        let operation: Operation = name.parse()?;
        if args.len() < operation.arity() {
            return Err(RegistryError::ArgumentCount {
                operation: operation.name().to_string(),
                required: operation.arity(),
                supplied: args.len(),
            });
        }

        let arg = |i: usize| args[i].as_ref().to_string();
        Ok(match operation {
            Operation::CreateBlock => Invocation::CreateBlock {
                street: arg(0),
                number: arg(1),
                n_of_rooms: arg(2),
            },
            Operation::RegisterRenter => Invocation::RegisterRenter {
                street: arg(0),
                number: arg(1),
                name: arg(2),
                surname: arg(3),
            },
            Operation::QueryRenter => Invocation::QueryRenter {
                street: arg(0),
                number: arg(1),
                name: arg(2),
            },
            Operation::BlocksCount => Invocation::BlocksCount,
            Operation::RentersCount => Invocation::RentersCount {
                street: arg(0),
                number: arg(1),
            },
            Operation::FindEmptyBlock => Invocation::FindEmptyBlock,
            Operation::RepairIndex => Invocation::RepairIndex,
        })
    }

    /// The operation this invocation runs.
    pub fn operation(&self) -> Operation {
        match self {
            Invocation::CreateBlock { .. } => Operation::CreateBlock,
            Invocation::RegisterRenter { .. } => Operation::RegisterRenter,
            Invocation::QueryRenter { .. } => Operation::QueryRenter,
            Invocation::BlocksCount => Operation::BlocksCount,
            Invocation::RentersCount { .. } => Operation::RentersCount,
            Invocation::FindEmptyBlock => Operation::FindEmptyBlock,
            Invocation::RepairIndex => Operation::RepairIndex,
        }
    }
}
