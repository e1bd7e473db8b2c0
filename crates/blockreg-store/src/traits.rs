use crate::error::StoreResult;

/// Synchronous key-value ledger.
///
/// All implementations must satisfy these invariants:
/// - `write` is complete before it returns; a subsequent `read` of the same
///   key observes it.
/// - Writes to a single key are linearizable from the caller's point of view.
/// - Values are opaque bytes; the store never interprets them.
pub trait LedgerStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    fn read(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// List every key currently holding a value, in ascending order.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Check whether a value exists under `key`.
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.read(key)?.is_some())
    }
}
