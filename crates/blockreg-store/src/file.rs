use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::LedgerStore;

/// A single key/value put, as appended to the log.
///
/// On-disk format:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized LogRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct LogRecord {
    key: String,
    value: Vec<u8>,
}

/// Flush/sync strategy for appended records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every write.
    #[default]
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    OsDefault,
}

/// Configuration for [`FileLedgerStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Sync strategy applied on every write.
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct LogState {
    writer: BufWriter<File>,
    /// Current end of the log file.
    offset: u64,
    /// Latest value per key, rebuilt from the log on open.
    entries: BTreeMap<String, Vec<u8>>,
    /// A failed append could not be rolled back; the tail is untrusted.
    broken: bool,
}

impl LogState {
    fn append(&mut self, frame: &[u8], sync_mode: SyncMode) -> io::Result<()> {
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        if sync_mode == SyncMode::EveryWrite {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Discard buffered bytes and cut the file back to the last complete
    /// record, so the next append starts on a frame boundary.
    fn rollback(&mut self) -> io::Result<()> {
        let file = self.writer.get_ref().try_clone()?;
        file.set_len(self.offset)?;
        let stale = std::mem::replace(&mut self.writer, BufWriter::new(file));
        // into_parts hands back the handle without flushing the junk.
        let (_file, _unflushed) = stale.into_parts();
        Ok(())
    }
}

/// Outcome of replaying a log file from the start.
struct Replay {
    entries: BTreeMap<String, Vec<u8>>,
    /// Byte length of the prefix made of complete records.
    valid_len: u64,
    records: usize,
}

/// Durable ledger store backed by an append-only record log.
///
/// Every write appends a CRC-framed record; nothing is rewritten in place.
/// Opening the file replays all records front to back so the last value
/// written under each key wins. Records failing their CRC are skipped, and a
/// torn tail left by a crash mid-append is cut off so later appends stay
/// readable. A failed append is rolled back the same way before the error is
/// returned; if that rollback fails too, every later write is rejected.
pub struct FileLedgerStore {
    path: PathBuf,
    state: Mutex<LogState>,
    config: LogConfig,
}

impl FileLedgerStore {
    /// Open (or create) a ledger log at the given path.
    pub fn open(path: &Path, config: LogConfig) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let file_len = file.metadata()?.len();

        let replay = replay(path, file_len)?;
        if replay.valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len = replay.valid_len,
                file_len,
                "discarding torn tail of ledger log"
            );
            file.set_len(replay.valid_len)?;
        }

        debug!(
            path = %path.display(),
            records = replay.records,
            keys = replay.entries.len(),
            "ledger log opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(LogState {
                writer: BufWriter::new(file),
                offset: replay.valid_len,
                entries: replay.entries,
                broken: false,
            }),
            config,
        })
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the log in bytes.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self.lock()?.offset)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, LogState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl LedgerStore for FileLedgerStore {
    fn read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let record = LogRecord {
            key: key.to_string(),
            value: value.to_vec(),
        };
        let payload =
            bincode::serialize(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len()).map_err(|_| StoreError::WriteRejected {
            key: key.to_string(),
            reason: format!("record of {} bytes exceeds the log frame limit", payload.len()),
        })?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut state = self.lock()?;
        if state.broken {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "ledger log tail is unrecoverable after a failed append".into(),
            });
        }
        if let Err(e) = state.append(&frame, self.config.sync_mode) {
            warn!(key, offset = state.offset, error = %e, "append failed; rolling back");
            if let Err(rollback) = state.rollback() {
                warn!(path = %self.path.display(), error = %rollback, "rollback failed; rejecting further writes");
                state.broken = true;
            }
            return Err(e.into());
        }

        let entry_offset = state.offset;
        state.offset += frame.len() as u64;
        state.entries.insert(record.key, record.value);

        debug!(key, offset = entry_offset, len = payload.len(), "ledger append");
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.entries.keys().cloned().collect())
    }
}

impl std::fmt::Debug for FileLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLedgerStore")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish()
    }
}

/// Read the log front to back, keeping the last value written per key.
fn replay(path: &Path, file_len: u64) -> StoreResult<Replay> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut entries = BTreeMap::new();
    let mut offset: u64 = 0;
    let mut records = 0;

    while offset + HEADER_SIZE as u64 <= file_len {
        let mut header = [0u8; HEADER_SIZE];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
            warn!(offset, length, file_len, "invalid record length; stopping replay");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated record; stopping replay");
                break;
            }
            Err(e) => return Err(e.into()),
        }
        offset += HEADER_SIZE as u64 + length as u64;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping record"
            );
            continue;
        }

        match bincode::deserialize::<LogRecord>(&payload) {
            Ok(record) => {
                entries.insert(record.key, record.value);
                records += 1;
            }
            Err(e) => {
                warn!(offset, error = %e, "failed to decode record; skipping");
            }
        }
    }

    Ok(Replay {
        entries,
        valid_len: offset,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom};

    fn open(path: &Path) -> FileLedgerStore {
        FileLedgerStore::open(path, LogConfig::default()).unwrap()
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir.path().join("ledger.log"));

        store.write("Elm St#12", b"block").unwrap();
        assert_eq!(store.read("Elm St#12").unwrap().unwrap(), b"block");
        assert!(store.read("missing").unwrap().is_none());
    }

    #[test]
    fn reopen_restores_latest_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");

        {
            let store = open(&path);
            store.write("blocksIdCache", b"{}").unwrap();
            store.write("Oak#7", b"v1").unwrap();
            store.write("Oak#7", b"v2").unwrap();
        }

        let store = open(&path);
        assert_eq!(store.read("Oak#7").unwrap().unwrap(), b"v2");
        assert_eq!(store.read("blocksIdCache").unwrap().unwrap(), b"{}");
        assert_eq!(store.keys().unwrap(), vec!["Oak#7", "blocksIdCache"]);
    }

    #[test]
    fn open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("ledger.log");
        let store = open(&path);
        store.write("k", b"v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn offset_grows_with_each_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir.path().join("ledger.log"));

        assert_eq!(store.offset().unwrap(), 0);
        store.write("a", b"1").unwrap();
        let first = store.offset().unwrap();
        store.write("b", b"2").unwrap();
        assert!(first > 0);
        assert!(store.offset().unwrap() > first);
    }

    #[test]
    fn crc_mismatch_skips_only_damaged_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");

        {
            let store = open(&path);
            store.write("first", b"1").unwrap();
            store.write("second", b"2").unwrap();
        }

        {
            let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(HEADER_SIZE as u64)).unwrap();
            let mut buf = [0u8; 1];
            file.read_exact(&mut buf).unwrap();
            buf[0] ^= 0xFF;
            file.seek(SeekFrom::Start(HEADER_SIZE as u64)).unwrap();
            file.write_all(&buf).unwrap();
            file.sync_all().unwrap();
        }

        let store = open(&path);
        assert!(store.read("first").unwrap().is_none());
        assert_eq!(store.read("second").unwrap().unwrap(), b"2");
    }

    #[test]
    fn torn_tail_is_discarded_and_later_writes_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");

        let total_len = {
            let store = open(&path);
            store.write("kept", b"yes").unwrap();
            store.write("torn", b"partial").unwrap();
            store.offset().unwrap()
        };

        {
            let file = OpenOptions::new().write(true).open(&path).unwrap();
            file.set_len(total_len - 3).unwrap();
        }

        {
            let store = open(&path);
            assert_eq!(store.read("kept").unwrap().unwrap(), b"yes");
            assert!(store.read("torn").unwrap().is_none());
            store.write("after", b"crash").unwrap();
        }

        let store = open(&path);
        assert_eq!(store.read("kept").unwrap().unwrap(), b"yes");
        assert_eq!(store.read("after").unwrap().unwrap(), b"crash");
    }

    #[test]
    fn rollback_discards_partial_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");

        {
            let store = open(&path);
            store.write("before", b"1").unwrap();
            {
                let mut state = store.lock().unwrap();
                // Half a frame reaches the file and more sits in the buffer.
                state.writer.write_all(&[0xAB; 5]).unwrap();
                state.writer.flush().unwrap();
                state.writer.write_all(&[0xCD; 3]).unwrap();
                state.rollback().unwrap();
            }
            assert_eq!(fs::metadata(&path).unwrap().len(), store.offset().unwrap());
            store.write("after", b"2").unwrap();
        }

        let store = open(&path);
        assert_eq!(store.read("before").unwrap().unwrap(), b"1");
        assert_eq!(store.read("after").unwrap().unwrap(), b"2");
        assert_eq!(fs::metadata(&path).unwrap().len(), store.offset().unwrap());
    }

    #[test]
    fn broken_log_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir.path().join("ledger.log"));
        store.lock().unwrap().broken = true;

        let err = store.write("k", b"v").unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { key, .. } if key == "k"));
        assert!(store.read("k").unwrap().is_none());
    }

    #[test]
    fn os_default_sync_mode_still_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");
        let config = LogConfig {
            sync_mode: SyncMode::OsDefault,
        };

        {
            let store = FileLedgerStore::open(&path, config.clone()).unwrap();
            store.write("k", b"v").unwrap();
        }

        let store = FileLedgerStore::open(&path, config).unwrap();
        assert_eq!(store.read("k").unwrap().unwrap(), b"v");
    }
}
