//! Record stores and the durable flag store
//!
//! A [`RecordStore`] is the raw key-value engine (NVS on the target, a
//! RAM table or a block device elsewhere). [`FlagStore`] layers the
//! lifecycle flag record on top of it.

use log::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::flags::{Flag, PersistentFlags};

/// Identifier of a record in a [`RecordStore`].
pub type RecordId = u16;

/// Record holding the lifecycle flag word.
pub const FLAGS_RECORD_ID: RecordId = 1;

/// Durable key-value storage engine.
///
/// Implementations must make `write` and `delete` atomic with respect to
/// power loss: after an interrupted call a later `read` returns either the
/// old or the new value, never a torn one.
pub trait RecordStore {
    /// Prepare the store for use. Called once per boot.
    fn mount(&mut self) -> StorageResult<()>;

    /// Read record `id` into `buf`.
    ///
    /// Returns the stored length, or `None` if the record does not exist.
    /// At most `buf.len()` bytes are copied when the record is longer.
    fn read(&mut self, id: RecordId, buf: &mut [u8]) -> StorageResult<Option<usize>>;

    /// Replace record `id` with `data`.
    fn write(&mut self, id: RecordId, data: &[u8]) -> StorageResult<()>;

    /// Remove record `id`. Returns whether it existed.
    fn delete(&mut self, id: RecordId) -> StorageResult<bool>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn mount(&mut self) -> StorageResult<()> {
        (**self).mount()
    }

    fn read(&mut self, id: RecordId, buf: &mut [u8]) -> StorageResult<Option<usize>> {
        (**self).read(id, buf)
    }

    fn write(&mut self, id: RecordId, data: &[u8]) -> StorageResult<()> {
        (**self).write(id, data)
    }

    fn delete(&mut self, id: RecordId) -> StorageResult<bool> {
        (**self).delete(id)
    }
}

/// Durable flag store: the single source of truth for "where was I".
#[derive(Debug)]
pub struct FlagStore<S> {
    store: S,
}

impl<S: RecordStore> FlagStore<S> {
    /// Wrap an already mounted store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mount `store` and wrap it.
    pub fn open(mut store: S) -> StorageResult<Self> {
        store.mount()?;
        Ok(Self { store })
    }

    /// Current flag set. A record that was never written reads as empty.
    pub fn get_flags(&mut self) -> StorageResult<PersistentFlags> {
        let mut raw = [0u8; PersistentFlags::ENCODED_LEN];
        match self.store.read(FLAGS_RECORD_ID, &mut raw)? {
            None => Ok(PersistentFlags::EMPTY),
            Some(len) if len == PersistentFlags::ENCODED_LEN => {
                Ok(PersistentFlags::from_le_bytes(raw))
            }
            Some(found) => Err(StorageError::RecordSize {
                expected: PersistentFlags::ENCODED_LEN,
                found,
            }),
        }
    }

    /// OR `flag` into the stored set and persist it.
    ///
    /// Returns the resulting set. If the read fails nothing is written, so
    /// the previously persisted value stays intact.
    pub fn set_flag(&mut self, flag: Flag) -> StorageResult<PersistentFlags> {
        let current = self.get_flags()?;
        if current.contains(flag) {
            debug!("flag {} already persisted", flag);
            return Ok(current);
        }

        let updated = current.with(flag);
        self.store.write(FLAGS_RECORD_ID, &updated.to_le_bytes())?;
        info!("persisted flag {} -> {}", flag, updated);
        Ok(updated)
    }

    /// Delete the flag record (factory reset). Deleting nothing succeeds.
    pub fn reset(&mut self) -> StorageResult<()> {
        if self.store.delete(FLAGS_RECORD_ID)? {
            info!("*** storage factory reset ***");
        } else {
            warn!("reset requested but storage was empty");
        }
        Ok(())
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
