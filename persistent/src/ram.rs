//! RAM-backed stores for host simulation and bench bring-up
//!
//! Both types are const-constructible so they can live in a `static` and
//! outlive a simulated reboot, which is exactly what a test of the
//! power-loss recovery path needs.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use spin::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::retention::RetentionRegister;
use crate::store::{RecordId, RecordStore};

/// Number of records a [`RamRecordStore`] can hold.
pub const RAM_SLOTS: usize = 8;

/// Maximum payload of a single RAM record.
pub const RAM_RECORD_CAPACITY: usize = 32;

#[derive(Clone, Copy)]
struct Slot {
    used: bool,
    id: RecordId,
    len: usize,
    data: [u8; RAM_RECORD_CAPACITY],
}

const EMPTY_SLOT: Slot = Slot {
    used: false,
    id: 0,
    len: 0,
    data: [0; RAM_RECORD_CAPACITY],
};

/// In-memory record store with fault injection.
pub struct RamRecordStore {
    slots: Mutex<[Slot; RAM_SLOTS]>,
    mounted: AtomicBool,
    fail_mount: AtomicBool,
    fail_next_write: AtomicBool,
    writes: AtomicU32,
}

impl RamRecordStore {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new([EMPTY_SLOT; RAM_SLOTS]),
            mounted: AtomicBool::new(false),
            fail_mount: AtomicBool::new(false),
            fail_next_write: AtomicBool::new(false),
            writes: AtomicU32::new(0),
        }
    }

    /// Make every subsequent `mount` fail with `NotReady`.
    pub fn set_fail_mount(&self, fail: bool) {
        self.fail_mount.store(fail, Ordering::SeqCst);
    }

    /// Make the next `write` or `delete` fail without touching the data,
    /// as a power cut between read and write would.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Number of successful writes since construction.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().iter().all(|slot| !slot.used)
    }

    /// Drop the mounted state, as a reboot does.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn check_mounted(&self) -> StorageResult<()> {
        if self.mounted.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::NotReady)
        }
    }

    fn take_injected_fault(&self) -> StorageResult<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            Err(StorageError::Io)
        } else {
            Ok(())
        }
    }

    fn mount_shared(&self) -> StorageResult<()> {
        if self.fail_mount.load(Ordering::SeqCst) {
            return Err(StorageError::NotReady);
        }
        self.mounted.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn read_shared(&self, id: RecordId, buf: &mut [u8]) -> StorageResult<Option<usize>> {
        self.check_mounted()?;
        let slots = self.slots.lock();
        Ok(slots.iter().find(|slot| slot.used && slot.id == id).map(|slot| {
            let n = slot.len.min(buf.len());
            buf[..n].copy_from_slice(&slot.data[..n]);
            slot.len
        }))
    }

    fn write_shared(&self, id: RecordId, data: &[u8]) -> StorageResult<()> {
        self.check_mounted()?;
        if data.len() > RAM_RECORD_CAPACITY {
            return Err(StorageError::RecordTooLarge { len: data.len() });
        }
        self.take_injected_fault()?;

        let mut slots = self.slots.lock();
        let index = match slots.iter().position(|slot| slot.used && slot.id == id) {
            Some(index) => index,
            None => slots
                .iter()
                .position(|slot| !slot.used)
                .ok_or(StorageError::Full)?,
        };

        let mut slot = EMPTY_SLOT;
        slot.used = true;
        slot.id = id;
        slot.len = data.len();
        slot.data[..data.len()].copy_from_slice(data);
        slots[index] = slot;

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_shared(&self, id: RecordId) -> StorageResult<bool> {
        self.check_mounted()?;
        self.take_injected_fault()?;

        let mut slots = self.slots.lock();
        match slots.iter_mut().find(|slot| slot.used && slot.id == id) {
            Some(slot) => {
                *slot = EMPTY_SLOT;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for RamRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for RamRecordStore {
    fn mount(&mut self) -> StorageResult<()> {
        self.mount_shared()
    }

    fn read(&mut self, id: RecordId, buf: &mut [u8]) -> StorageResult<Option<usize>> {
        self.read_shared(id, buf)
    }

    fn write(&mut self, id: RecordId, data: &[u8]) -> StorageResult<()> {
        self.write_shared(id, data)
    }

    fn delete(&mut self, id: RecordId) -> StorageResult<bool> {
        self.delete_shared(id)
    }
}

impl RecordStore for &RamRecordStore {
    fn mount(&mut self) -> StorageResult<()> {
        self.mount_shared()
    }

    fn read(&mut self, id: RecordId, buf: &mut [u8]) -> StorageResult<Option<usize>> {
        self.read_shared(id, buf)
    }

    fn write(&mut self, id: RecordId, data: &[u8]) -> StorageResult<()> {
        self.write_shared(id, data)
    }

    fn delete(&mut self, id: RecordId) -> StorageResult<bool> {
        self.delete_shared(id)
    }
}

/// Retention byte that survives a simulated warm reset.
///
/// Dropping the value (or calling [`power_loss`](Self::power_loss)) models
/// a true power cycle.
#[derive(Debug)]
pub struct RamRetentionRegister(AtomicU8);

impl RamRetentionRegister {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub const fn with_value(value: u8) -> Self {
        Self(AtomicU8::new(value))
    }

    pub fn value(&self) -> u8 {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the register the way losing supply voltage does.
    pub fn power_loss(&self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

impl Default for RamRetentionRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl RetentionRegister for RamRetentionRegister {
    fn read(&mut self) -> u8 {
        self.value()
    }

    fn write(&mut self, value: u8) {
        self.0.store(value, Ordering::SeqCst);
    }
}

impl RetentionRegister for &RamRetentionRegister {
    fn read(&mut self) -> u8 {
        self.value()
    }

    fn write(&mut self, value: u8) {
        self.0.store(value, Ordering::SeqCst);
    }
}
