//! Power-loss-safe record store on a raw block device
//!
//! Every record id owns two consecutive blocks (slot A and slot B):
//!
//! ```text
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 4    | Magic "SEAL"                            |
//! | 4      | 2    | Record id (LE)                          |
//! | 6      | 2    | Payload length (LE)                     |
//! | 8      | 4    | Sequence number (LE)                    |
//! | 12     | 1    | State: 1 = live, 2 = tombstone          |
//! | 13     | 1    | Reserved (0)                            |
//! | 14     | 2    | RFC 1071 checksum of header + payload   |
//! | 16     | n    | Payload                                 |
//! ```
//!
//! A write always targets the slot that does not hold the newest valid
//! copy, so a torn write can only destroy the stale copy. Reads pick the
//! valid slot with the highest sequence number.

use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::{debug, error, info};

use crate::checksum::{finalize_checksum, partial_checksum};
use crate::error::{StorageError, StorageResult};
use crate::store::{RecordId, RecordStore};

/// Largest supported device block size.
pub const MAX_BLOCK_SIZE: usize = 4096;

/// Slot header size in bytes.
pub const HEADER_LEN: usize = 16;

/// Record ids provided by [`BlockRecordStore::with_defaults`].
pub const DEFAULT_RECORDS: u16 = 4;

const SLOT_MAGIC: [u8; 4] = *b"SEAL";
const STATE_LIVE: u8 = 1;
const STATE_TOMBSTONE: u8 = 2;
const CHECKSUM_OFFSET: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotHeader {
    sequence: u32,
    len: usize,
    tombstone: bool,
}

/// `a` was written after `b` (wrapping sequence comparison).
fn is_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

fn slot_checksum(block: &[u8], len: usize) -> u16 {
    let sum = partial_checksum(&block[..CHECKSUM_OFFSET], 0);
    finalize_checksum(partial_checksum(&block[HEADER_LEN..HEADER_LEN + len], sum))
}

fn parse_slot(block: &[u8], id: RecordId) -> Option<SlotHeader> {
    if block[0..4] != SLOT_MAGIC {
        return None;
    }
    if u16::from_le_bytes([block[4], block[5]]) != id {
        return None;
    }

    let len = u16::from_le_bytes([block[6], block[7]]) as usize;
    if HEADER_LEN + len > block.len() {
        return None;
    }

    let tombstone = match block[12] {
        STATE_LIVE => false,
        STATE_TOMBSTONE => true,
        _ => return None,
    };

    let stored = u16::from_be_bytes([block[CHECKSUM_OFFSET], block[CHECKSUM_OFFSET + 1]]);
    if stored != slot_checksum(block, len) {
        return None;
    }

    Some(SlotHeader {
        sequence: u32::from_le_bytes([block[8], block[9], block[10], block[11]]),
        len,
        tombstone,
    })
}

fn encode_slot(block: &mut [u8], id: RecordId, header: SlotHeader, payload: &[u8]) {
    block.fill(0);
    block[0..4].copy_from_slice(&SLOT_MAGIC);
    block[4..6].copy_from_slice(&id.to_le_bytes());
    block[6..8].copy_from_slice(&(header.len as u16).to_le_bytes());
    block[8..12].copy_from_slice(&header.sequence.to_le_bytes());
    block[12] = if header.tombstone { STATE_TOMBSTONE } else { STATE_LIVE };
    block[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);

    let checksum = slot_checksum(block, header.len);
    block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&checksum.to_be_bytes());
}

/// Record store laid out over a range of blocks of a [`BlockIo`] device.
pub struct BlockRecordStore<B> {
    device: B,
    base_lba: u64,
    records: u16,
    block_size: usize,
    mounted: bool,
}

impl<B: BlockIo> BlockRecordStore<B> {
    /// Store with `records` ids (`0..records`) starting at `base_lba`.
    pub fn new(device: B, base_lba: u64, records: u16) -> Self {
        Self {
            device,
            base_lba,
            records,
            block_size: 0,
            mounted: false,
        }
    }

    /// Store at the start of the device with [`DEFAULT_RECORDS`] ids.
    pub fn with_defaults(device: B) -> Self {
        Self::new(device, 0, DEFAULT_RECORDS)
    }

    /// Blocks occupied by a store with `records` ids.
    pub const fn blocks_required(records: u16) -> u64 {
        records as u64 * 2
    }

    pub fn device_mut(&mut self) -> &mut B {
        &mut self.device
    }

    pub fn into_inner(self) -> B {
        self.device
    }

    fn slot_lba(&self, id: RecordId, slot: usize) -> Lba {
        Lba(self.base_lba + id as u64 * 2 + slot as u64)
    }

    fn check_id(&self, id: RecordId) -> StorageResult<()> {
        if !self.mounted {
            return Err(StorageError::NotReady);
        }
        if id >= self.records {
            return Err(StorageError::UnknownRecord(id));
        }
        Ok(())
    }

    fn load_slot(
        &mut self,
        id: RecordId,
        slot: usize,
        block: &mut [u8],
    ) -> StorageResult<Option<SlotHeader>> {
        let lba = self.slot_lba(id, slot);
        self.device.read_blocks(lba, block).map_err(|e| {
            error!("block read at lba {} failed: {}", lba.0, e);
            StorageError::Device("read")
        })?;
        Ok(parse_slot(block, id))
    }

    /// Slot index and header of the newest valid copy of `id`.
    fn newest(
        &mut self,
        id: RecordId,
        block: &mut [u8],
    ) -> StorageResult<Option<(usize, SlotHeader)>> {
        let a = self.load_slot(id, 0, block)?;
        let b = self.load_slot(id, 1, block)?;

        Ok(match (a, b) {
            (Some(a), Some(b)) if is_newer(b.sequence, a.sequence) => Some((1, b)),
            (Some(a), _) => Some((0, a)),
            (None, Some(b)) => Some((1, b)),
            (None, None) => None,
        })
    }

    fn store_slot(
        &mut self,
        id: RecordId,
        payload: &[u8],
        tombstone: bool,
        block: &mut [u8],
    ) -> StorageResult<()> {
        let (slot, sequence) = match self.newest(id, block)? {
            Some((slot, header)) => (1 - slot, header.sequence.wrapping_add(1)),
            None => (0, 1),
        };

        let header = SlotHeader {
            sequence,
            len: payload.len(),
            tombstone,
        };
        encode_slot(block, id, header, payload);

        let lba = self.slot_lba(id, slot);
        self.device.write_blocks(lba, block).map_err(|e| {
            error!("block write at lba {} failed: {}", lba.0, e);
            StorageError::Device("write")
        })?;
        self.device.flush().map_err(|e| {
            error!("block flush failed: {}", e);
            StorageError::Device("flush")
        })?;

        debug!("record {} -> slot {} seq {}", id, slot, sequence);
        Ok(())
    }
}

impl<B: BlockIo> RecordStore for BlockRecordStore<B> {
    fn mount(&mut self) -> StorageResult<()> {
        let block_size = match self.device.block_size().to_usize() {
            Some(size) if (HEADER_LEN..=MAX_BLOCK_SIZE).contains(&size) => size,
            _ => {
                error!("unsupported block size");
                return Err(StorageError::Device("block size"));
            }
        };

        let blocks = self.device.num_blocks().map_err(|e| {
            error!("block count query failed: {}", e);
            StorageError::Device("num_blocks")
        })?;
        let needed = self.base_lba + Self::blocks_required(self.records);
        if blocks < needed {
            error!("record area needs {} blocks, device has {}", needed, blocks);
            return Err(StorageError::Device("device too small"));
        }

        self.block_size = block_size;
        self.mounted = true;
        info!(
            "block record store mounted: {} records at lba {}, {} byte blocks",
            self.records, self.base_lba, block_size
        );
        Ok(())
    }

    fn read(&mut self, id: RecordId, buf: &mut [u8]) -> StorageResult<Option<usize>> {
        self.check_id(id)?;
        let mut scratch = [0u8; MAX_BLOCK_SIZE];
        let block = &mut scratch[..self.block_size];

        let (slot, header) = match self.newest(id, block)? {
            Some(found) if !found.1.tombstone => found,
            _ => return Ok(None),
        };

        // `newest` left the other slot in the buffer; reload the winner
        self.load_slot(id, slot, block)?;
        let n = header.len.min(buf.len());
        buf[..n].copy_from_slice(&block[HEADER_LEN..HEADER_LEN + n]);
        Ok(Some(header.len))
    }

    fn write(&mut self, id: RecordId, data: &[u8]) -> StorageResult<()> {
        self.check_id(id)?;
        if HEADER_LEN + data.len() > self.block_size {
            return Err(StorageError::RecordTooLarge { len: data.len() });
        }

        let mut scratch = [0u8; MAX_BLOCK_SIZE];
        let block = &mut scratch[..self.block_size];
        self.store_slot(id, data, false, block)
    }

    fn delete(&mut self, id: RecordId) -> StorageResult<bool> {
        self.check_id(id)?;
        let mut scratch = [0u8; MAX_BLOCK_SIZE];
        let block = &mut scratch[..self.block_size];

        match self.newest(id, block)? {
            Some((_, header)) if !header.tombstone => {
                self.store_slot(id, &[], true, block)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{Flag, PersistentFlags};
    use crate::store::{FlagStore, FLAGS_RECORD_ID};
    use gpt_disk_types::BlockSize;
    use pretty_assertions::assert_eq;
    use std::vec;
    use std::vec::Vec;
    use thiserror::Error;

    const BS: usize = 512;

    #[derive(Debug, Clone, Copy, Error)]
    #[error("memory block device I/O error")]
    struct MemoryBlockIoError;

    /// In-memory block device with write fault injection.
    struct MemoryBlockDevice {
        data: Vec<u8>,
        /// Next write stores only this many bytes, then fails.
        tear_next_write: Option<usize>,
    }

    impl MemoryBlockDevice {
        fn new(blocks: usize) -> Self {
            Self {
                data: vec![0; blocks * BS],
                tear_next_write: None,
            }
        }
    }

    impl BlockIo for MemoryBlockDevice {
        type Error = MemoryBlockIoError;

        fn block_size(&self) -> BlockSize {
            BlockSize::BS_512
        }

        fn num_blocks(&mut self) -> Result<u64, Self::Error> {
            Ok((self.data.len() / BS) as u64)
        }

        fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
            let offset = start_lba.0 as usize * BS;
            if offset + dst.len() > self.data.len() {
                return Err(MemoryBlockIoError);
            }
            dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
            Ok(())
        }

        fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
            let offset = start_lba.0 as usize * BS;
            if offset + src.len() > self.data.len() {
                return Err(MemoryBlockIoError);
            }
            if let Some(keep) = self.tear_next_write.take() {
                self.data[offset..offset + keep].copy_from_slice(&src[..keep]);
                return Err(MemoryBlockIoError);
            }
            self.data[offset..offset + src.len()].copy_from_slice(src);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn mounted_store() -> BlockRecordStore<MemoryBlockDevice> {
        let mut store = BlockRecordStore::with_defaults(MemoryBlockDevice::new(8));
        store.mount().unwrap();
        store
    }

    #[test]
    fn test_blank_device_has_no_records() {
        let mut store = mounted_store();
        let mut buf = [0u8; 4];
        assert_eq!(store.read(1, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_write_alternates_slots() {
        let mut store = mounted_store();
        store.write(1, &[1]).unwrap();
        store.write(1, &[2]).unwrap();
        store.write(1, &[3]).unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(store.read(1, &mut buf).unwrap(), Some(1));
        assert_eq!(buf, [3]);

        // Slot A holds seq 3, slot B holds seq 2
        let dev = store.device_mut();
        assert_eq!(dev.data[2 * BS + 8], 3);
        assert_eq!(dev.data[3 * BS + 8], 2);
    }

    #[test]
    fn test_torn_write_keeps_previous_value() {
        let mut store = mounted_store();
        store.write(1, &PersistentFlags::from(Flag::Provisioned).to_le_bytes()).unwrap();

        store.device_mut().tear_next_write = Some(10);
        let torn = PersistentFlags::from(Flag::Provisioned).with(Flag::Triggered);
        assert_eq!(store.write(1, &torn.to_le_bytes()), Err(StorageError::Device("write")));

        let mut flags = FlagStore::new(&mut store);
        assert_eq!(flags.get_flags().unwrap(), PersistentFlags::from(Flag::Provisioned));
    }

    #[test]
    fn test_delete_writes_tombstone() {
        let mut store = mounted_store();
        store.write(FLAGS_RECORD_ID, &[7, 0, 0, 0]).unwrap();

        assert!(store.delete(FLAGS_RECORD_ID).unwrap());
        assert!(!store.delete(FLAGS_RECORD_ID).unwrap());

        let mut buf = [0u8; 4];
        assert_eq!(store.read(FLAGS_RECORD_ID, &mut buf).unwrap(), None);

        // Record can be written again after deletion
        store.write(FLAGS_RECORD_ID, &[1, 0, 0, 0]).unwrap();
        assert_eq!(store.read(FLAGS_RECORD_ID, &mut buf).unwrap(), Some(4));
    }

    #[test]
    fn test_corrupted_newest_slot_falls_back() {
        let mut store = mounted_store();
        store.write(1, &[0x11]).unwrap();
        store.write(1, &[0x22]).unwrap();

        // Flip a payload bit of the newest copy (slot B)
        store.device_mut().data[3 * BS + HEADER_LEN] ^= 0x01;

        let mut buf = [0u8; 1];
        store.read(1, &mut buf).unwrap();
        assert_eq!(buf, [0x11]);
    }

    #[test]
    fn test_records_survive_remount() {
        let mut store = mounted_store();
        store.write(2, b"seal").unwrap();

        let mut again = BlockRecordStore::with_defaults(store.into_inner());
        again.mount().unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(again.read(2, &mut buf).unwrap(), Some(4));
        assert_eq!(&buf, b"seal");
    }

    #[test]
    fn test_bounds_are_enforced() {
        let mut store = mounted_store();
        assert_eq!(store.write(DEFAULT_RECORDS, &[0]), Err(StorageError::UnknownRecord(4)));
        assert_eq!(
            store.write(0, &[0u8; BS]),
            Err(StorageError::RecordTooLarge { len: BS })
        );
    }

    #[test]
    fn test_mount_rejects_small_device() {
        let mut store = BlockRecordStore::with_defaults(MemoryBlockDevice::new(3));
        assert_eq!(store.mount(), Err(StorageError::Device("device too small")));
    }

    #[test]
    fn test_unmounted_store_is_not_ready() {
        let mut store = BlockRecordStore::with_defaults(MemoryBlockDevice::new(8));
        assert_eq!(store.delete(0), Err(StorageError::NotReady));
    }

    #[test]
    fn test_sequence_wraps() {
        assert!(is_newer(0, u32::MAX));
        assert!(is_newer(2, 1));
        assert!(!is_newer(1, 2));
    }
}
