//! Seal Persistence Layer
//!
//! Everything the seal remembers across a reboot lives here.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Persistence Layer                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │  │  FlagStore   │   │ RecordStore  │   │ RetentionRegister│   │
//! │  │              │──▶│  (port)      │   │  (port)          │   │
//! │  │ get/set/reset│   │  RAM, block  │   │  double reset    │   │
//! │  └──────────────┘   └──────────────┘   └──────────────────┘   │
//! │   survives power loss                   survives warm reset   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Flags are monotonic: bits are only ever added, and the only way back
//! is [`FlagStore::reset`], which removes the record.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod block;
pub mod checksum;
pub mod error;
pub mod flags;
pub mod ram;
pub mod retention;
pub mod store;

pub use block::BlockRecordStore;
pub use error::{StorageError, StorageResult};
pub use flags::{Flag, PersistentFlags};
pub use ram::{RamRecordStore, RamRetentionRegister};
pub use retention::{check_boot, disarm, BootKind, ResetWindow, RetentionRegister, DOUBLE_RESET_MAGIC};
pub use store::{FlagStore, RecordId, RecordStore, FLAGS_RECORD_ID};
