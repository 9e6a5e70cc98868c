//! Persistent lifecycle flags
//!
//! The flag word is the only state that crosses a power cycle. Bits are
//! only ever added; the whole record is removed by a factory reset.

use core::fmt;

/// A single lifecycle flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Flag {
    /// Arming completed; the seal is closed and dark.
    Provisioned = 1 << 0,
    /// A tamper event was detected and must be reported.
    Triggered = 1 << 1,
    /// The report was attempted; the seal is spent.
    Terminated = 1 << 2,
}

impl Flag {
    /// All flags, lowest bit first.
    pub const ALL: [Flag; 3] = [Flag::Provisioned, Flag::Triggered, Flag::Terminated];

    /// Bit mask of this flag.
    pub const fn bit(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Provisioned => "PROVISIONED",
            Self::Triggered => "TRIGGERED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit-set of [`Flag`]s as stored on flash (4-byte little-endian `u32`).
///
/// Unknown bits are carried through untouched so that a record written by
/// newer firmware survives a read-modify-write by this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PersistentFlags(u32);

impl PersistentFlags {
    /// No flags set (also the value of a missing record).
    pub const EMPTY: Self = Self(0);

    /// Encoded size on the storage medium.
    pub const ENCODED_LEN: usize = 4;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Copy with `flag` set.
    pub const fn with(self, flag: Flag) -> Self {
        Self(self.0 | flag.bit())
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl From<Flag> for PersistentFlags {
    fn from(flag: Flag) -> Self {
        Self(flag.bit())
    }
}

impl fmt::Display for PersistentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for flag in Flag::ALL {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(flag.name())?;
                first = false;
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_flag_bits_match_storage_layout() {
        assert_eq!(Flag::Provisioned.bit(), 0x1);
        assert_eq!(Flag::Triggered.bit(), 0x2);
        assert_eq!(Flag::Terminated.bit(), 0x4);
    }

    #[test]
    fn test_insert_is_monotonic() {
        let mut flags = PersistentFlags::EMPTY;
        flags.insert(Flag::Triggered);
        flags.insert(Flag::Provisioned);
        flags.insert(Flag::Triggered);

        assert!(flags.contains(Flag::Provisioned));
        assert!(flags.contains(Flag::Triggered));
        assert!(!flags.contains(Flag::Terminated));
        assert_eq!(flags.bits(), 0x3);
    }

    #[test]
    fn test_unknown_bits_survive_encoding() {
        let flags = PersistentFlags::from_bits(0x8000_0001);
        let decoded = PersistentFlags::from_le_bytes(flags.to_le_bytes());
        assert_eq!(decoded, flags);
        assert_eq!(flags.to_le_bytes(), [0x01, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_display() {
        assert_eq!(PersistentFlags::EMPTY.to_string(), "{}");
        let flags = PersistentFlags::from(Flag::Provisioned).with(Flag::Terminated);
        assert_eq!(flags.to_string(), "{PROVISIONED|TERMINATED}");
    }
}
