//! Tagged DMA addresses.
//!
//! The engine addresses a 32-bit local space directly. With wide addressing a
//! 4-bit segment selector extends an address to 36 bits: segment 0 is local
//! (on-chip) memory, segments 1..=15 reach system memory above 4 GiB.

use crate::constants::{MAX_SEGMENT, SEGMENT_BITS};
use crate::error::{ConfigError, ConfigResult};

/// A DMA-visible address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaAddr {
    /// 32-bit local address (segment 0)
    Local(u32),
    /// System memory address beyond the 32-bit boundary
    System {
        /// Segment selector, 1..=15
        segment: u8,
        /// Offset within the segment
        offset: u32,
    },
}

impl DmaAddr {
    /// Build a system-memory address.
    ///
    /// Segment 0 is folded into [`DmaAddr::Local`]; segments above 15 are
    /// rejected.
    pub const fn system(segment: u8, offset: u32) -> ConfigResult<Self> {
        if segment > MAX_SEGMENT {
            return Err(ConfigError::UnsupportedAddressWidth);
        }
        if segment == 0 {
            Ok(DmaAddr::Local(offset))
        } else {
            Ok(DmaAddr::System { segment, offset })
        }
    }

    /// Decode a 36-bit wide address.
    pub const fn from_wide(addr: u64) -> ConfigResult<Self> {
        if addr >> (32 + SEGMENT_BITS) != 0 {
            return Err(ConfigError::UnsupportedAddressWidth);
        }
        Self::system((addr >> 32) as u8, addr as u32)
    }

    /// Encode as a 36-bit wide address.
    #[must_use]
    pub const fn to_wide(self) -> u64 {
        ((self.segment() as u64) << 32) | self.offset() as u64
    }

    /// Segment selector (0 for local addresses).
    #[inline(always)]
    #[must_use]
    pub const fn segment(self) -> u8 {
        match self {
            DmaAddr::Local(_) => 0,
            DmaAddr::System { segment, .. } => segment,
        }
    }

    /// Low 32 bits.
    #[inline(always)]
    #[must_use]
    pub const fn offset(self) -> u32 {
        match self {
            DmaAddr::Local(offset) | DmaAddr::System { offset, .. } => offset,
        }
    }

    /// Whether the address needs the wide-address datapath.
    #[inline(always)]
    #[must_use]
    pub const fn is_wide(self) -> bool {
        self.segment() != 0
    }

    /// Same address with a new offset, keeping the segment.
    #[must_use]
    pub const fn with_offset(self, offset: u32) -> Self {
        match self {
            DmaAddr::Local(_) => DmaAddr::Local(offset),
            DmaAddr::System { segment, .. } => DmaAddr::System { segment, offset },
        }
    }
}

impl From<u32> for DmaAddr {
    fn from(addr: u32) -> Self {
        DmaAddr::Local(addr)
    }
}

impl Default for DmaAddr {
    fn default() -> Self {
        DmaAddr::Local(0)
    }
}
