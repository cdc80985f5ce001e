//! iDMA channel register map.
//!
//! Every channel owns a window of [`CHANNEL_REG_STRIDE`](crate::constants::CHANNEL_REG_STRIDE)
//! bytes; [`Reg`] names a register inside that window. Bit fields live in
//! [`channel`].
//!
//! The free functions at the bottom are raw volatile accessors used by the
//! memory-mapped HAL. Most users never call them directly.

pub mod channel;

pub use channel::ChannelRegisters;

use channel::*;

/// A register within a channel's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
    /// Channel settings (block size, outstanding requests, halt/irq enables)
    Settings,
    /// Watchdog timeout and clock prescale
    Timeout,
    /// Bus address of the next descriptor to fetch
    DescStartAdrs,
    /// Outstanding descriptor count (read-only)
    NumDesc,
    /// Add to the outstanding count (write-only doorbell)
    NumDescIncr,
    /// Enable and reset
    Control,
    /// User-mode access enable
    UserPriv,
    /// Privilege fault details (read-only)
    Privilege,
    /// Engine state, interrupt pending and error bits
    Status,
    /// Address of the descriptor being executed (read-only)
    CurrDescAdrs,
    /// Type of the descriptor being executed (read-only)
    CurrDescType,
    /// Source address in progress (read-only)
    SrcAdrs,
    /// Destination address in progress (read-only)
    DstAdrs,
    /// Source segment in progress (read-only)
    SrcAdrsHi,
    /// Destination segment in progress (read-only)
    DstAdrsHi,
}

impl Reg {
    /// Byte offset within the channel window
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Reg::Settings => SETTINGS_OFFSET,
            Reg::Timeout => TIMEOUT_OFFSET,
            Reg::DescStartAdrs => DESC_START_ADRS_OFFSET,
            Reg::NumDesc => NUM_DESC_OFFSET,
            Reg::NumDescIncr => NUM_DESC_INCR_OFFSET,
            Reg::Control => CONTROL_OFFSET,
            Reg::UserPriv => USERPRIV_OFFSET,
            Reg::Privilege => PRIVILEGE_OFFSET,
            Reg::Status => STATUS_OFFSET,
            Reg::CurrDescAdrs => CURR_DESC_ADRS_OFFSET,
            Reg::CurrDescType => CURR_DESC_TYPE_OFFSET,
            Reg::SrcAdrs => SRC_ADRS_OFFSET,
            Reg::DstAdrs => DST_ADRS_OFFSET,
            Reg::SrcAdrsHi => SRC_ADRS_HI_OFFSET,
            Reg::DstAdrsHi => DST_ADRS_HI_OFFSET,
        }
    }

    /// Whether software may write the register
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Reg::Settings
                | Reg::Timeout
                | Reg::DescStartAdrs
                | Reg::NumDescIncr
                | Reg::Control
                | Reg::UserPriv
                | Reg::Status
        )
    }
}

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Modify a register using a read-modify-write operation
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn modify_reg<F>(addr: usize, f: F)
where
    F: FnOnce(u32) -> u32,
{
    // SAFETY: caller guarantees address validity
    let value = unsafe { read_reg(addr) };
    unsafe { write_reg(addr, f(value)) }
}
