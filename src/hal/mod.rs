//! Hardware Abstraction Layer
//!
//! The channel driver reaches the engine, the interrupt controller and the
//! data cache only through [`IdmaHal`]. [`MmioIdma`] implements it for an
//! engine mapped at a fixed base address; host tests use a software model.
//!
//! # Delay Integration
//!
//! Blocking waits take `embedded_hal::delay::DelayNs` directly. Pass any delay
//! implementation from your HAL.

pub mod mmio;

pub use mmio::{IrqController, MmioIdma, NoIrq};

use crate::error::ConfigResult;
use crate::register::Reg;

/// Platform services the channel driver depends on.
///
/// Register accesses are per channel; `channel` is always below
/// [`MAX_CHANNELS`](crate::constants::MAX_CHANNELS).
pub trait IdmaHal {
    /// Read a channel register
    fn read_reg(&mut self, channel: usize, reg: Reg) -> u32;

    /// Write a channel register
    fn write_reg(&mut self, channel: usize, reg: Reg, value: u32);

    /// Write dirty cache lines covering `len` bytes at `ptr` back to memory.
    ///
    /// Called on descriptor slots before they are handed to the engine. The
    /// default does nothing, which is right for uncached descriptor memory.
    fn writeback_region(&mut self, ptr: *const u8, len: usize) {
        let _ = (ptr, len);
    }

    /// Discard cache lines covering `len` bytes at `ptr`.
    fn invalidate_region(&mut self, ptr: *const u8, len: usize) {
        let _ = (ptr, len);
    }

    /// Unmask an interrupt line.
    ///
    /// Returns `InterruptUnavailable` when the line cannot be routed.
    fn enable_interrupt(&mut self, line: u16) -> ConfigResult<()>;

    /// Mask an interrupt line
    fn disable_interrupt(&mut self, line: u16);

    /// Bus address the engine must use to reach `len` bytes at `ptr`.
    ///
    /// Only used for descriptor storage. The default is an identity mapping.
    fn dma_address(&mut self, ptr: *const u8, len: usize) -> u32 {
        let _ = len;
        ptr as usize as u32
    }
}

impl<H: IdmaHal + ?Sized> IdmaHal for &mut H {
    fn read_reg(&mut self, channel: usize, reg: Reg) -> u32 {
        (**self).read_reg(channel, reg)
    }

    fn write_reg(&mut self, channel: usize, reg: Reg, value: u32) {
        (**self).write_reg(channel, reg, value);
    }

    fn writeback_region(&mut self, ptr: *const u8, len: usize) {
        (**self).writeback_region(ptr, len);
    }

    fn invalidate_region(&mut self, ptr: *const u8, len: usize) {
        (**self).invalidate_region(ptr, len);
    }

    fn enable_interrupt(&mut self, line: u16) -> ConfigResult<()> {
        (**self).enable_interrupt(line)
    }

    fn disable_interrupt(&mut self, line: u16) {
        (**self).disable_interrupt(line);
    }

    fn dma_address(&mut self, ptr: *const u8, len: usize) -> u32 {
        (**self).dma_address(ptr, len)
    }
}
