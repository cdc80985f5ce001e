//! Memory-mapped engine access.

use super::IdmaHal;
use crate::constants::CHANNEL_REG_STRIDE;
use crate::error::{ConfigError, ConfigResult};
use crate::register::{Reg, read_reg, write_reg};

/// Interrupt controller hooks used by [`MmioIdma`].
pub trait IrqController {
    /// Unmask `line`. Returns `false` if the line does not exist or cannot be
    /// routed to this core.
    fn enable(&mut self, line: u16) -> bool;

    /// Mask `line`
    fn disable(&mut self, line: u16);
}

/// Interrupt controller stand-in for polling-only systems.
///
/// Every line is reported unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIrq;

impl IrqController for NoIrq {
    fn enable(&mut self, _line: u16) -> bool {
        false
    }

    fn disable(&mut self, _line: u16) {}
}

/// Engine registers at a fixed physical address.
///
/// Channel `n`'s window starts at `base + n * CHANNEL_REG_STRIDE`. Cache
/// maintenance is a no-op; wrap this type if descriptor memory is cached.
#[derive(Debug)]
pub struct MmioIdma<I: IrqController> {
    base: usize,
    irq: I,
}

impl<I: IrqController> MmioIdma<I> {
    /// Create an accessor for the engine at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of the engine's register block, mapped for
    /// device access, and no other code may drive the same channels.
    pub const unsafe fn new(base: usize, irq: I) -> Self {
        Self { base, irq }
    }

    /// Register block base address
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Address of `reg` for `channel`
    #[inline(always)]
    pub const fn reg_addr(&self, channel: usize, reg: Reg) -> usize {
        self.base + channel * CHANNEL_REG_STRIDE + reg.offset()
    }

    /// Borrow the interrupt controller
    pub fn irq_mut(&mut self) -> &mut I {
        &mut self.irq
    }
}

impl<I: IrqController> IdmaHal for MmioIdma<I> {
    fn read_reg(&mut self, channel: usize, reg: Reg) -> u32 {
        // SAFETY: the constructor contract guarantees the window is mapped.
        unsafe { read_reg(self.reg_addr(channel, reg)) }
    }

    fn write_reg(&mut self, channel: usize, reg: Reg, value: u32) {
        // SAFETY: as above.
        unsafe { write_reg(self.reg_addr(channel, reg), value) }
    }

    fn enable_interrupt(&mut self, line: u16) -> ConfigResult<()> {
        if self.irq.enable(line) {
            Ok(())
        } else {
            Err(ConfigError::InterruptUnavailable)
        }
    }

    fn disable_interrupt(&mut self, line: u16) {
        self.irq.disable(line);
    }
}
