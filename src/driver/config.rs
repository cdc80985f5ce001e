//! Configuration types for iDMA channels

use crate::constants::{
    DEFAULT_OUTSTANDING_REQUESTS, DEFAULT_TIMEOUT_TICKS, MAX_OUTSTANDING_REQUESTS,
    MAX_TIMEOUT_TICKS,
};
use crate::register::channel::{
    SETTINGS_ERR_INT_EN, SETTINGS_HALT_ON_OCD, SETTINGS_MAX_BLOCK_MASK, SETTINGS_OUTSTANDING_MASK,
    SETTINGS_OUTSTANDING_SHIFT, TIMEOUT_CLK_MASK, TIMEOUT_TICKS_SHIFT, USERPRIV_ENABLE,
};

/// Largest bus beat the engine issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MaxBlock {
    /// 2 bytes per beat
    Bytes2 = 0,
    /// 4 bytes per beat
    Bytes4 = 1,
    /// 8 bytes per beat
    #[default]
    Bytes8 = 2,
    /// 16 bytes per beat
    Bytes16 = 3,
}

impl MaxBlock {
    /// Settings field value
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self as u32
    }

    /// Beat size in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        2 << (self as u8)
    }
}

/// Watchdog clock prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WatchdogPrescale {
    /// Count every cycle
    #[default]
    Div1 = 0,
    /// Count every 2 cycles
    Div2 = 1,
    /// Count every 4 cycles
    Div4 = 2,
    /// Count every 8 cycles
    Div8 = 3,
    /// Count every 16 cycles
    Div16 = 4,
    /// Count every 32 cycles
    Div32 = 5,
    /// Count every 64 cycles
    Div64 = 6,
    /// Count every 128 cycles
    Div128 = 7,
}

/// How a bound ring is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingMode {
    /// Circular: the producer cursor wraps and work can be added forever
    #[default]
    Loop,
    /// One-shot batch of exactly `capacity` descriptors
    Task,
}

/// Channel configuration
///
/// Applied by `Channel::init`. Values wider than their register fields are
/// clamped when encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Largest bus beat
    pub max_block: MaxBlock,
    /// Outstanding bus requests (1..=63)
    pub outstanding_requests: u8,
    /// Pause the engine while the core is halted in debug
    pub halt_on_debug: bool,
    /// Raise the error interrupt on fault
    pub error_interrupt: bool,
    /// Watchdog timeout in prescaled ticks (0 disables)
    pub timeout_ticks: u32,
    /// Watchdog prescaler
    pub timeout_prescale: WatchdogPrescale,
    /// Allow user-mode access to the channel
    pub user_access: bool,
    /// Interrupt line for descriptor completion
    pub done_irq: Option<u16>,
    /// Interrupt line for faults
    pub error_irq: Option<u16>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelConfig {
    /// Create a new configuration with defaults (polling, no watchdog)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_block: MaxBlock::Bytes8,
            outstanding_requests: DEFAULT_OUTSTANDING_REQUESTS,
            halt_on_debug: false,
            error_interrupt: true,
            timeout_ticks: DEFAULT_TIMEOUT_TICKS,
            timeout_prescale: WatchdogPrescale::Div1,
            user_access: false,
            done_irq: None,
            error_irq: None,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the maximum bus beat
    #[must_use]
    pub const fn with_max_block(mut self, max_block: MaxBlock) -> Self {
        self.max_block = max_block;
        self
    }

    /// Set the number of outstanding bus requests
    #[must_use]
    pub const fn with_outstanding_requests(mut self, requests: u8) -> Self {
        self.outstanding_requests = requests;
        self
    }

    /// Pause while the core is halted in debug
    #[must_use]
    pub const fn with_halt_on_debug(mut self, enabled: bool) -> Self {
        self.halt_on_debug = enabled;
        self
    }

    /// Enable or disable the error interrupt
    #[must_use]
    pub const fn with_error_interrupt(mut self, enabled: bool) -> Self {
        self.error_interrupt = enabled;
        self
    }

    /// Set the watchdog timeout
    #[must_use]
    pub const fn with_timeout(mut self, ticks: u32, prescale: WatchdogPrescale) -> Self {
        self.timeout_ticks = ticks;
        self.timeout_prescale = prescale;
        self
    }

    /// Allow user-mode access
    #[must_use]
    pub const fn with_user_access(mut self, enabled: bool) -> Self {
        self.user_access = enabled;
        self
    }

    /// Route completion interrupts to `line`
    #[must_use]
    pub const fn with_done_irq(mut self, line: u16) -> Self {
        self.done_irq = Some(line);
        self
    }

    /// Route fault interrupts to `line`
    #[must_use]
    pub const fn with_error_irq(mut self, line: u16) -> Self {
        self.error_irq = Some(line);
        self
    }

    // =========================================================================
    // Register Encoding
    // =========================================================================

    /// Settings register value
    #[must_use]
    pub const fn to_settings(&self) -> u32 {
        let requests = match self.outstanding_requests {
            0 => 1,
            n if n > MAX_OUTSTANDING_REQUESTS => MAX_OUTSTANDING_REQUESTS,
            n => n,
        };
        let mut value = (self.max_block.to_bits() & SETTINGS_MAX_BLOCK_MASK)
            | (((requests as u32) << SETTINGS_OUTSTANDING_SHIFT) & SETTINGS_OUTSTANDING_MASK);
        if self.halt_on_debug {
            value |= SETTINGS_HALT_ON_OCD;
        }
        if self.error_interrupt {
            value |= SETTINGS_ERR_INT_EN;
        }
        value
    }

    /// Timeout register value
    #[must_use]
    pub const fn to_timeout(&self) -> u32 {
        let ticks = if self.timeout_ticks > MAX_TIMEOUT_TICKS {
            MAX_TIMEOUT_TICKS
        } else {
            self.timeout_ticks
        };
        (ticks << TIMEOUT_TICKS_SHIFT) | (self.timeout_prescale as u32 & TIMEOUT_CLK_MASK)
    }

    /// User privilege register value
    #[must_use]
    pub const fn to_userpriv(&self) -> u32 {
        if self.user_access { USERPRIV_ENABLE } else { 0 }
    }
}

/// Channel lifecycle state
///
/// Pausing is tracked separately and does not change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// `init` not called yet
    #[default]
    Uninitialized,
    /// Ready, nothing in flight
    Idle,
    /// Descriptors handed to the engine and not yet observed complete
    Scheduled(usize),
    /// Engine stopped on a fault; `reset` required
    Error,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = ChannelConfig::new();

        assert_eq!(config.max_block, MaxBlock::Bytes8);
        assert_eq!(config.outstanding_requests, DEFAULT_OUTSTANDING_REQUESTS);
        assert!(config.error_interrupt);
        assert!(!config.halt_on_debug);
        assert_eq!(config.timeout_ticks, 0);
        assert_eq!(config.done_irq, None);
        assert_eq!(config, ChannelConfig::default());
    }

    #[test]
    fn config_builder_chaining() {
        let config = ChannelConfig::new()
            .with_max_block(MaxBlock::Bytes16)
            .with_outstanding_requests(16)
            .with_halt_on_debug(true)
            .with_timeout(1000, WatchdogPrescale::Div8)
            .with_user_access(true)
            .with_done_irq(3)
            .with_error_irq(4);

        assert_eq!(config.max_block, MaxBlock::Bytes16);
        assert_eq!(config.outstanding_requests, 16);
        assert!(config.halt_on_debug);
        assert_eq!(config.timeout_ticks, 1000);
        assert_eq!(config.timeout_prescale, WatchdogPrescale::Div8);
        assert!(config.user_access);
        assert_eq!(config.done_irq, Some(3));
        assert_eq!(config.error_irq, Some(4));
    }

    #[test]
    fn settings_encoding() {
        let config = ChannelConfig::new()
            .with_max_block(MaxBlock::Bytes16)
            .with_outstanding_requests(5)
            .with_halt_on_debug(true)
            .with_error_interrupt(false);
        assert_eq!(
            config.to_settings(),
            3 | (5 << SETTINGS_OUTSTANDING_SHIFT) | SETTINGS_HALT_ON_OCD
        );
    }

    #[test]
    fn settings_clamp_outstanding_requests() {
        let high = ChannelConfig::new().with_outstanding_requests(200);
        let zero = ChannelConfig::new().with_outstanding_requests(0);
        assert_eq!(
            (high.to_settings() & SETTINGS_OUTSTANDING_MASK) >> SETTINGS_OUTSTANDING_SHIFT,
            u32::from(MAX_OUTSTANDING_REQUESTS)
        );
        assert_eq!(
            (zero.to_settings() & SETTINGS_OUTSTANDING_MASK) >> SETTINGS_OUTSTANDING_SHIFT,
            1
        );
    }

    #[test]
    fn timeout_encoding() {
        let config = ChannelConfig::new().with_timeout(100, WatchdogPrescale::Div4);
        assert_eq!(config.to_timeout(), (100 << 3) | 2);

        let clamped = ChannelConfig::new().with_timeout(u32::MAX, WatchdogPrescale::Div1);
        assert_eq!(clamped.to_timeout() >> TIMEOUT_TICKS_SHIFT, MAX_TIMEOUT_TICKS);
    }

    #[test]
    fn userpriv_encoding() {
        assert_eq!(ChannelConfig::new().to_userpriv(), 0);
        assert_eq!(
            ChannelConfig::new().with_user_access(true).to_userpriv(),
            USERPRIV_ENABLE
        );
    }

    #[test]
    fn max_block_sizes() {
        assert_eq!(MaxBlock::Bytes2.bytes(), 2);
        assert_eq!(MaxBlock::Bytes16.bytes(), 16);
    }

    #[test]
    fn defaults() {
        assert_eq!(ChannelState::default(), ChannelState::Uninitialized);
        assert_eq!(RingMode::default(), RingMode::Loop);
    }
}
