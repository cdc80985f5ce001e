//! Channel register offsets and bit fields.

use super::Reg;

// =============================================================================
// Register Offsets
// =============================================================================

/// Settings register offset
pub const SETTINGS_OFFSET: usize = 0x00;
/// Timeout register offset
pub const TIMEOUT_OFFSET: usize = 0x04;
/// Descriptor start address register offset
pub const DESC_START_ADRS_OFFSET: usize = 0x08;
/// Outstanding descriptor count register offset (read-only)
pub const NUM_DESC_OFFSET: usize = 0x0C;
/// Descriptor count increment register offset (write-only)
pub const NUM_DESC_INCR_OFFSET: usize = 0x10;
/// Control register offset
pub const CONTROL_OFFSET: usize = 0x14;
/// User privilege register offset
pub const USERPRIV_OFFSET: usize = 0x18;
/// Privilege fault register offset (read-only)
pub const PRIVILEGE_OFFSET: usize = 0x1C;
/// Status register offset
pub const STATUS_OFFSET: usize = 0x40;
/// Current descriptor address register offset (read-only)
pub const CURR_DESC_ADRS_OFFSET: usize = 0x44;
/// Current descriptor type register offset (read-only)
pub const CURR_DESC_TYPE_OFFSET: usize = 0x48;
/// Current source address register offset (read-only)
pub const SRC_ADRS_OFFSET: usize = 0x4C;
/// Current destination address register offset (read-only)
pub const DST_ADRS_OFFSET: usize = 0x50;
/// Current source segment register offset (read-only)
pub const SRC_ADRS_HI_OFFSET: usize = 0x54;
/// Current destination segment register offset (read-only)
pub const DST_ADRS_HI_OFFSET: usize = 0x58;

// =============================================================================
// Settings Register Bits
// =============================================================================

/// Maximum block size field mask (0 = 2 bytes ... 3 = 16 bytes per beat)
pub const SETTINGS_MAX_BLOCK_MASK: u32 = 0x3;
/// Outstanding bus requests shift
pub const SETTINGS_OUTSTANDING_SHIFT: u32 = 2;
/// Outstanding bus requests mask
pub const SETTINGS_OUTSTANDING_MASK: u32 = 0x3F << 2;
/// Halt when the core enters on-chip debug
pub const SETTINGS_HALT_ON_OCD: u32 = 1 << 8;
/// Raise the error interrupt on fault
pub const SETTINGS_ERR_INT_EN: u32 = 1 << 9;

// =============================================================================
// Timeout Register Bits
// =============================================================================

/// Watchdog clock prescale mask
pub const TIMEOUT_CLK_MASK: u32 = 0x7;
/// Watchdog tick count shift
pub const TIMEOUT_TICKS_SHIFT: u32 = 3;

// =============================================================================
// Control Register Bits
// =============================================================================

/// Engine enable: cleared to pause, set to run
pub const CONTROL_ENABLE: u32 = 1 << 0;
/// Channel reset, self-clearing
pub const CONTROL_RESET: u32 = 1 << 1;

// =============================================================================
// User Privilege Register Bits
// =============================================================================

/// Allow user-mode software to program the channel
pub const USERPRIV_ENABLE: u32 = 1 << 0;

// =============================================================================
// Status Register Bits
// =============================================================================

/// Engine state field mask
pub const STATUS_STATE_MASK: u32 = 0x7;
/// Engine state: idle, nothing outstanding
pub const STATUS_STATE_IDLE: u32 = 0;
/// Engine state: enabled, waiting for descriptors
pub const STATUS_STATE_STANDBY: u32 = 1;
/// Engine state: executing a descriptor
pub const STATUS_STATE_BUSY: u32 = 2;
/// Engine state: last descriptor completed
pub const STATUS_STATE_DONE: u32 = 3;
/// Engine state: paused
pub const STATUS_STATE_HALT: u32 = 4;
/// Engine state: stopped on a fault
pub const STATUS_STATE_ERROR: u32 = 5;
/// Done interrupt pending (write 1 to clear)
pub const STATUS_DONE_INT: u32 = 1 << 4;
/// Error interrupt pending (write 1 to clear)
pub const STATUS_ERR_INT: u32 = 1 << 5;
/// Error bits shift
pub const STATUS_ERR_SHIFT: u32 = 8;
/// Error bits mask
pub const STATUS_ERR_MASK: u32 = 0xFF << 8;
/// Source bus error
pub const STATUS_ERR_SRC_BUS: u32 = 1 << 8;
/// Destination bus error
pub const STATUS_ERR_DST_BUS: u32 = 1 << 9;
/// Descriptor fetch bus error
pub const STATUS_ERR_DESC_FETCH: u32 = 1 << 10;
/// Descriptor rejected as malformed
pub const STATUS_ERR_DESC_INVALID: u32 = 1 << 11;
/// Source and destination overlap
pub const STATUS_ERR_OVERLAP: u32 = 1 << 12;
/// Predicate mask fetch error
pub const STATUS_ERR_PREDICATE: u32 = 1 << 13;
/// Watchdog expired
pub const STATUS_ERR_TIMEOUT: u32 = 1 << 14;
/// Privilege violation
pub const STATUS_ERR_PRIVILEGE: u32 = 1 << 15;

/// All interrupt pending bits (for clearing)
pub const STATUS_ALL_INTERRUPTS: u32 = STATUS_DONE_INT | STATUS_ERR_INT;

// =============================================================================
// Engine State
// =============================================================================

/// Engine state as reported by the status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// Nothing outstanding
    #[default]
    Idle,
    /// Enabled, waiting for descriptors
    Standby,
    /// Executing a descriptor
    Busy,
    /// Last descriptor completed
    Done,
    /// Paused
    Halt,
    /// Stopped on a fault
    Error,
}

impl EngineState {
    /// Decode the state field of a status register value.
    ///
    /// Reserved encodings read as `Error`.
    #[must_use]
    pub const fn from_status(status: u32) -> Self {
        match status & STATUS_STATE_MASK {
            STATUS_STATE_IDLE => EngineState::Idle,
            STATUS_STATE_STANDBY => EngineState::Standby,
            STATUS_STATE_BUSY => EngineState::Busy,
            STATUS_STATE_DONE => EngineState::Done,
            STATUS_STATE_HALT => EngineState::Halt,
            _ => EngineState::Error,
        }
    }

    /// Encode into the state field
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        match self {
            EngineState::Idle => STATUS_STATE_IDLE,
            EngineState::Standby => STATUS_STATE_STANDBY,
            EngineState::Busy => STATUS_STATE_BUSY,
            EngineState::Done => STATUS_STATE_DONE,
            EngineState::Halt => STATUS_STATE_HALT,
            EngineState::Error => STATUS_STATE_ERROR,
        }
    }
}

// =============================================================================
// Saved Register State
// =============================================================================

/// Channel state captured before powering the engine down.
///
/// The descriptor start register advances as the engine fetches, so a record
/// taken while paused points at the next descriptor to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelRegisters {
    /// Settings register
    pub settings: u32,
    /// Timeout register
    pub timeout: u32,
    /// Descriptor start address
    pub desc_start: u32,
    /// Control register
    pub control: u32,
    /// User privilege register
    pub userpriv: u32,
}

impl ChannelRegisters {
    /// Registers in save and restore order.
    pub const ORDER: [Reg; 5] = [
        Reg::Settings,
        Reg::Timeout,
        Reg::DescStartAdrs,
        Reg::Control,
        Reg::UserPriv,
    ];

    /// Values paired with [`Self::ORDER`]
    #[must_use]
    pub const fn values(&self) -> [u32; 5] {
        [
            self.settings,
            self.timeout,
            self.desc_start,
            self.control,
            self.userpriv,
        ]
    }

    /// Build a record from values read in [`Self::ORDER`].
    #[must_use]
    pub const fn from_values(values: [u32; 5]) -> Self {
        Self {
            settings: values[0],
            timeout: values[1],
            desc_start: values[2],
            control: values[3],
            userpriv: values[4],
        }
    }
}
