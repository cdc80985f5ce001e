//! Centralized Constants
//!
//! Single source of truth for the sizes, limits and timing defaults used
//! throughout the iDMA driver.
//!
//! # Organization
//!
//! - **Channels**: channel count and register window stride
//! - **Descriptors**: slot size and alignment
//! - **Rings**: capacity limits per descriptor kind
//! - **Timing**: polling intervals and default watchdog settings
//!
//! Register bit definitions live in [`crate::register`], descriptor control
//! bits in the internal descriptor module.

// =============================================================================
// Channels
// =============================================================================

/// Number of hardware channels the driver can address
pub const MAX_CHANNELS: usize = 4;

/// Byte distance between consecutive channel register windows
pub const CHANNEL_REG_STRIDE: usize = 0x100;

// =============================================================================
// Descriptors
// =============================================================================

/// Size of one hardware descriptor slot in bytes
pub const DESCRIPTOR_SIZE: usize = 64;

/// Required alignment of descriptor storage in bytes
pub const DESCRIPTOR_ALIGN: usize = 64;

/// Number of address bits carried by the wide-address segment selector
pub const SEGMENT_BITS: u32 = 4;

/// Largest valid segment selector (segment 0 is local memory)
pub const MAX_SEGMENT: u8 = (1 << SEGMENT_BITS) as u8 - 1;

// =============================================================================
// Rings
// =============================================================================

/// Largest ring capacity for 1D and 2D descriptors
pub const MAX_RING_CAPACITY: usize = 256;

/// Largest ring capacity for 3D and wide descriptors
///
/// These shapes take two fetch beats per descriptor, which halves the
/// outstanding window the hardware counter can cover.
pub const MAX_RING_CAPACITY_EXTENDED: usize = 128;

/// Largest value accepted by the descriptor-increment register per write
pub const MAX_SCHEDULE_PER_WRITE: usize = 255;

// =============================================================================
// Timing
// =============================================================================

/// Default interval between status polls in `wait_all`, in microseconds
pub const DEFAULT_POLL_INTERVAL_US: u32 = 10;

/// Default watchdog timeout in prescaled ticks (0 disables the watchdog)
pub const DEFAULT_TIMEOUT_TICKS: u32 = 0;

/// Maximum watchdog timeout value (29-bit field)
pub const MAX_TIMEOUT_TICKS: u32 = (1 << 29) - 1;

/// Default number of outstanding bus requests
pub const DEFAULT_OUTSTANDING_REQUESTS: u8 = 8;

/// Maximum number of outstanding bus requests (6-bit field)
pub const MAX_OUTSTANDING_REQUESTS: u8 = 63;

/// Iterations to wait for a channel reset to self-clear
pub const RESET_TIMEOUT: u32 = 10_000;
