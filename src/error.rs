//! Error types for the iDMA driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Descriptor construction and ring/channel setup failures
//! - [`RingError`]: Descriptor ring population and scheduling issues
//! - [`ChannelError`]: Channel state violations and wait timeouts
//! - [`TransferFault`]: Hardware-reported transfer faults
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and construction errors
///
/// Returned synchronously while building descriptors or binding storage
/// to a channel. None of these touch hardware state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Ring capacity is not a supported size, or storage is too small for it
    CapacityInvalid,
    /// Wide (36-bit) addressing requested without the `wide-address` feature
    UnsupportedAddressWidth,
    /// Descriptor shape violates an invariant (zero length, row overruns pitch, ...)
    InvalidDescriptor,
    /// Row predicate length does not match the row count
    PredicateMismatch,
    /// Channel index out of range
    InvalidChannel,
    /// Descriptor kind does not fit the ring it is added to
    KindMismatch,
    /// Interrupt line could not be enabled
    InterruptUnavailable,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::CapacityInvalid => "invalid ring capacity",
            ConfigError::UnsupportedAddressWidth => "wide addressing not supported",
            ConfigError::InvalidDescriptor => "invalid descriptor",
            ConfigError::PredicateMismatch => "row predicate length mismatch",
            ConfigError::InvalidChannel => "invalid channel",
            ConfigError::KindMismatch => "descriptor kind does not fit ring",
            ConfigError::InterruptUnavailable => "interrupt line unavailable",
        }
    }
}

// =============================================================================
// Ring Errors
// =============================================================================

/// Descriptor ring errors
///
/// These are local and recoverable: the caller may retry once slots are freed
/// or more descriptors have been added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// No free slot in the ring
    RingFull,
    /// More descriptors scheduled than were added
    ScheduleOverflow,
    /// No added-but-unscheduled descriptor to patch
    NoPendingDescriptor,
    /// No ring bound to the channel
    NotBound,
}

impl core::fmt::Display for RingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RingError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RingError::RingFull => "ring full",
            RingError::ScheduleOverflow => "schedule exceeds pending descriptors",
            RingError::NoPendingDescriptor => "no pending descriptor",
            RingError::NotBound => "no ring bound",
        }
    }
}

// =============================================================================
// Channel Errors
// =============================================================================

/// Channel state errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// A bound ring still has outstanding work
    ChannelBusy,
    /// Channel is in ERROR state and must be reset first
    Faulted,
    /// Channel has not been initialized
    NotInitialized,
    /// Operation not valid in the current state
    InvalidState,
    /// Polling wait expired before the channel drained
    Timeout,
}

impl core::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChannelError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChannelError::ChannelBusy => "channel busy",
            ChannelError::Faulted => "channel faulted, reset required",
            ChannelError::NotInitialized => "channel not initialized",
            ChannelError::InvalidState => "invalid state for operation",
            ChannelError::Timeout => "wait timed out",
        }
    }

    /// Whether this error means the channel refuses new work until the
    /// caller intervenes (drain, abort or reset).
    #[must_use]
    pub const fn is_busy_class(&self) -> bool {
        matches!(self, ChannelError::ChannelBusy | ChannelError::Faulted)
    }
}

// =============================================================================
// Transfer Faults
// =============================================================================

/// Fault class reported by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Bus error while reading the source
    SourceBus,
    /// Bus error while writing the destination
    DestinationBus,
    /// Descriptor could not be fetched
    DescriptorFetch,
    /// Descriptor contents are illegal (bad type, pitch, length)
    InvalidDescriptor,
    /// Source and destination alias where the platform forbids it
    AddressOverlap,
    /// Row predicate could not be read
    Predicate,
    /// Watchdog timeout configured at channel init expired
    Timeout,
    /// Privilege violation
    Privilege,
    /// Error bits set that this driver does not recognize
    Unknown,
}

impl FaultKind {
    /// Returns a human-readable description of the fault
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FaultKind::SourceBus => "source bus error",
            FaultKind::DestinationBus => "destination bus error",
            FaultKind::DescriptorFetch => "descriptor fetch error",
            FaultKind::InvalidDescriptor => "invalid descriptor",
            FaultKind::AddressOverlap => "source/destination overlap",
            FaultKind::Predicate => "predicate fetch error",
            FaultKind::Timeout => "watchdog timeout",
            FaultKind::Privilege => "privilege violation",
            FaultKind::Unknown => "unknown fault",
        }
    }
}

impl core::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details latched by the hardware when a transfer faults.
///
/// `src_addr`/`dst_addr` are the raw low 32 bits of the addresses being
/// transferred at fault time; the segments carry the upper 4 bits for wide
/// transfers (0 for local memory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferFault {
    /// Fault class
    pub kind: FaultKind,
    /// Raw error bits from the status register
    pub raw: u32,
    /// Ring slot index of the offending descriptor, if it lies in the bound ring
    pub desc_index: Option<usize>,
    /// Bus address of the offending descriptor
    pub desc_addr: u32,
    /// Source address at fault time
    pub src_addr: u32,
    /// Source segment at fault time
    pub src_segment: u8,
    /// Destination address at fault time
    pub dst_addr: u32,
    /// Destination segment at fault time
    pub dst_segment: u8,
}

impl core::fmt::Display for TransferFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} at desc 0x{:08x} (src 0x{:08x}, dst 0x{:08x})",
            self.kind.as_str(),
            self.desc_addr,
            self.src_addr,
            self.dst_addr
        )
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Ring(RingError::RingFull)) => { /* wait for completions */ }
///     Err(Error::Transfer(fault)) => { /* inspect fault, then reset */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Ring error
    Ring(RingError),
    /// Channel error
    Channel(ChannelError),
    /// Hardware transfer fault
    Transfer(TransferFault),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Ring(e) => write!(f, "ring: {}", e.as_str()),
            Error::Channel(e) => write!(f, "channel: {}", e.as_str()),
            Error::Transfer(e) => write!(f, "transfer: {e}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RingError> for Error {
    fn from(e: RingError) -> Self {
        Error::Ring(e)
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

impl From<TransferFault> for Error {
    fn from(e: TransferFault) -> Self {
        Error::Transfer(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for ring operations
pub type RingResult<T> = core::result::Result<T, RingError>;

// =============================================================================
// Unit Tests
// =============================================================================
