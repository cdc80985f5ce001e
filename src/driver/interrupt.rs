//! Interrupt status handling and completion events.
//!
//! [`InterruptStatus`] parses a channel status register value.
//! [`ChannelEvent`] is what a [`CompletionHandler`] receives from
//! `Channel::on_interrupt`.

use crate::error::{FaultKind, TransferFault};
use crate::register::channel::{
    EngineState, STATUS_DONE_INT, STATUS_ERR_DESC_FETCH, STATUS_ERR_DESC_INVALID,
    STATUS_ERR_DST_BUS, STATUS_ERR_INT, STATUS_ERR_MASK, STATUS_ERR_OVERLAP,
    STATUS_ERR_PREDICATE, STATUS_ERR_PRIVILEGE, STATUS_ERR_SRC_BUS, STATUS_ERR_TIMEOUT,
};

// =============================================================================
// Interrupt Status
// =============================================================================

/// Interrupt and state flags parsed from a channel status register.
///
/// # Example
///
/// ```ignore
/// let status = InterruptStatus::from_raw(raw);
/// if status.has_error() {
///     let kind = status.fault_kind();
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// Done interrupt pending
    pub done: bool,
    /// Error interrupt pending
    pub error: bool,
    /// Latched error bits (status register bits 15:8)
    pub error_bits: u32,
    /// Engine state
    pub state: EngineState,
}

impl InterruptStatus {
    /// Create from a raw status register value
    #[inline]
    pub fn from_raw(status: u32) -> Self {
        Self {
            done: status & STATUS_DONE_INT != 0,
            error: status & STATUS_ERR_INT != 0,
            error_bits: status & STATUS_ERR_MASK,
            state: EngineState::from_status(status),
        }
    }

    /// Pending bits to write back for acknowledgement (write-1-to-clear)
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.done {
            val |= STATUS_DONE_INT;
        }
        if self.error {
            val |= STATUS_ERR_INT;
        }
        val
    }

    /// Check if any interrupt is pending
    #[inline]
    pub fn any(&self) -> bool {
        self.done || self.error
    }

    /// Check if the engine reports a fault
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error || self.error_bits != 0 || self.state == EngineState::Error
    }

    /// Decode the fault class
    #[inline]
    pub fn fault_kind(&self) -> FaultKind {
        fault_kind_from_bits(self.error_bits)
    }
}

/// Decode status error bits into a fault class.
///
/// When several bits are set the one closest to descriptor fetch wins.
pub fn fault_kind_from_bits(bits: u32) -> FaultKind {
    const PRIORITY: [(u32, FaultKind); 8] = [
        (STATUS_ERR_DESC_FETCH, FaultKind::DescriptorFetch),
        (STATUS_ERR_DESC_INVALID, FaultKind::InvalidDescriptor),
        (STATUS_ERR_PRIVILEGE, FaultKind::Privilege),
        (STATUS_ERR_PREDICATE, FaultKind::Predicate),
        (STATUS_ERR_OVERLAP, FaultKind::AddressOverlap),
        (STATUS_ERR_SRC_BUS, FaultKind::SourceBus),
        (STATUS_ERR_DST_BUS, FaultKind::DestinationBus),
        (STATUS_ERR_TIMEOUT, FaultKind::Timeout),
    ];
    PRIORITY
        .iter()
        .find(|(bit, _)| bits & bit != 0)
        .map_or(FaultKind::Unknown, |&(_, kind)| kind)
}

/// Status error bit for a fault class (0 for `Unknown`).
pub const fn fault_kind_to_bits(kind: FaultKind) -> u32 {
    match kind {
        FaultKind::SourceBus => STATUS_ERR_SRC_BUS,
        FaultKind::DestinationBus => STATUS_ERR_DST_BUS,
        FaultKind::DescriptorFetch => STATUS_ERR_DESC_FETCH,
        FaultKind::InvalidDescriptor => STATUS_ERR_DESC_INVALID,
        FaultKind::AddressOverlap => STATUS_ERR_OVERLAP,
        FaultKind::Predicate => STATUS_ERR_PREDICATE,
        FaultKind::Timeout => STATUS_ERR_TIMEOUT,
        FaultKind::Privilege => STATUS_ERR_PRIVILEGE,
        FaultKind::Unknown => 0,
    }
}

// =============================================================================
// Completion Events
// =============================================================================

/// Event delivered to a [`CompletionHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelEvent {
    /// One or more descriptors completed
    Done {
        /// Descriptors still outstanding
        remaining: usize,
    },
    /// The engine stopped on a fault
    Error(TransferFault),
}

/// Receives completion events from interrupt context.
///
/// Closures `FnMut(usize, ChannelEvent)` implement this trait; the first
/// argument is the channel id.
pub trait CompletionHandler {
    /// Called from `Channel::on_interrupt`
    fn on_event(&mut self, channel: usize, event: ChannelEvent);
}

impl<F> CompletionHandler for F
where
    F: FnMut(usize, ChannelEvent),
{
    fn on_event(&mut self, channel: usize, event: ChannelEvent) {
        self(channel, event);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
