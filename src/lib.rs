//! Xtensa iDMA Driver
//!
//! A `no_std`, `no_alloc` driver for the Xtensa integrated DMA (iDMA) engine.
//!
//! The engine walks a ring of 32- or 64-byte descriptors in memory and copies
//! 1D, 2D, and 3D blocks between local and system memory. Software writes
//! descriptors into the ring, then hands them over by bumping the channel's
//! outstanding-descriptor counter. Completion is observed by polling or from
//! the done and error interrupts.
//!
//! # Architecture
//!
//! 1. **Descriptor Layer** ([`descriptor`]): Transfer descriptions as values
//! 2. **Driver Layer** ([`driver`]): Per-channel ring management, scheduling,
//!    status, pause/resume, and fault capture
//! 3. **HAL Layer** ([`hal`]): Register access, cache maintenance, and
//!    interrupt lines behind [`IdmaHal`]
//!
//! [`verify`] holds helpers that check destination data after a transfer.
//!
//! # Features
//!
//! - `wide-address` (default): Descriptors carrying 36-bit system addresses
//! - `defmt`: Enable defmt formatting for error and value types
//! - `log`: Log ring binding, scheduling, resets, and faults
//! - `critical-section`: Enable the ISR-safe [`sync::SharedChannel`] wrapper
//! - `async`: Enable async waiting with per-channel wakers
//!
//! # Example
//!
//! ```ignore
//! use xt_idma::{Channel, ChannelConfig, DescFlags, DescriptorKind, DescriptorSlot};
//! use xt_idma::hal::{MmioIdma, NoIrq};
//!
//! static mut SLOTS: [DescriptorSlot; 5] = [const { DescriptorSlot::new() }; 5];
//!
//! let hal = unsafe { MmioIdma::new(IDMA_BASE, NoIrq) };
//! let mut ch = Channel::new(0, hal)?;
//! ch.init(ChannelConfig::new().with_outstanding_requests(8))?;
//! ch.init_loop(unsafe { &mut *addr_of_mut!(SLOTS) }, DescriptorKind::OneD, 4, None)?;
//!
//! ch.add_descriptor(dst, src, 1024, DescFlags::INTERRUPT)?;
//! ch.schedule(1)?;
//! ch.wait_all(&mut delay, 10_000)?;
//! ```
//!
//! # Memory Requirements
//!
//! A ring of capacity `n` needs [`ring_storage_len`] slots of 64 bytes each:
//! `n + 1` for a looping ring (the extra slot holds the jump back to the
//! start), `n` for a one-shot task.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels mirror the [lints] table in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod hal;
pub mod register;
pub mod verify;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use descriptor::{DescFlags, Descriptor, DescriptorKind, DmaAddr, PredicateMask, Shape};
pub use driver::{
    Channel, ChannelConfig, ChannelEvent, ChannelState, ChannelStatus, CompletionHandler,
    InterruptStatus, MaxBlock, RingMode, STATUS_ERROR, TaskStatus, WatchdogPrescale,
};
pub use error::{
    ChannelError, ConfigError, ConfigResult, Error, FaultKind, Result, RingError, RingResult,
    TransferFault,
};
pub use hal::IdmaHal;
pub use internal::descriptor::DescriptorSlot;
pub use internal::ring::ring_storage_len;

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedChannel;

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{CHANNEL_WAKER, wait_idle};
