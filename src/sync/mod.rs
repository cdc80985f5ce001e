//! Synchronization and Concurrency Support
//!
//! Sharing a [`Channel`](crate::driver::Channel) between thread mode and its
//! interrupt handler:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - Async waker storage for interrupts
//!
//! - **Shared Wrapper** (`shared`):
//!   - [`SharedChannel`] - Critical-section protected channel slot
//!
//! - **Async Support** (`asynch`):
//!   - [`CHANNEL_WAKER`] - Per-channel wakers woken by
//!     [`SharedChannel::on_interrupt`]
//!   - [`wait_idle`] - Future resolving when a channel drains or faults
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables `primitives` and `shared` modules
//! - `async`: Enables `asynch` module (also requires `critical-section`)
//!
//! # Example
//!
//! ```ignore
//! use xt_idma::sync::SharedChannel;
//!
//! static CH0: SharedChannel<'static, MmioIdma<NoIrq>> = SharedChannel::new();
//!
//! async fn copy_task() -> xt_idma::Result<()> {
//!     CH0.with(|ch| ch.schedule(1)).unwrap_or(Ok(()))?;
//!     xt_idma::sync::wait_idle(&CH0).await
//! }
//!
//! #[interrupt]
//! fn IDMA_DONE() {
//!     CH0.on_interrupt();
//! }
//! ```

mod primitives;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::SharedChannel;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{CHANNEL_WAKER, ChannelWaker, WaitIdle, reset_async_state, wait_idle};
