//! Core driver components for the iDMA engine.
//!
//! - [`config`] - Channel configuration and lifecycle types
//! - [`interrupt`] - Status parsing and completion events
//! - [`channel`] - The channel driver
//!
//! # Example
//!
//! ```ignore
//! use xt_idma::driver::{Channel, ChannelConfig};
//!
//! let config = ChannelConfig::new()
//!     .with_done_irq(IDMA_DONE_IRQ)
//!     .with_error_irq(IDMA_ERR_IRQ);
//! ```

pub mod channel;
pub mod config;
pub mod interrupt;

pub use channel::{Channel, ChannelStatus, STATUS_ERROR, TaskStatus};
pub use config::{ChannelConfig, ChannelState, MaxBlock, RingMode, WatchdogPrescale};
pub use interrupt::{ChannelEvent, CompletionHandler, InterruptStatus};
