//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`descriptor`]: In-memory descriptor slots and their bit layout
//! - [`ring`]: Ring and task bookkeeping over caller-provided slot storage
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. [`DescriptorSlot`] and
//! [`ring_storage_len`] are re-exported from the crate root; nothing else
//! here should be depended on from external code.
//!
//! [`DescriptorSlot`]: descriptor::DescriptorSlot
//! [`ring_storage_len`]: ring::ring_storage_len

pub(crate) mod descriptor;
pub(crate) mod ring;
