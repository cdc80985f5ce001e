//! Row predicates for 2D transfers.
//!
//! A predicate is a bitmap in local memory with one bit per row, LSB first:
//! row `r` is copied iff bit `r % 8` of byte `r / 8` is set.

use crate::error::{ConfigError, ConfigResult};

/// Number of mask bytes needed for `rows` rows.
#[inline(always)]
#[must_use]
pub const fn mask_len(rows: u32) -> usize {
    (rows as usize).div_ceil(8)
}

/// Whether `row` is selected by `mask`. Rows past the end of the mask are
/// treated as unselected.
#[inline]
#[must_use]
pub fn row_enabled(mask: &[u8], row: usize) -> bool {
    mask.get(row / 8).is_some_and(|byte| byte & (1 << (row % 8)) != 0)
}

/// Count the rows selected by `mask` out of the first `rows`.
#[must_use]
pub fn selected_rows(mask: &[u8], rows: u32) -> usize {
    (0..rows as usize).filter(|&r| row_enabled(mask, r)).count()
}

/// Location of a row-predicate bitmap as seen by the DMA engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PredicateMask {
    addr: u32,
    len: usize,
}

impl PredicateMask {
    /// Describe a mask of `len` bytes at local bus address `addr`.
    #[must_use]
    pub const fn new(addr: u32, len: usize) -> Self {
        Self { addr, len }
    }

    /// Bus address of the mask bytes
    #[inline(always)]
    #[must_use]
    pub const fn addr(&self) -> u32 {
        self.addr
    }

    /// Mask length in bytes
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the mask has no bytes
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check that the mask covers exactly `rows` rows.
    pub const fn check_rows(&self, rows: u32) -> ConfigResult<()> {
        if self.len != mask_len(rows) {
            return Err(ConfigError::PredicateMismatch);
        }
        Ok(())
    }
}
