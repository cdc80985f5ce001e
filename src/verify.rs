//! Data checks for completed transfers.
//!
//! These compare a source buffer with a destination buffer using the same
//! row and plane walk the engine performs. Both slices start at the address
//! the descriptor points at. Rows that a predicate leaves unselected are not
//! compared.
//!
//! # Example
//!
//! ```ignore
//! ch.add(&desc)?;
//! ch.schedule(1)?;
//! ch.wait_all(&mut delay, 1_000)?;
//! verify::compare(desc.shape(), &src, &dst, Some(&mask))?;
//! ```

use crate::descriptor::Shape;
use crate::descriptor::predicate::row_enabled;

/// Why a comparison failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerifyError {
    /// A byte differs
    Mismatch {
        /// Plane index (0 for 1D and 2D)
        plane: u32,
        /// Row index within the plane
        row: u32,
        /// Byte offset within the row
        offset: u32,
    },
    /// A row reaches past the end of one of the buffers
    OutOfBounds {
        /// Plane index
        plane: u32,
        /// Row index within the plane
        row: u32,
    },
}

impl core::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            VerifyError::Mismatch { plane, row, offset } => {
                write!(f, "mismatch at plane {plane} row {row} byte {offset}")
            }
            VerifyError::OutOfBounds { plane, row } => {
                write!(f, "plane {plane} row {row} out of bounds")
            }
        }
    }
}

/// Walk parameters for one side of a transfer.
#[derive(Clone, Copy)]
struct Walk {
    row_length: u32,
    rows: u32,
    planes: u32,
    src_pitch: u32,
    dst_pitch: u32,
    src_plane_pitch: u32,
    dst_plane_pitch: u32,
}

impl Walk {
    fn of(shape: &Shape) -> Self {
        match *shape {
            Shape::OneD { length } => Walk {
                row_length: length,
                rows: 1,
                planes: 1,
                src_pitch: 0,
                dst_pitch: 0,
                src_plane_pitch: 0,
                dst_plane_pitch: 0,
            },
            Shape::TwoD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
            } => Walk {
                row_length,
                rows,
                planes: 1,
                src_pitch,
                dst_pitch,
                src_plane_pitch: 0,
                dst_plane_pitch: 0,
            },
            Shape::ThreeD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
                planes,
                src_plane_pitch,
                dst_plane_pitch,
            } => Walk {
                row_length,
                rows,
                planes,
                src_pitch,
                dst_pitch,
                src_plane_pitch,
                dst_plane_pitch,
            },
        }
    }

    fn row(buf: &[u8], start: usize, len: usize) -> Option<&[u8]> {
        buf.get(start..start.checked_add(len)?)
    }

    /// Call `f` with each selected (plane, row, src row, dst row).
    fn for_each_row(
        &self,
        src: &[u8],
        dst: &[u8],
        mask: Option<&[u8]>,
        mut f: impl FnMut(u32, u32, &[u8], &[u8]) -> Result<(), VerifyError>,
    ) -> Result<(), VerifyError> {
        let len = self.row_length as usize;
        for plane in 0..self.planes {
            for row in 0..self.rows {
                if mask.is_some_and(|m| !row_enabled(m, row as usize)) {
                    continue;
                }
                let s = plane as usize * self.src_plane_pitch as usize
                    + row as usize * self.src_pitch as usize;
                let d = plane as usize * self.dst_plane_pitch as usize
                    + row as usize * self.dst_pitch as usize;
                match (Self::row(src, s, len), Self::row(dst, d, len)) {
                    (Some(s), Some(d)) => f(plane, row, s, d)?,
                    _ => return Err(VerifyError::OutOfBounds { plane, row }),
                }
            }
        }
        Ok(())
    }
}

fn compare_rows(plane: u32, row: u32, src: &[u8], dst: &[u8]) -> Result<(), VerifyError> {
    match src.iter().zip(dst).position(|(a, b)| a != b) {
        Some(offset) => Err(VerifyError::Mismatch {
            plane,
            row,
            offset: offset as u32,
        }),
        None => Ok(()),
    }
}

/// Check that every row selected by `mask` (all rows when `None`) was copied
/// from `src` to `dst` as `shape` describes.
pub fn compare(
    shape: &Shape,
    src: &[u8],
    dst: &[u8],
    mask: Option<&[u8]>,
) -> Result<(), VerifyError> {
    Walk::of(shape).for_each_row(src, dst, mask, compare_rows)
}

/// Contiguous comparison of the first `length` bytes.
pub fn compare_1d(src: &[u8], dst: &[u8], length: u32) -> Result<(), VerifyError> {
    compare(&Shape::OneD { length }, src, dst, None)
}

/// Row-by-row comparison with independent pitches.
pub fn compare_2d(
    src: &[u8],
    dst: &[u8],
    row_length: u32,
    rows: u32,
    src_pitch: u32,
    dst_pitch: u32,
) -> Result<(), VerifyError> {
    let shape = Shape::TwoD {
        row_length,
        rows,
        src_pitch,
        dst_pitch,
    };
    compare(&shape, src, dst, None)
}

/// Like [`compare_2d`], skipping rows whose predicate bit is clear.
pub fn compare_2d_predicated(
    src: &[u8],
    dst: &[u8],
    row_length: u32,
    rows: u32,
    src_pitch: u32,
    dst_pitch: u32,
    mask: &[u8],
) -> Result<(), VerifyError> {
    let shape = Shape::TwoD {
        row_length,
        rows,
        src_pitch,
        dst_pitch,
    };
    compare(&shape, src, dst, Some(mask))
}

/// Plane-by-plane comparison.
pub fn compare_3d(
    src: &[u8],
    dst: &[u8],
    row_length: u32,
    rows: u32,
    src_pitch: u32,
    dst_pitch: u32,
    planes: u32,
    src_plane_pitch: u32,
    dst_plane_pitch: u32,
) -> Result<(), VerifyError> {
    let shape = Shape::ThreeD {
        row_length,
        rows,
        src_pitch,
        dst_pitch,
        planes,
        src_plane_pitch,
        dst_plane_pitch,
    };
    compare(&shape, src, dst, None)
}

/// Check that destination rows left unselected by `mask` still hold their
/// contents from `before`.
pub fn unselected_rows_unchanged(
    before: &[u8],
    after: &[u8],
    row_length: u32,
    rows: u32,
    dst_pitch: u32,
    mask: &[u8],
) -> Result<(), VerifyError> {
    let len = row_length as usize;
    for row in (0..rows).filter(|&r| !row_enabled(mask, r as usize)) {
        let start = row as usize * dst_pitch as usize;
        match (
            Walk::row(before, start, len),
            Walk::row(after, start, len),
        ) {
            (Some(b), Some(a)) => compare_rows(0, row, b, a)?,
            _ => return Err(VerifyError::OutOfBounds { plane: 0, row }),
        }
    }
    Ok(())
}
