//! Transfer descriptors.
//!
//! A [`Descriptor`] is a plain value describing one copy operation: a 1D
//! block, a 2D set of rows with independent source and destination pitches
//! (optionally predicated per row), or a 3D stack of such planes. It is inert
//! until written into a ring slot with one of the `Channel::add*` methods.
//!
//! # Example
//!
//! ```ignore
//! use xt_idma::{DescFlags, Descriptor};
//!
//! // 16 rows of 64 bytes out of a 256-byte wide source image into a packed tile
//! let desc = Descriptor::new_2d(tile, image, 64, DescFlags::INTERRUPT, 16, 256, 64)?;
//! assert_eq!(desc.total_bytes(), 1024);
//! ```

mod address;
pub mod predicate;

pub use address::DmaAddr;
pub use predicate::PredicateMask;

use crate::constants::{MAX_RING_CAPACITY, MAX_RING_CAPACITY_EXTENDED};
use crate::error::{ConfigError, ConfigResult};
use crate::internal::descriptor::bits::ctrl;

// =============================================================================
// Flags
// =============================================================================

/// Per-descriptor control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescFlags(u32);

impl DescFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Raise the done interrupt when this descriptor completes
    pub const INTERRUPT: Self = Self(ctrl::INTR_ON_DONE);
    /// Arbitrate this descriptor's bus requests at high priority
    pub const HIGH_PRIORITY: Self = Self(ctrl::HIGH_PRIORITY);
    /// Pulse the notify output when this descriptor completes
    pub const NOTIFY: Self = Self(ctrl::NOTIFY);

    const ALL: u32 = ctrl::INTR_ON_DONE | ctrl::HIGH_PRIORITY | ctrl::NOTIFY;

    /// Rebuild flags from control-word bits, dropping anything that is not a flag.
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    /// Raw control-word bits
    #[inline(always)]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether all bits of `other` are set
    #[inline(always)]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of both flag sets
    #[inline(always)]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for DescFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for DescFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

// =============================================================================
// Descriptor Kind
// =============================================================================

/// Descriptor format a ring is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorKind {
    /// Contiguous block
    #[default]
    OneD,
    /// Rows with independent pitches
    TwoD,
    /// Planes of rows
    ThreeD,
    /// 1D with 36-bit addresses
    OneDWide,
    /// 2D with 36-bit addresses
    TwoDWide,
    /// 3D with 36-bit addresses
    ThreeDWide,
}

impl DescriptorKind {
    /// Number of dimensions (1..=3)
    #[must_use]
    pub const fn dims(self) -> u8 {
        match self {
            DescriptorKind::OneD | DescriptorKind::OneDWide => 1,
            DescriptorKind::TwoD | DescriptorKind::TwoDWide => 2,
            DescriptorKind::ThreeD | DescriptorKind::ThreeDWide => 3,
        }
    }

    /// Whether this kind carries 36-bit addresses
    #[must_use]
    pub const fn is_wide(self) -> bool {
        matches!(
            self,
            DescriptorKind::OneDWide | DescriptorKind::TwoDWide | DescriptorKind::ThreeDWide
        )
    }

    /// Largest ring capacity supported for this kind.
    #[must_use]
    pub const fn max_capacity(self) -> usize {
        if self.is_wide() || self.dims() == 3 {
            MAX_RING_CAPACITY_EXTENDED
        } else {
            MAX_RING_CAPACITY
        }
    }

    /// Whether a descriptor of this kind can be stored in a ring of kind `ring`.
    ///
    /// Slots are uniform, so a ring accepts any descriptor with no more
    /// dimensions than its own kind; wide descriptors need a wide ring.
    #[must_use]
    pub const fn fits_in(self, ring: DescriptorKind) -> bool {
        self.dims() <= ring.dims() && (!self.is_wide() || ring.is_wide())
    }

    /// Check that the build supports this kind.
    pub const fn check_supported(self) -> ConfigResult<()> {
        if self.is_wide() {
            ensure_wide_supported()
        } else {
            Ok(())
        }
    }

    const fn with_width(dims: u8, wide: bool) -> Self {
        match (dims, wide) {
            (1, false) => DescriptorKind::OneD,
            (1, true) => DescriptorKind::OneDWide,
            (2, false) => DescriptorKind::TwoD,
            (2, true) => DescriptorKind::TwoDWide,
            (_, false) => DescriptorKind::ThreeD,
            (_, true) => DescriptorKind::ThreeDWide,
        }
    }
}

/// Fails with `UnsupportedAddressWidth` unless built with `wide-address`.
#[inline(always)]
pub const fn ensure_wide_supported() -> ConfigResult<()> {
    if cfg!(feature = "wide-address") {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedAddressWidth)
    }
}

// =============================================================================
// Shape
// =============================================================================

/// Geometry of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    /// Contiguous block of `length` bytes
    OneD {
        /// Total bytes
        length: u32,
    },
    /// `rows` rows of `row_length` bytes
    TwoD {
        /// Bytes per row
        row_length: u32,
        /// Number of rows
        rows: u32,
        /// Bytes between source row starts
        src_pitch: u32,
        /// Bytes between destination row starts
        dst_pitch: u32,
    },
    /// `planes` planes of `rows` rows of `row_length` bytes
    ThreeD {
        /// Bytes per row
        row_length: u32,
        /// Rows per plane
        rows: u32,
        /// Bytes between source row starts
        src_pitch: u32,
        /// Bytes between destination row starts
        dst_pitch: u32,
        /// Number of planes
        planes: u32,
        /// Bytes between source plane starts
        src_plane_pitch: u32,
        /// Bytes between destination plane starts
        dst_plane_pitch: u32,
    },
}

impl Shape {
    /// Number of dimensions
    #[must_use]
    pub const fn dims(&self) -> u8 {
        match self {
            Shape::OneD { .. } => 1,
            Shape::TwoD { .. } => 2,
            Shape::ThreeD { .. } => 3,
        }
    }

    /// Bytes per row (total bytes for 1D)
    #[must_use]
    pub const fn row_length(&self) -> u32 {
        match *self {
            Shape::OneD { length } => length,
            Shape::TwoD { row_length, .. } | Shape::ThreeD { row_length, .. } => row_length,
        }
    }

    /// Rows per plane (1 for 1D)
    #[must_use]
    pub const fn rows(&self) -> u32 {
        match *self {
            Shape::OneD { .. } => 1,
            Shape::TwoD { rows, .. } | Shape::ThreeD { rows, .. } => rows,
        }
    }

    /// Number of planes (1 for 1D and 2D)
    #[must_use]
    pub const fn planes(&self) -> u32 {
        match *self {
            Shape::ThreeD { planes, .. } => planes,
            _ => 1,
        }
    }

    /// Total bytes moved when every row is copied
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.row_length() as u64 * self.rows() as u64 * self.planes() as u64
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.row_length() == 0 || self.rows() == 0 || self.planes() == 0 {
            return Err(ConfigError::InvalidDescriptor);
        }
        match *self {
            Shape::OneD { .. } => Ok(()),
            Shape::TwoD {
                row_length,
                src_pitch,
                dst_pitch,
                ..
            } => check_pitches(row_length, src_pitch, dst_pitch),
            Shape::ThreeD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
                src_plane_pitch,
                dst_plane_pitch,
                ..
            } => {
                check_pitches(row_length, src_pitch, dst_pitch)?;
                check_plane_pitch(row_length, rows, src_pitch, src_plane_pitch)?;
                check_plane_pitch(row_length, rows, dst_pitch, dst_plane_pitch)
            }
        }
    }
}

/// A row cannot overrun its stride.
fn check_pitches(row_length: u32, src_pitch: u32, dst_pitch: u32) -> ConfigResult<()> {
    if (src_pitch != 0 && row_length > src_pitch) || (dst_pitch != 0 && row_length > dst_pitch) {
        return Err(ConfigError::InvalidDescriptor);
    }
    Ok(())
}

/// A plane cannot overrun its stride.
fn check_plane_pitch(row_length: u32, rows: u32, pitch: u32, plane_pitch: u32) -> ConfigResult<()> {
    if plane_pitch == 0 {
        return Ok(());
    }
    let footprint = (rows as u64 - 1) * pitch as u64 + row_length as u64;
    if footprint > plane_pitch as u64 {
        return Err(ConfigError::InvalidDescriptor);
    }
    Ok(())
}

// =============================================================================
// Descriptor
// =============================================================================

/// One transfer, ready to be added to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Descriptor {
    shape: Shape,
    dst: DmaAddr,
    src: DmaAddr,
    flags: DescFlags,
    predicate: Option<PredicateMask>,
    wide: bool,
}

impl Descriptor {
    pub(crate) fn from_parts(
        shape: Shape,
        dst: DmaAddr,
        src: DmaAddr,
        flags: DescFlags,
        predicate: Option<PredicateMask>,
        wide: bool,
    ) -> ConfigResult<Self> {
        if wide {
            ensure_wide_supported()?;
        }
        shape.validate()?;
        if let Some(mask) = predicate {
            mask.check_rows(shape.rows())?;
        }
        Ok(Self {
            shape,
            dst,
            src,
            flags,
            predicate,
            wide,
        })
    }

    /// Contiguous copy of `length` bytes.
    pub fn new_1d(dst: u32, src: u32, length: u32, flags: DescFlags) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::OneD { length },
            dst.into(),
            src.into(),
            flags,
            None,
            false,
        )
    }

    /// Copy `rows` rows of `row_length` bytes with independent pitches.
    pub fn new_2d(
        dst: u32,
        src: u32,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
    ) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::TwoD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
            },
            dst.into(),
            src.into(),
            flags,
            None,
            false,
        )
    }

    /// 2D copy where only rows selected by `mask` are transferred.
    pub fn new_2d_predicated(
        dst: u32,
        src: u32,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
        mask: PredicateMask,
    ) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::TwoD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
            },
            dst.into(),
            src.into(),
            flags,
            Some(mask),
            false,
        )
    }

    /// Copy `planes` planes of `rows` rows each.
    pub fn new_3d(
        dst: u32,
        src: u32,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
        planes: u32,
        src_plane_pitch: u32,
        dst_plane_pitch: u32,
    ) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::ThreeD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
                planes,
                src_plane_pitch,
                dst_plane_pitch,
            },
            dst.into(),
            src.into(),
            flags,
            None,
            false,
        )
    }

    /// 1D copy with 36-bit addresses.
    pub fn new_1d_wide(
        dst: DmaAddr,
        src: DmaAddr,
        length: u32,
        flags: DescFlags,
    ) -> ConfigResult<Self> {
        Self::from_parts(Shape::OneD { length }, dst, src, flags, None, true)
    }

    /// 2D copy with 36-bit addresses.
    pub fn new_2d_wide(
        dst: DmaAddr,
        src: DmaAddr,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
    ) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::TwoD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
            },
            dst,
            src,
            flags,
            None,
            true,
        )
    }

    /// Predicated 2D copy with 36-bit addresses.
    pub fn new_2d_predicated_wide(
        dst: DmaAddr,
        src: DmaAddr,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
        mask: PredicateMask,
    ) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::TwoD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
            },
            dst,
            src,
            flags,
            Some(mask),
            true,
        )
    }

    /// 3D copy with 36-bit addresses.
    pub fn new_3d_wide(
        dst: DmaAddr,
        src: DmaAddr,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
        planes: u32,
        src_plane_pitch: u32,
        dst_plane_pitch: u32,
    ) -> ConfigResult<Self> {
        Self::from_parts(
            Shape::ThreeD {
                row_length,
                rows,
                src_pitch,
                dst_pitch,
                planes,
                src_plane_pitch,
                dst_plane_pitch,
            },
            dst,
            src,
            flags,
            None,
            true,
        )
    }

    /// Descriptor kind
    #[must_use]
    pub const fn kind(&self) -> DescriptorKind {
        DescriptorKind::with_width(self.shape.dims(), self.wide)
    }

    /// Transfer geometry
    #[inline(always)]
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Source address
    #[inline(always)]
    #[must_use]
    pub const fn src(&self) -> DmaAddr {
        self.src
    }

    /// Destination address
    #[inline(always)]
    #[must_use]
    pub const fn dst(&self) -> DmaAddr {
        self.dst
    }

    /// Control flags
    #[inline(always)]
    #[must_use]
    pub const fn flags(&self) -> DescFlags {
        self.flags
    }

    /// Row predicate, if any
    #[inline(always)]
    #[must_use]
    pub const fn predicate(&self) -> Option<PredicateMask> {
        self.predicate
    }

    /// Total bytes moved when every row is copied
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.shape.total_bytes()
    }

    /// Replace the source address.
    ///
    /// Narrow descriptors only take local addresses.
    pub fn set_src(&mut self, src: DmaAddr) -> ConfigResult<()> {
        self.check_addr(src)?;
        self.src = src;
        Ok(())
    }

    /// Replace the destination address.
    pub fn set_dst(&mut self, dst: DmaAddr) -> ConfigResult<()> {
        self.check_addr(dst)?;
        self.dst = dst;
        Ok(())
    }

    /// Replace the flags.
    pub fn set_flags(&mut self, flags: DescFlags) {
        self.flags = flags;
    }

    const fn check_addr(&self, addr: DmaAddr) -> ConfigResult<()> {
        if addr.is_wide() && !self.wide {
            return Err(ConfigError::UnsupportedAddressWidth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_d_total_bytes() {
        let d = Descriptor::new_1d(0x100, 0x200, 200, DescFlags::NONE).unwrap();
        assert_eq!(d.kind(), DescriptorKind::OneD);
        assert_eq!(d.total_bytes(), 200);
        assert_eq!(d.dst(), DmaAddr::Local(0x100));
        assert_eq!(d.src(), DmaAddr::Local(0x200));
    }

    #[test]
    fn zero_length_rejected() {
        assert_eq!(
            Descriptor::new_1d(0, 0x10, 0, DescFlags::NONE),
            Err(ConfigError::InvalidDescriptor)
        );
        assert_eq!(
            Descriptor::new_2d(0, 0x10, 0, DescFlags::NONE, 4, 16, 16),
            Err(ConfigError::InvalidDescriptor)
        );
    }

    #[test]
    fn zero_rows_rejected() {
        assert_eq!(
            Descriptor::new_2d(0, 0x10, 8, DescFlags::NONE, 0, 16, 16),
            Err(ConfigError::InvalidDescriptor)
        );
    }

    #[test]
    fn row_longer_than_pitch_rejected() {
        assert_eq!(
            Descriptor::new_2d(0, 0x10, 32, DescFlags::NONE, 4, 16, 64),
            Err(ConfigError::InvalidDescriptor)
        );
        assert_eq!(
            Descriptor::new_2d(0, 0x10, 32, DescFlags::NONE, 4, 64, 16),
            Err(ConfigError::InvalidDescriptor)
        );
    }

    #[test]
    fn zero_pitch_is_unconstrained() {
        assert!(Descriptor::new_2d(0, 0x10, 32, DescFlags::NONE, 4, 0, 32).is_ok());
    }

    #[test]
    fn independent_pitches() {
        let d = Descriptor::new_2d(0x1000, 0x2000, 16, DescFlags::NONE, 8, 64, 16).unwrap();
        assert_eq!(
            *d.shape(),
            Shape::TwoD {
                row_length: 16,
                rows: 8,
                src_pitch: 64,
                dst_pitch: 16
            }
        );
        assert_eq!(d.total_bytes(), 128);
    }

    #[test]
    fn predicate_length_must_match_rows() {
        let ok = PredicateMask::new(0x40, 2);
        assert!(
            Descriptor::new_2d_predicated(0, 0x10, 4, DescFlags::NONE, 10, 4, 4, ok).is_ok()
        );
        let short = PredicateMask::new(0x40, 1);
        assert_eq!(
            Descriptor::new_2d_predicated(0, 0x10, 4, DescFlags::NONE, 10, 4, 4, short),
            Err(ConfigError::PredicateMismatch)
        );
    }

    #[test]
    fn three_d_plane_overrun_rejected() {
        // 4 rows at pitch 16 span 52 bytes, more than the 48-byte plane pitch
        assert_eq!(
            Descriptor::new_3d(0, 0x10, 4, DescFlags::NONE, 4, 16, 16, 2, 48, 64),
            Err(ConfigError::InvalidDescriptor)
        );
        let d = Descriptor::new_3d(0, 0x10, 4, DescFlags::NONE, 4, 16, 16, 2, 64, 64).unwrap();
        assert_eq!(d.kind(), DescriptorKind::ThreeD);
        assert_eq!(d.total_bytes(), 32);
    }

    #[test]
    fn flags_combine() {
        let f = DescFlags::INTERRUPT | DescFlags::HIGH_PRIORITY;
        assert!(f.contains(DescFlags::INTERRUPT));
        assert!(f.contains(DescFlags::HIGH_PRIORITY));
        assert!(!f.contains(DescFlags::NOTIFY));
        assert_eq!(DescFlags::from_bits_truncate(f.bits() | 0x3), f);
    }

    #[test]
    fn narrow_descriptor_rejects_wide_address() {
        let mut d = Descriptor::new_1d(0, 0x10, 4, DescFlags::NONE).unwrap();
        let wide = DmaAddr::system(1, 0).unwrap();
        assert_eq!(d.set_src(wide), Err(ConfigError::UnsupportedAddressWidth));
        assert!(d.set_src(DmaAddr::Local(0x80)).is_ok());
        assert_eq!(d.src(), DmaAddr::Local(0x80));
    }

    #[test]
    fn kind_fits_in() {
        assert!(DescriptorKind::OneD.fits_in(DescriptorKind::TwoD));
        assert!(!DescriptorKind::ThreeD.fits_in(DescriptorKind::TwoD));
        assert!(!DescriptorKind::OneDWide.fits_in(DescriptorKind::ThreeD));
        assert!(DescriptorKind::OneD.fits_in(DescriptorKind::TwoDWide));
    }

    #[test]
    fn kind_capacity_limits() {
        assert_eq!(DescriptorKind::OneD.max_capacity(), MAX_RING_CAPACITY);
        assert_eq!(DescriptorKind::TwoD.max_capacity(), MAX_RING_CAPACITY);
        assert_eq!(DescriptorKind::ThreeD.max_capacity(), MAX_RING_CAPACITY_EXTENDED);
        assert_eq!(DescriptorKind::OneDWide.max_capacity(), MAX_RING_CAPACITY_EXTENDED);
    }

    #[cfg(feature = "wide-address")]
    #[test]
    fn wide_descriptor_accepts_system_addresses() {
        let src = DmaAddr::system(2, 0x10).unwrap();
        let mut d = Descriptor::new_1d_wide(DmaAddr::Local(0x20), src, 8, DescFlags::NONE).unwrap();
        assert_eq!(d.kind(), DescriptorKind::OneDWide);
        assert!(d.set_dst(DmaAddr::system(3, 0).unwrap()).is_ok());
    }

    #[cfg(not(feature = "wide-address"))]
    #[test]
    fn wide_descriptor_requires_feature() {
        let src = DmaAddr::system(2, 0x10).unwrap();
        assert_eq!(
            Descriptor::new_1d_wide(DmaAddr::Local(0x20), src, 8, DescFlags::NONE),
            Err(ConfigError::UnsupportedAddressWidth)
        );
        assert_eq!(
            DescriptorKind::TwoDWide.check_supported(),
            Err(ConfigError::UnsupportedAddressWidth)
        );
    }
}
