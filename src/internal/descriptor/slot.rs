//! One hardware descriptor slot.

use super::VolatileCell;
use super::bits::{ctrl, word};
#[cfg(test)]
use crate::descriptor::predicate::mask_len;
#[cfg(test)]
use crate::descriptor::{DescFlags, PredicateMask};
use crate::descriptor::{Descriptor, DmaAddr, Shape};
use crate::error::{ConfigError, ConfigResult};

/// Storage for one descriptor as the engine fetches it.
///
/// Rings are built over caller-provided arrays of slots. Slots must stay at a
/// fixed address for as long as a channel has them bound.
///
/// ```ignore
/// static STORAGE: [DescriptorSlot; 9] = [const { DescriptorSlot::new() }; 9];
/// ```
#[repr(C, align(64))]
pub struct DescriptorSlot {
    words: [VolatileCell<u32>; word::COUNT],
}

/// Decoded slot contents.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotContent {
    /// Continue fetching at this bus address
    Jump(u32),
    /// A transfer
    Transfer(Descriptor),
}

impl DescriptorSlot {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [const { VolatileCell::new(0) }; word::COUNT],
        }
    }

    /// Raw control word
    #[inline(always)]
    #[must_use]
    pub fn control(&self) -> u32 {
        self.words[word::CONTROL].get()
    }

    /// Whether the slot holds a descriptor or jump
    #[inline(always)]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.control() & ctrl::VALID != 0
    }

    #[inline(always)]
    pub(crate) fn word(&self, index: usize) -> u32 {
        self.words[index].get()
    }

    /// Encode `desc` into the slot. The control word is written last.
    pub(crate) fn write(&self, desc: &Descriptor) {
        let shape = desc.shape();
        let kind = desc.kind();
        let w = &self.words;

        w[word::SRC].set(desc.src().offset());
        w[word::DST].set(desc.dst().offset());
        w[word::ROW_LENGTH].set(shape.row_length());
        w[word::ROWS].set(shape.rows());
        w[word::PLANES].set(shape.planes());

        let (src_pitch, dst_pitch, src_plane, dst_plane) = match *shape {
            Shape::OneD { .. } => (0, 0, 0, 0),
            Shape::TwoD {
                src_pitch,
                dst_pitch,
                ..
            } => (src_pitch, dst_pitch, 0, 0),
            Shape::ThreeD {
                src_pitch,
                dst_pitch,
                src_plane_pitch,
                dst_plane_pitch,
                ..
            } => (src_pitch, dst_pitch, src_plane_pitch, dst_plane_pitch),
        };
        w[word::SRC_PITCH].set(src_pitch);
        w[word::DST_PITCH].set(dst_pitch);
        w[word::SRC_PLANE_PITCH].set(src_plane);
        w[word::DST_PLANE_PITCH].set(dst_plane);

        w[word::SRC_HI].set(u32::from(desc.src().segment()));
        w[word::DST_HI].set(u32::from(desc.dst().segment()));
        w[word::PRED_ADDR].set(desc.predicate().map_or(0, |m| m.addr()));

        let mut control = ctrl::VALID | ctrl::type_for_dims(kind.dims()) | desc.flags().bits();
        if kind.is_wide() {
            control |= ctrl::WIDE;
        }
        if desc.predicate().is_some() {
            control |= ctrl::PREDICATED;
        }
        w[word::CONTROL].set(control);
    }

    /// Turn the slot into a jump to `target`.
    pub(crate) fn write_jump(&self, target: u32) {
        self.clear();
        self.words[word::SRC].set(target);
        self.words[word::CONTROL].set(ctrl::VALID | ctrl::TYPE_JUMP);
    }

    /// Zero every word, control first.
    pub(crate) fn clear(&self) {
        for cell in &self.words {
            cell.set(0);
        }
    }

    /// Copy another slot word for word. The control word is written last.
    pub(crate) fn copy_from(&self, other: &DescriptorSlot) {
        for (i, cell) in self.words.iter().enumerate().skip(1) {
            cell.set(other.words[i].get());
        }
        self.words[word::CONTROL].set(other.control());
    }

    /// Patch the source address of a transfer slot.
    pub(crate) fn set_src(&self, addr: DmaAddr) -> ConfigResult<()> {
        self.check_width(addr)?;
        self.words[word::SRC].set(addr.offset());
        self.words[word::SRC_HI].set(u32::from(addr.segment()));
        Ok(())
    }

    /// Patch the destination address of a transfer slot.
    pub(crate) fn set_dst(&self, addr: DmaAddr) -> ConfigResult<()> {
        self.check_width(addr)?;
        self.words[word::DST].set(addr.offset());
        self.words[word::DST_HI].set(u32::from(addr.segment()));
        Ok(())
    }

    fn check_width(&self, addr: DmaAddr) -> ConfigResult<()> {
        if addr.is_wide() && self.control() & ctrl::WIDE == 0 {
            return Err(ConfigError::UnsupportedAddressWidth);
        }
        Ok(())
    }

    /// Decode the slot the way the engine interprets it on fetch.
    #[cfg(test)]
    pub(crate) fn read(&self) -> ConfigResult<SlotContent> {
        let control = self.control();
        if control & ctrl::VALID == 0 {
            return Err(ConfigError::InvalidDescriptor);
        }
        let ty = control & ctrl::TYPE_MASK;
        if ty == ctrl::TYPE_JUMP {
            return Ok(SlotContent::Jump(self.word(word::SRC)));
        }

        let wide = control & ctrl::WIDE != 0;
        let addr = |lo: usize, hi: usize| -> ConfigResult<DmaAddr> {
            if wide {
                let segment = u8::try_from(self.word(hi))
                    .map_err(|_| ConfigError::UnsupportedAddressWidth)?;
                DmaAddr::system(segment, self.word(lo))
            } else {
                Ok(DmaAddr::Local(self.word(lo)))
            }
        };
        let src = addr(word::SRC, word::SRC_HI)?;
        let dst = addr(word::DST, word::DST_HI)?;

        let row_length = self.word(word::ROW_LENGTH);
        let rows = self.word(word::ROWS);
        let shape = match ty {
            ctrl::TYPE_1D => Shape::OneD { length: row_length },
            ctrl::TYPE_2D => Shape::TwoD {
                row_length,
                rows,
                src_pitch: self.word(word::SRC_PITCH),
                dst_pitch: self.word(word::DST_PITCH),
            },
            _ => Shape::ThreeD {
                row_length,
                rows,
                src_pitch: self.word(word::SRC_PITCH),
                dst_pitch: self.word(word::DST_PITCH),
                planes: self.word(word::PLANES),
                src_plane_pitch: self.word(word::SRC_PLANE_PITCH),
                dst_plane_pitch: self.word(word::DST_PLANE_PITCH),
            },
        };

        let predicate = (control & ctrl::PREDICATED != 0)
            .then(|| PredicateMask::new(self.word(word::PRED_ADDR), mask_len(rows)));

        Descriptor::from_parts(
            shape,
            dst,
            src,
            DescFlags::from_bits_truncate(control),
            predicate,
            wide,
        )
        .map(SlotContent::Transfer)
    }
}

impl Default for DescriptorSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DescriptorSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DescriptorSlot")
            .field("control", &format_args!("{:#010x}", self.control()))
            .field("src", &format_args!("{:#010x}", self.word(word::SRC)))
            .field("dst", &format_args!("{:#010x}", self.word(word::DST)))
            .finish_non_exhaustive()
    }
}
