//! Descriptor word layout and control bits.

/// Word indices within a 16-word descriptor slot
pub mod word {
    /// Control word (type, width, predicate, flags)
    pub const CONTROL: usize = 0;
    /// Source address, low 32 bits (jump target for JUMP slots)
    pub const SRC: usize = 1;
    /// Destination address, low 32 bits
    pub const DST: usize = 2;
    /// Bytes per row (total bytes for 1D)
    pub const ROW_LENGTH: usize = 3;
    /// Rows per plane
    pub const ROWS: usize = 4;
    /// Source row pitch
    pub const SRC_PITCH: usize = 5;
    /// Destination row pitch
    pub const DST_PITCH: usize = 6;
    /// Plane count
    pub const PLANES: usize = 7;
    /// Source plane pitch
    pub const SRC_PLANE_PITCH: usize = 8;
    /// Destination plane pitch
    pub const DST_PLANE_PITCH: usize = 9;
    /// Source segment selector (wide descriptors)
    pub const SRC_HI: usize = 10;
    /// Destination segment selector (wide descriptors)
    pub const DST_HI: usize = 11;
    /// Row predicate bitmap address
    pub const PRED_ADDR: usize = 12;
    /// Words per slot
    pub const COUNT: usize = 16;
}

/// Control word bits
pub mod ctrl {
    /// Descriptor type field mask
    #[cfg(test)]
    pub const TYPE_MASK: u32 = 0x3;
    /// Contiguous transfer
    pub const TYPE_1D: u32 = 0;
    /// Row transfer
    pub const TYPE_2D: u32 = 1;
    /// Plane transfer
    pub const TYPE_3D: u32 = 2;
    /// Jump to the address in the source word
    pub const TYPE_JUMP: u32 = 3;
    /// Segment words are valid
    pub const WIDE: u32 = 1 << 2;
    /// Row predicate word is valid
    pub const PREDICATED: u32 = 1 << 3;
    /// High-priority bus arbitration
    pub const HIGH_PRIORITY: u32 = 1 << 8;
    /// Pulse the notify output on completion
    pub const NOTIFY: u32 = 1 << 9;
    /// Slot holds a descriptor; an all-zero slot is rejected on fetch
    pub const VALID: u32 = 1 << 30;
    /// Raise the done interrupt on completion
    pub const INTR_ON_DONE: u32 = 1 << 31;

    /// Type field value for a shape with `dims` dimensions
    #[inline(always)]
    #[must_use]
    pub const fn type_for_dims(dims: u8) -> u32 {
        match dims {
            1 => TYPE_1D,
            2 => TYPE_2D,
            _ => TYPE_3D,
        }
    }
}
