//! Caller-backed descriptor ring.
//!
//! The ring tracks which slots the CPU may write. The engine consumes slots in
//! order starting at the bound base address; the producer cursor wraps modulo
//! `capacity`. In LOOP mode the slot after the last one is a jump back to slot
//! 0, written once at bind time.

use super::descriptor::DescriptorSlot;
use crate::constants::DESCRIPTOR_SIZE;
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::driver::config::RingMode;
use crate::error::{ConfigError, ConfigResult, RingError, RingResult};

/// Number of slots needed to back a ring of `capacity` descriptors.
#[inline(always)]
#[must_use]
pub const fn ring_storage_len(capacity: usize, mode: RingMode) -> usize {
    match mode {
        RingMode::Loop => capacity + 1,
        RingMode::Task => capacity,
    }
}

/// A contiguous run of slots, as `(first_index, count)`.
pub(crate) type SlotRun = (usize, usize);

/// Circular descriptor ring over borrowed storage.
pub(crate) struct DescriptorRing<'a> {
    slots: &'a [DescriptorSlot],
    base: u32,
    kind: DescriptorKind,
    mode: RingMode,
    capacity: usize,
    /// Next slot to write
    head: usize,
    /// Added but not yet scheduled
    pending: usize,
    /// Total additions since bind (TASK rings stop at `capacity`)
    added: usize,
    /// Most recently written slot
    last: Option<usize>,
    /// TASK ring whose every added descriptor has been scheduled
    closed: bool,
}

impl<'a> DescriptorRing<'a> {
    /// Bind `storage` as a ring. `base` is the bus address of `storage[0]`.
    pub fn new(
        storage: &'a mut [DescriptorSlot],
        base: u32,
        kind: DescriptorKind,
        capacity: usize,
        mode: RingMode,
    ) -> ConfigResult<Self> {
        kind.check_supported()?;
        if capacity == 0 || !capacity.is_power_of_two() || capacity > kind.max_capacity() {
            return Err(ConfigError::CapacityInvalid);
        }
        if storage.len() < ring_storage_len(capacity, mode) {
            return Err(ConfigError::CapacityInvalid);
        }

        let slots: &'a [DescriptorSlot] = storage;
        for slot in &slots[..capacity] {
            slot.clear();
        }
        if mode == RingMode::Loop {
            slots[capacity].write_jump(base);
        }

        Ok(Self {
            slots,
            base,
            kind,
            mode,
            capacity,
            head: 0,
            pending: 0,
            added: 0,
            last: None,
            closed: false,
        })
    }

    #[inline(always)]
    pub const fn kind(&self) -> DescriptorKind {
        self.kind
    }

    #[inline(always)]
    pub const fn mode(&self) -> RingMode {
        self.mode
    }

    #[inline(always)]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    #[cfg(test)]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Bus address of slot 0
    #[inline(always)]
    pub const fn base_addr(&self) -> u32 {
        self.base
    }

    /// Bus address of slot `index`
    #[cfg(test)]
    pub const fn slot_addr(&self, index: usize) -> u32 {
        self.base + (index * DESCRIPTOR_SIZE) as u32
    }

    /// Slot index for a bus address inside the ring's descriptor slots.
    pub fn index_of(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(self.base)? as usize;
        if offset % DESCRIPTOR_SIZE != 0 {
            return None;
        }
        let index = offset / DESCRIPTOR_SIZE;
        (index < self.capacity).then_some(index)
    }

    /// CPU pointer to slot `index`, for cache maintenance
    #[inline(always)]
    pub fn slot_ptr(&self, index: usize) -> *const u8 {
        core::ptr::from_ref(&self.slots[index]).cast()
    }

    /// Bytes of storage the engine reads
    pub const fn storage_bytes(&self) -> usize {
        ring_storage_len(self.capacity, self.mode) * DESCRIPTOR_SIZE
    }

    /// Slots the CPU may still write, given `outstanding` in-flight descriptors.
    pub fn free(&self, outstanding: usize) -> usize {
        match self.mode {
            RingMode::Loop => self
                .capacity
                .saturating_sub(outstanding)
                .saturating_sub(self.pending),
            RingMode::Task => self.capacity - self.added,
        }
    }

    /// Whether every descriptor of a TASK ring has been added.
    #[cfg(test)]
    pub const fn is_task_full(&self) -> bool {
        matches!(self.mode, RingMode::Task) && self.added == self.capacity
    }

    /// Whether a TASK ring has been handed to the engine in full. A closed
    /// task takes no further additions or schedules until it is reset.
    #[inline(always)]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn claim(&mut self, outstanding: usize) -> RingResult<usize> {
        if self.free(outstanding) == 0 {
            return Err(RingError::RingFull);
        }
        let index = self.head;
        self.head = (self.head + 1) % self.capacity;
        self.pending += 1;
        self.added += 1;
        self.last = Some(index);
        Ok(index)
    }

    /// Write `desc` into the next free slot and return its index.
    pub fn push(&mut self, desc: &Descriptor, outstanding: usize) -> RingResult<usize> {
        let index = self.claim(outstanding)?;
        self.slots[index].write(desc);
        Ok(index)
    }

    /// Copy the most recently written descriptor into the next free slot.
    pub fn repeat(&mut self, outstanding: usize) -> RingResult<usize> {
        let prev = self.last.ok_or(RingError::NoPendingDescriptor)?;
        let index = self.claim(outstanding)?;
        self.slots[index].copy_from(&self.slots[prev]);
        Ok(index)
    }

    /// The most recently added slot, if it has not been scheduled yet.
    pub fn last_pending(&self) -> RingResult<&DescriptorSlot> {
        match self.last {
            Some(index) if self.pending > 0 => Ok(&self.slots[index]),
            _ => Err(RingError::NoPendingDescriptor),
        }
    }

    /// Mark the oldest `count` pending descriptors as scheduled.
    ///
    /// Returns the slot runs they occupy (the second run is non-empty only
    /// when the range wraps).
    pub fn commit(&mut self, count: usize) -> RingResult<[SlotRun; 2]> {
        if count > self.pending {
            return Err(RingError::ScheduleOverflow);
        }
        let first = (self.head + self.capacity - self.pending) % self.capacity;
        self.pending -= count;
        if self.mode == RingMode::Task && count > 0 && self.pending == 0 {
            self.closed = true;
        }

        let tail = (self.capacity - first).min(count);
        Ok([(first, tail), (0, count - tail)])
    }

    /// Drop all bookkeeping and empty the slots. The LOOP jump slot is kept.
    pub fn reset(&mut self) {
        for slot in &self.slots[..self.capacity] {
            slot.clear();
        }
        self.head = 0;
        self.pending = 0;
        self.added = 0;
        self.last = None;
        self.closed = false;
    }

    #[cfg(test)]
    pub fn slot(&self, index: usize) -> &DescriptorSlot {
        &self.slots[index]
    }
}
