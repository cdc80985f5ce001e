//! Hardware descriptor storage.
//!
//! Ring slots are shared with the DMA engine, so every field is accessed
//! through [`VolatileCell`] and the CPU never holds a plain reference into a
//! word the engine may be reading.

pub mod bits;
mod slot;

pub use slot::DescriptorSlot;
#[cfg(test)]
pub(crate) use slot::SlotContent;

/// Volatile cell wrapper for descriptor words
///
/// All reads and writes go through `read_volatile`/`write_volatile` so the
/// compiler cannot merge, elide or reorder them relative to each other.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: accesses are single aligned words, which the bus performs atomically.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    #[inline(always)]
    pub fn get(&self) -> T {
        // SAFETY: the pointer comes from a live UnsafeCell owned by self.
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    #[inline(always)]
    pub fn set(&self, value: T) {
        // SAFETY: as above; UnsafeCell permits mutation through &self.
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Read-modify-write. Not atomic with respect to the engine.
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        self.set(f(self.get()));
    }
}

impl<T: Copy + Default> Default for VolatileCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
