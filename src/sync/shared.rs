//! ISR-safe channel wrapper using critical sections.
//!
//! [`SharedChannel`] lets a thread-mode task and the channel's interrupt
//! handler reach the same [`Channel`] without `static mut`.

use super::primitives::CriticalSectionCell;
use crate::driver::channel::{Channel, ChannelStatus};
use crate::driver::interrupt::InterruptStatus;
use crate::hal::IdmaHal;

/// ISR-safe [`Channel`] slot.
///
/// The slot starts empty so it can live in a `static`; install the channel
/// once it has been created. All access goes through
/// `critical_section::with()`, disabling interrupts for the duration of the
/// closure.
///
/// # Example
///
/// ```ignore
/// static CH0: SharedChannel<'static, MmioIdma<NoIrq>> = SharedChannel::new();
///
/// CH0.install(Channel::new(0, hal)?);
/// CH0.with(|ch| ch.schedule(1));
///
/// #[interrupt]
/// fn IDMA_DONE() {
///     CH0.on_interrupt();
/// }
/// ```
pub struct SharedChannel<'a, H: IdmaHal> {
    inner: CriticalSectionCell<Option<Channel<'a, H>>>,
}

impl<'a, H: IdmaHal> SharedChannel<'a, H> {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
        }
    }

    /// Place `channel` in the slot, returning whatever was there before.
    pub fn install(&self, channel: Channel<'a, H>) -> Option<Channel<'a, H>> {
        self.inner.with(|slot| slot.replace(channel))
    }

    /// Remove the channel from the slot.
    pub fn take(&self) -> Option<Channel<'a, H>> {
        self.inner.with(Option::take)
    }

    /// Whether a channel has been installed.
    pub fn is_installed(&self) -> bool {
        self.inner.with(|slot| slot.is_some())
    }

    /// Execute a closure with exclusive access to the channel.
    ///
    /// Returns `None` when no channel is installed.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Channel<'a, H>) -> R,
    {
        self.inner.with(|slot| slot.as_mut().map(f))
    }

    /// Like [`SharedChannel::with`], but returns `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Channel<'a, H>) -> R,
    {
        self.inner.try_with(|slot| slot.as_mut().map(f)).flatten()
    }

    /// Poll the installed channel's status.
    pub fn status(&self) -> Option<ChannelStatus> {
        self.with(Channel::status)
    }

    /// Service a channel interrupt.
    ///
    /// Call this from the done and error interrupt handlers. With the
    /// `async` feature it also wakes any task awaiting the channel.
    pub fn on_interrupt(&self) -> Option<InterruptStatus> {
        let serviced = self.with(|ch| (ch.id(), ch.on_interrupt()));

        #[cfg(feature = "async")]
        if let Some((id, _)) = serviced {
            super::asynch::CHANNEL_WAKER.wake(id);
        }

        serviced.map(|(_, status)| status)
    }
}

impl<H: IdmaHal> Default for SharedChannel<'_, H> {
    fn default() -> Self {
        Self::new()
    }
}
