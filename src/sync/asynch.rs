//! Async/await support for iDMA channels.
//!
//! Each channel has a waker slot in [`CHANNEL_WAKER`].
//! [`SharedChannel::on_interrupt`] wakes the slot of the channel it
//! serviced, so a task awaiting [`wait_idle`] resumes once the engine
//! reports completion or a fault.

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll, Waker},
};

use super::primitives::AtomicWaker;
use super::shared::SharedChannel;
use crate::constants::MAX_CHANNELS;
use crate::driver::channel::ChannelStatus;
use crate::error::{ChannelError, Error, Result};
use crate::hal::IdmaHal;

/// Per-channel waker slots.
pub struct ChannelWaker {
    wakers: [AtomicWaker; MAX_CHANNELS],
}

impl ChannelWaker {
    /// Create empty slots (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            wakers: [const { AtomicWaker::new() }; MAX_CHANNELS],
        }
    }

    /// Register `waker` for `channel`. Out-of-range channels are ignored.
    pub fn register(&self, channel: usize, waker: &Waker) {
        if let Some(slot) = self.wakers.get(channel) {
            slot.register(waker);
        }
    }

    /// Wake the task waiting on `channel`, if any.
    #[inline]
    pub fn wake(&self, channel: usize) {
        if let Some(slot) = self.wakers.get(channel) {
            slot.wake();
        }
    }

    /// Wake every waiting task.
    pub fn wake_all(&self) {
        for slot in &self.wakers {
            slot.wake();
        }
    }
}

impl Default for ChannelWaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Wakers for all channels, driven by [`SharedChannel::on_interrupt`].
pub static CHANNEL_WAKER: ChannelWaker = ChannelWaker::new();

/// Future that resolves once the channel has drained or faulted.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WaitIdle<'s, 'a, H: IdmaHal> {
    shared: &'s SharedChannel<'a, H>,
}

impl<'s, 'a, H: IdmaHal> WaitIdle<'s, 'a, H> {
    /// Create a new wait future.
    pub fn new(shared: &'s SharedChannel<'a, H>) -> Self {
        Self { shared }
    }

    fn check(&self) -> Poll<Result<()>> {
        match self.shared.status() {
            None => Poll::Ready(Err(ChannelError::NotInitialized.into())),
            Some(ChannelStatus::Done) => Poll::Ready(Ok(())),
            Some(ChannelStatus::Error(fault)) => Poll::Ready(Err(Error::Transfer(fault))),
            Some(ChannelStatus::Pending(_)) => Poll::Pending,
        }
    }
}

impl<H: IdmaHal> Future for WaitIdle<'_, '_, H> {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Poll::Ready(result) = self.check() {
            return Poll::Ready(result);
        }

        // Register before re-checking so a completion between the two
        // polls still wakes us.
        let Some(id) = self.shared.with(|ch| ch.id()) else {
            return Poll::Ready(Err(ChannelError::NotInitialized.into()));
        };
        CHANNEL_WAKER.register(id, cx.waker());
        self.check()
    }
}

/// Wait until every scheduled descriptor on `shared` has completed.
///
/// # Errors
/// - `NotInitialized` - no channel installed
/// - `Transfer` - the engine stopped on a fault
pub fn wait_idle<'s, 'a, H: IdmaHal>(shared: &'s SharedChannel<'a, H>) -> WaitIdle<'s, 'a, H> {
    WaitIdle::new(shared)
}

/// Reset all async state (call when reinitializing channels).
pub fn reset_async_state() {
    CHANNEL_WAKER.wake_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescFlags, DescriptorKind};
    use crate::driver::channel::Channel;
    use crate::driver::config::ChannelConfig;
    use crate::error::FaultKind;
    use crate::internal::descriptor::DescriptorSlot;
    use crate::sync::primitives::tests::{WakeCounter, counting_waker};
    use crate::test_utils::MockIdma;

    // The static slots are shared by every test: only channel 3 is used
    // there. Waker behaviour is exercised on local instances.
    const FUTURE_CH: usize = 3;

    #[test]
    fn channel_wakers_are_independent() {
        let wakers = ChannelWaker::new();
        let first = WakeCounter::new();
        let second = WakeCounter::new();
        wakers.register(1, &counting_waker(first.clone()));
        wakers.register(2, &counting_waker(second.clone()));

        wakers.wake(1);
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 0);

        wakers.wake_all();
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let counter = WakeCounter::new();
        let wakers = ChannelWaker::default();
        wakers.register(MAX_CHANNELS, &counting_waker(counter.clone()));
        wakers.wake(MAX_CHANNELS);
        wakers.wake_all();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn wait_idle_without_channel_fails() {
        let shared: SharedChannel<'_, &MockIdma> = SharedChannel::new();
        let counter = WakeCounter::new();
        let waker = counting_waker(counter);
        let mut cx = Context::from_waker(&waker);
        let mut fut = core::pin::pin!(wait_idle(&shared));
        assert_eq!(
            fut.as_mut().poll(&mut cx),
            Poll::Ready(Err(Error::Channel(ChannelError::NotInitialized)))
        );
    }

    #[test]
    fn wait_idle_wakes_on_interrupt() {
        let mock = MockIdma::new();
        let src = mock.alloc_with(&[9; 16]);
        let dst = mock.alloc(16);
        let mut slots = [const { DescriptorSlot::new() }; 3];
        let slots: &mut [DescriptorSlot] = &mut slots;

        let shared = SharedChannel::new();
        shared.install(Channel::new(FUTURE_CH, &mock).unwrap());
        mock.set_stalled(FUTURE_CH, true);
        shared
            .with(move |ch| {
                ch.init(ChannelConfig::new())?;
                ch.init_loop(slots, DescriptorKind::OneD, 2, None)?;
                ch.add_descriptor(dst, src, 16, DescFlags::INTERRUPT)?;
                ch.schedule(1)
            })
            .unwrap()
            .unwrap();

        let counter = WakeCounter::new();
        let waker = counting_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);
        let mut fut = core::pin::pin!(wait_idle(&shared));
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(counter.count(), 0);

        mock.set_stalled(FUTURE_CH, false);
        mock.run(FUTURE_CH);
        assert!(shared.on_interrupt().is_some());
        assert_eq!(counter.count(), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
    }

    #[test]
    fn wait_idle_reports_fault() {
        let mock = MockIdma::new();
        let src = mock.alloc_with(&[1; 8]);
        let dst = mock.alloc(8);
        let mut slots = [const { DescriptorSlot::new() }; 3];
        let slots: &mut [DescriptorSlot] = &mut slots;

        let shared = SharedChannel::new();
        shared.install(Channel::new(FUTURE_CH, &mock).unwrap());
        shared
            .with(move |ch| {
                ch.init(ChannelConfig::new())?;
                ch.init_loop(slots, DescriptorKind::OneD, 2, None)
            })
            .unwrap()
            .unwrap();
        mock.inject_fault(FUTURE_CH, FaultKind::SourceBus);
        shared
            .with(|ch| {
                ch.add_descriptor(dst, src, 8, DescFlags::NONE)?;
                ch.schedule(1)
            })
            .unwrap()
            .unwrap();

        let counter = WakeCounter::new();
        let waker = counting_waker(counter);
        let mut cx = Context::from_waker(&waker);
        let mut fut = core::pin::pin!(wait_idle(&shared));
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(Err(Error::Transfer(fault))) => {
                assert_eq!(fault.kind, FaultKind::SourceBus);
            }
            other => panic!("unexpected poll result: {other:?}"),
        }
    }
}
