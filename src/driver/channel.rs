//! iDMA channel driver.
//!
//! A [`Channel`] owns the register access for one engine channel and borrows
//! the descriptor storage it is bound to. Descriptors are written into the
//! ring by the `add_*` methods, handed to the engine by [`Channel::schedule`],
//! and observed either by polling ([`Channel::status`]) or from the interrupt
//! handler ([`Channel::on_interrupt`]).
//!
//! # Example
//!
//! ```ignore
//! static mut SLOTS: [DescriptorSlot; 5] = [const { DescriptorSlot::new() }; 5];
//!
//! let hal = unsafe { MmioIdma::new(IDMA_BASE, NoIrq) };
//! let mut ch = Channel::new(0, hal)?;
//! ch.init(ChannelConfig::new())?;
//! ch.init_loop(unsafe { &mut *addr_of_mut!(SLOTS) }, DescriptorKind::OneD, 4, None)?;
//!
//! ch.add_descriptor(dst, src, 256, DescFlags::NONE)?;
//! ch.schedule(1)?;
//! ch.wait_all(&mut delay, 1_000)?;
//! ```

use core::sync::atomic::{Ordering, fence};

use embedded_hal::delay::DelayNs;

use super::config::{ChannelConfig, ChannelState, RingMode};
use super::interrupt::{ChannelEvent, CompletionHandler, InterruptStatus, fault_kind_from_bits};
use crate::constants::{
    DEFAULT_POLL_INTERVAL_US, DESCRIPTOR_SIZE, MAX_CHANNELS, MAX_SCHEDULE_PER_WRITE, RESET_TIMEOUT,
};
use crate::descriptor::{DescFlags, Descriptor, DescriptorKind, DmaAddr};
use crate::error::{ChannelError, ConfigError, ConfigResult, Error, RingError, Result, TransferFault};
use crate::hal::IdmaHal;
use crate::internal::descriptor::DescriptorSlot;
use crate::internal::ring::{DescriptorRing, ring_storage_len};
use crate::register::Reg;
use crate::register::channel::{
    CONTROL_ENABLE, CONTROL_RESET, ChannelRegisters, EngineState, STATUS_ALL_INTERRUPTS,
    STATUS_ERR_MASK,
};

#[cfg(feature = "log")]
use log::{debug, warn};

/// Value returned by [`Channel::raw_status`] when the channel has faulted.
pub const STATUS_ERROR: i32 = -1;

/// Progress of the work scheduled on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelStatus {
    /// Descriptors still outstanding in the engine
    Pending(usize),
    /// Everything scheduled has completed
    Done,
    /// The engine stopped on a fault
    Error(TransferFault),
}

/// Aggregate state of a TASK ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskStatus {
    /// Descriptors added or scheduled but not yet complete
    Pending(usize),
    /// Every descriptor of the task completed
    Done,
    /// The task was dropped by `reset` or `abort`
    Aborted,
    /// The engine faulted while running the task
    Error,
}

/// Driver for one iDMA channel.
///
/// `'a` is the lifetime of the bound descriptor storage and completion
/// handler. The channel never owns either.
pub struct Channel<'a, H: IdmaHal> {
    id: usize,
    hal: H,
    config: ChannelConfig,
    state: ChannelState,
    ring: Option<DescriptorRing<'a>>,
    handler: Option<&'a mut (dyn CompletionHandler + Send)>,
    last_error: Option<TransferFault>,
    paused: bool,
    task_aborted: bool,
    /// Outstanding count captured by `save_registers`
    saved_outstanding: Option<usize>,
}

impl<'a, H: IdmaHal> Channel<'a, H> {
    /// Create a driver for channel `id`. The hardware is not touched.
    pub fn new(id: usize, hal: H) -> ConfigResult<Self> {
        if id >= MAX_CHANNELS {
            return Err(ConfigError::InvalidChannel);
        }
        Ok(Self {
            id,
            hal,
            config: ChannelConfig::new(),
            state: ChannelState::Uninitialized,
            ring: None,
            handler: None,
            last_error: None,
            paused: false,
            task_aborted: false,
            saved_outstanding: None,
        })
    }

    /// Channel index
    #[inline(always)]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Current lifecycle state
    #[inline(always)]
    pub const fn state(&self) -> ChannelState {
        self.state
    }

    /// Configuration applied by the last `init`
    #[inline(always)]
    pub const fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Whether the engine is paused
    #[inline(always)]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Mode of the bound ring, if any
    pub fn ring_mode(&self) -> Option<RingMode> {
        self.ring.as_ref().map(DescriptorRing::mode)
    }

    /// Give the register interface back, dropping the ring binding.
    pub fn release(self) -> H {
        self.hal
    }

    // =========================================================================
    // Register Access
    // =========================================================================

    #[inline(always)]
    fn read(&mut self, reg: Reg) -> u32 {
        self.hal.read_reg(self.id, reg)
    }

    #[inline(always)]
    fn write(&mut self, reg: Reg, value: u32) {
        self.hal.write_reg(self.id, reg, value);
    }

    fn modify(&mut self, reg: Reg, f: impl FnOnce(u32) -> u32) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Descriptors the engine has not completed yet.
    ///
    /// Reads the hardware counter, which also reflects the engine's progress
    /// since the last read.
    pub fn outstanding(&mut self) -> usize {
        self.read(Reg::NumDesc) as usize
    }

    /// Add `count` to the hardware counter, split into register-sized writes.
    fn arm(&mut self, count: usize) {
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(MAX_SCHEDULE_PER_WRITE);
            self.write(Reg::NumDescIncr, chunk as u32);
            remaining -= chunk;
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Reset the channel and apply `config`.
    ///
    /// Any previously bound ring is released. Interrupt lines named in the
    /// configuration are enabled through the HAL.
    ///
    /// # Errors
    /// - `Faulted` - channel is in ERROR, call `reset` instead
    /// - `ChannelBusy` - descriptors still outstanding
    /// - `Timeout` - the engine did not leave reset
    /// - `InterruptUnavailable` - an interrupt line could not be enabled
    pub fn init(&mut self, config: ChannelConfig) -> Result<()> {
        let state = self.state;
        match state {
            ChannelState::Error => return Err(ChannelError::Faulted.into()),
            ChannelState::Scheduled(_) if self.outstanding() > 0 => {
                return Err(ChannelError::ChannelBusy.into());
            }
            _ => {}
        }

        if self.state != ChannelState::Uninitialized {
            self.disable_interrupts();
        }
        self.state = ChannelState::Uninitialized;
        self.ring = None;
        self.handler = None;

        self.reset_engine()?;
        self.config = config;
        self.program();
        self.enable_interrupts()?;

        self.state = ChannelState::Idle;
        self.paused = false;
        self.saved_outstanding = None;

        #[cfg(feature = "log")]
        debug!(
            "idma ch{}: init settings={:#010x} timeout={:#010x}",
            self.id,
            self.config.to_settings(),
            self.config.to_timeout()
        );

        Ok(())
    }

    /// Pulse the channel reset and wait for it to self-clear.
    fn reset_engine(&mut self) -> Result<()> {
        self.write(Reg::Control, CONTROL_RESET);
        for _ in 0..RESET_TIMEOUT {
            if self.read(Reg::Control) & CONTROL_RESET == 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(ChannelError::Timeout.into())
    }

    /// Write the configuration registers and enable the engine.
    fn program(&mut self) {
        let config = self.config;
        self.write(Reg::Settings, config.to_settings());
        self.write(Reg::Timeout, config.to_timeout());
        self.write(Reg::UserPriv, config.to_userpriv());
        self.write(Reg::Status, STATUS_ALL_INTERRUPTS);
        self.write(Reg::Control, CONTROL_ENABLE);
    }

    fn enable_interrupts(&mut self) -> Result<()> {
        let (done, error) = (self.config.done_irq, self.config.error_irq);
        if let Some(line) = done {
            self.hal.enable_interrupt(line)?;
        }
        if let Some(line) = error {
            if let Err(e) = self.hal.enable_interrupt(line) {
                if let Some(done) = done {
                    self.hal.disable_interrupt(done);
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn disable_interrupts(&mut self) {
        for line in [self.config.done_irq, self.config.error_irq]
            .into_iter()
            .flatten()
        {
            self.hal.disable_interrupt(line);
        }
    }

    // =========================================================================
    // Ring Binding
    // =========================================================================

    /// Bind `storage` as a circular ring of `capacity` descriptors.
    ///
    /// `storage` must hold `capacity + 1` slots; the last one becomes the jump
    /// back to slot 0. `handler` receives completion events from
    /// [`Channel::on_interrupt`]; pass `None` for a polling-only channel.
    pub fn init_loop(
        &mut self,
        storage: &'a mut [DescriptorSlot],
        kind: DescriptorKind,
        capacity: usize,
        handler: Option<&'a mut (dyn CompletionHandler + Send)>,
    ) -> Result<()> {
        self.bind(storage, kind, capacity, RingMode::Loop, handler)
    }

    /// Bind `storage` as a one-shot task of exactly `capacity` descriptors.
    pub fn init_task(
        &mut self,
        storage: &'a mut [DescriptorSlot],
        kind: DescriptorKind,
        capacity: usize,
        handler: Option<&'a mut (dyn CompletionHandler + Send)>,
    ) -> Result<()> {
        self.bind(storage, kind, capacity, RingMode::Task, handler)
    }

    fn bind(
        &mut self,
        storage: &'a mut [DescriptorSlot],
        kind: DescriptorKind,
        capacity: usize,
        mode: RingMode,
        handler: Option<&'a mut (dyn CompletionHandler + Send)>,
    ) -> Result<()> {
        self.check_ready()?;
        if self.ring.is_some() && self.outstanding() > 0 {
            return Err(ChannelError::ChannelBusy.into());
        }

        kind.check_supported()?;
        let slots = ring_storage_len(capacity, mode);
        if capacity == 0 || storage.len() < slots {
            return Err(ConfigError::CapacityInvalid.into());
        }
        let base = self
            .hal
            .dma_address(storage.as_ptr().cast(), slots * DESCRIPTOR_SIZE);
        let ring = DescriptorRing::new(storage, base, kind, capacity, mode)?;

        self.hal
            .writeback_region(ring.slot_ptr(0), ring.storage_bytes());
        self.write(Reg::DescStartAdrs, base);

        #[cfg(feature = "log")]
        debug!(
            "idma ch{}: bound {:?} ring kind={:?} capacity={} base={:#010x}",
            self.id, mode, kind, capacity, base
        );

        self.ring = Some(ring);
        self.handler = handler;
        self.task_aborted = false;
        self.state = ChannelState::Idle;
        Ok(())
    }

    fn check_ready(&self) -> Result<()> {
        match self.state {
            ChannelState::Uninitialized => Err(ChannelError::NotInitialized.into()),
            ChannelState::Error => Err(ChannelError::Faulted.into()),
            _ => Ok(()),
        }
    }

    /// Aborted tasks, and tasks already handed to the engine in full, take
    /// no more work.
    fn check_open(&self) -> Result<()> {
        if self.task_aborted || self.ring.as_ref().is_some_and(DescriptorRing::is_closed) {
            return Err(ChannelError::InvalidState.into());
        }
        Ok(())
    }

    fn ring_mut(&mut self) -> Result<&mut DescriptorRing<'a>> {
        self.ring.as_mut().ok_or(Error::Ring(RingError::NotBound))
    }

    /// Slots that can be added before the ring is full.
    pub fn free_slots(&mut self) -> usize {
        if self.ring.is_none() {
            return 0;
        }
        let outstanding = self.outstanding();
        self.ring.as_ref().map_or(0, |ring| ring.free(outstanding))
    }

    // =========================================================================
    // Adding Descriptors
    // =========================================================================

    /// Write `desc` into the next free slot and return the slot index.
    ///
    /// # Errors
    /// - `RingFull` - no free slot; the ring is unchanged
    /// - `KindMismatch` - `desc` does not fit the ring's descriptor kind
    /// - `NotBound` - no ring bound
    pub fn add(&mut self, desc: &Descriptor) -> Result<usize> {
        self.check_ready()?;
        self.check_open()?;
        if !desc.kind().fits_in(self.ring_mut()?.kind()) {
            return Err(ConfigError::KindMismatch.into());
        }
        let outstanding = self.outstanding();
        Ok(self.ring_mut()?.push(desc, outstanding)?)
    }

    /// Add a contiguous copy of `length` bytes.
    pub fn add_descriptor(
        &mut self,
        dst: u32,
        src: u32,
        length: u32,
        flags: DescFlags,
    ) -> Result<usize> {
        self.add(&Descriptor::new_1d(dst, src, length, flags)?)
    }

    /// Add a 2D copy of `rows` rows with independent pitches.
    pub fn add_2d_descriptor(
        &mut self,
        dst: u32,
        src: u32,
        row_length: u32,
        flags: DescFlags,
        rows: u32,
        src_pitch: u32,
        dst_pitch: u32,
    ) -> Result<usize> {
        self.add(&Descriptor::new_2d(
            dst, src, row_length, flags, rows, src_pitch, dst_pitch,
        )?)
    }

    /// Add a contiguous copy with 36-bit addresses.
    pub fn add_desc_wide(
        &mut self,
        dst: DmaAddr,
        src: DmaAddr,
        length: u32,
        flags: DescFlags,
    ) -> Result<usize> {
        self.add(&Descriptor::new_1d_wide(dst, src, length, flags)?)
    }

    /// Copy the previously added descriptor into the next slot.
    pub fn add_repeat(&mut self) -> Result<usize> {
        self.check_ready()?;
        self.check_open()?;
        self.ring_mut()?;
        let outstanding = self.outstanding();
        Ok(self.ring_mut()?.repeat(outstanding)?)
    }

    /// Change the source of the most recently added, unscheduled descriptor.
    pub fn update_pending_src(&mut self, src: impl Into<DmaAddr>) -> Result<()> {
        Ok(self.ring_mut()?.last_pending()?.set_src(src.into())?)
    }

    /// Change the destination of the most recently added, unscheduled
    /// descriptor.
    pub fn update_pending_dst(&mut self, dst: impl Into<DmaAddr>) -> Result<()> {
        Ok(self.ring_mut()?.last_pending()?.set_dst(dst.into())?)
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Hand the oldest `count` added descriptors to the engine.
    ///
    /// The slots are written back from cache and fenced before the counter
    /// write. A successful schedule clears the recorded fault.
    ///
    /// # Errors
    /// - `Faulted` - the engine is in ERROR
    /// - `ScheduleOverflow` - fewer than `count` descriptors are pending
    /// - `InvalidState` - the bound task was already scheduled in full
    /// - `NotBound` - no ring bound
    pub fn schedule(&mut self, count: usize) -> Result<()> {
        self.check_ready()?;
        let raw = self.read(Reg::Status);
        if EngineState::from_status(raw) == EngineState::Error {
            self.capture_fault(raw);
            return Err(ChannelError::Faulted.into());
        }

        if count == 0 {
            self.ring_mut()?;
            return Ok(());
        }
        self.check_open()?;
        let ring = self.ring.as_mut().ok_or(RingError::NotBound)?;
        let runs = ring.commit(count)?;
        for (first, len) in runs {
            if len > 0 {
                self.hal
                    .writeback_region(ring.slot_ptr(first), len * DESCRIPTOR_SIZE);
            }
        }
        fence(Ordering::SeqCst);
        self.arm(count);

        self.state = match self.state {
            ChannelState::Scheduled(n) => ChannelState::Scheduled(n + count),
            _ => ChannelState::Scheduled(count),
        };
        self.last_error = None;

        #[cfg(feature = "log")]
        debug!("idma ch{}: scheduled {}", self.id, count);

        Ok(())
    }

    /// Schedule every pending descriptor of a TASK ring.
    ///
    /// The task is then closed: further adds and schedules fail with
    /// `InvalidState` until a new task is bound.
    pub fn schedule_task(&mut self) -> Result<()> {
        let ring = self.ring.as_ref().ok_or(RingError::NotBound)?;
        if ring.mode() != RingMode::Task || ring.is_closed() {
            return Err(ChannelError::InvalidState.into());
        }
        let pending = ring.pending();
        self.schedule(pending)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Poll the engine. Never blocks.
    pub fn status(&mut self) -> ChannelStatus {
        if self.state == ChannelState::Uninitialized {
            return ChannelStatus::Done;
        }
        let outstanding = self.outstanding();
        let raw = self.read(Reg::Status);
        if EngineState::from_status(raw) == EngineState::Error {
            return ChannelStatus::Error(self.capture_fault(raw));
        }
        self.note_outstanding(outstanding);
        if outstanding == 0 {
            ChannelStatus::Done
        } else {
            ChannelStatus::Pending(outstanding)
        }
    }

    /// Poll the engine as a signed count: outstanding descriptors, 0 when
    /// done, [`STATUS_ERROR`] on fault.
    pub fn raw_status(&mut self) -> i32 {
        match self.status() {
            ChannelStatus::Pending(n) => i32::try_from(n).unwrap_or(i32::MAX),
            ChannelStatus::Done => 0,
            ChannelStatus::Error(_) => STATUS_ERROR,
        }
    }

    /// Aggregate status of the bound TASK ring.
    ///
    /// Pending counts include descriptors added but not yet scheduled.
    pub fn task_status(&mut self) -> Result<TaskStatus> {
        if self.task_aborted {
            return Ok(TaskStatus::Aborted);
        }
        match self.ring_mode() {
            None => return Err(RingError::NotBound.into()),
            Some(RingMode::Loop) => return Err(ChannelError::InvalidState.into()),
            Some(RingMode::Task) => {}
        }
        let status = self.status();
        let pending = self.ring.as_ref().map_or(0, DescriptorRing::pending);
        Ok(match status {
            ChannelStatus::Error(_) => TaskStatus::Error,
            ChannelStatus::Pending(n) => TaskStatus::Pending(n + pending),
            ChannelStatus::Done if pending > 0 => TaskStatus::Pending(pending),
            ChannelStatus::Done => TaskStatus::Done,
        })
    }

    /// The last fault, kept until the next successful schedule.
    pub const fn error_details(&self) -> Option<TransferFault> {
        self.last_error
    }

    fn note_outstanding(&mut self, outstanding: usize) {
        if let ChannelState::Scheduled(_) = self.state {
            self.state = if outstanding == 0 {
                ChannelState::Idle
            } else {
                ChannelState::Scheduled(outstanding)
            };
        }
    }

    /// Decode the latched fault registers. A fault already recorded for the
    /// current ERROR state is returned unchanged.
    fn capture_fault(&mut self, status: u32) -> TransferFault {
        if let (ChannelState::Error, Some(fault)) = (self.state, self.last_error) {
            return fault;
        }

        let desc_addr = self.read(Reg::CurrDescAdrs);
        let fault = TransferFault {
            kind: fault_kind_from_bits(status & STATUS_ERR_MASK),
            raw: status & STATUS_ERR_MASK,
            desc_index: self.ring.as_ref().and_then(|ring| ring.index_of(desc_addr)),
            desc_addr,
            src_addr: self.read(Reg::SrcAdrs),
            src_segment: self.read(Reg::SrcAdrsHi) as u8,
            dst_addr: self.read(Reg::DstAdrs),
            dst_segment: self.read(Reg::DstAdrsHi) as u8,
        };

        #[cfg(feature = "log")]
        warn!("idma ch{}: transfer fault: {}", self.id, fault);

        self.last_error = Some(fault);
        self.state = ChannelState::Error;
        fault
    }

    // =========================================================================
    // Interrupt Handling
    // =========================================================================

    /// Interrupt entry point. Call from the channel's ISR.
    ///
    /// Reads and acknowledges the status register, then delivers a
    /// [`ChannelEvent`] to the bound handler, if any.
    pub fn on_interrupt(&mut self) -> InterruptStatus {
        let raw = self.read(Reg::Status);
        let status = InterruptStatus::from_raw(raw);
        if status.any() {
            self.write(Reg::Status, status.to_raw());
        }

        let event = if status.has_error() {
            Some(ChannelEvent::Error(self.capture_fault(raw)))
        } else if status.done {
            let remaining = self.outstanding();
            self.note_outstanding(remaining);
            Some(ChannelEvent::Done { remaining })
        } else {
            None
        };

        if let (Some(event), Some(handler)) = (event, self.handler.as_deref_mut()) {
            handler.on_event(self.id, event);
        }
        status
    }

    // =========================================================================
    // Pause / Resume
    // =========================================================================

    /// Stop the engine at the next descriptor boundary.
    pub fn pause(&mut self) -> Result<()> {
        if self.state == ChannelState::Uninitialized {
            return Err(ChannelError::NotInitialized.into());
        }
        self.modify(Reg::Control, |v| v & !CONTROL_ENABLE);
        self.paused = true;
        Ok(())
    }

    /// Continue after [`Channel::pause`].
    pub fn resume(&mut self) -> Result<()> {
        if self.state == ChannelState::Uninitialized {
            return Err(ChannelError::NotInitialized.into());
        }
        self.modify(Reg::Control, |v| v | CONTROL_ENABLE);
        self.paused = false;
        Ok(())
    }

    // =========================================================================
    // Power State
    // =========================================================================

    /// Capture the channel registers before powering the engine down.
    ///
    /// Pause first so the descriptor pointer and counter stay consistent.
    pub fn save_registers(&mut self) -> ChannelRegisters {
        let outstanding = self.outstanding();
        let mut values = [0u32; 5];
        for (value, reg) in values.iter_mut().zip(ChannelRegisters::ORDER) {
            *value = self.read(reg);
        }
        self.saved_outstanding = Some(outstanding);
        ChannelRegisters::from_values(values)
    }

    /// Write back a record taken by [`Channel::save_registers`].
    ///
    /// All five registers are written in save order. After a power loss the
    /// saved descriptor pointer is restored and descriptors that were
    /// outstanding at save time are re-armed. If the engine kept its state,
    /// its live descriptor pointer and counter are left as they are, so
    /// nothing that completed since the save runs again.
    pub fn restore_registers(&mut self, regs: &ChannelRegisters) {
        let lost_power = self.lost_power(regs);
        let current = self.outstanding();
        let live_start = self.read(Reg::DescStartAdrs);
        for (reg, value) in ChannelRegisters::ORDER.into_iter().zip(regs.values()) {
            let value = if reg == Reg::DescStartAdrs && !lost_power {
                live_start
            } else {
                value
            };
            self.write(reg, value);
        }
        if let Some(saved) = self.saved_outstanding.take() {
            if lost_power && saved > current {
                self.arm(saved - current);
            }
        }
        self.paused = regs.control & CONTROL_ENABLE == 0;

        #[cfg(feature = "log")]
        debug!(
            "idma ch{}: restored registers (power lost: {})",
            self.id, lost_power
        );
    }

    /// The engine never changes the configuration registers, and they read
    /// zero after power-up. Any mismatch, or a cleared descriptor pointer,
    /// means the channel lost its state.
    fn lost_power(&mut self, regs: &ChannelRegisters) -> bool {
        self.read(Reg::Settings) != regs.settings
            || self.read(Reg::Timeout) != regs.timeout
            || self.read(Reg::UserPriv) != regs.userpriv
            || (regs.desc_start != 0 && self.read(Reg::DescStartAdrs) == 0)
    }

    // =========================================================================
    // Reset / Abort
    // =========================================================================

    /// Re-initialize the channel with its current configuration.
    ///
    /// Drops all outstanding and pending work and empties the bound ring. The
    /// recorded fault stays readable until the next successful schedule.
    /// A TASK ring that still had work is marked aborted.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == ChannelState::Uninitialized {
            return Err(ChannelError::NotInitialized.into());
        }
        let had_work =
            self.outstanding() > 0 || self.ring.as_ref().is_some_and(|ring| ring.pending() > 0);
        if had_work && self.ring_mode() == Some(RingMode::Task) {
            self.task_aborted = true;
        }

        self.reset_engine()?;
        self.program();
        if let Some(ring) = self.ring.as_mut() {
            ring.reset();
            self.hal
                .writeback_region(ring.slot_ptr(0), ring.storage_bytes());
            self.hal
                .write_reg(self.id, Reg::DescStartAdrs, ring.base_addr());
        }

        self.state = ChannelState::Idle;
        self.paused = false;
        self.saved_outstanding = None;

        #[cfg(feature = "log")]
        debug!("idma ch{}: reset", self.id);

        Ok(())
    }

    /// Reset the channel and unbind its ring and handler.
    ///
    /// A bound TASK ring reports [`TaskStatus::Aborted`] until a new ring is
    /// bound.
    pub fn abort(&mut self) -> Result<()> {
        self.reset()?;
        if self.ring.take().is_some_and(|ring| ring.mode() == RingMode::Task) {
            self.task_aborted = true;
        }
        self.handler = None;
        Ok(())
    }

    // =========================================================================
    // Blocking Helpers
    // =========================================================================

    /// Spin until everything scheduled has completed.
    ///
    /// Polls every [`DEFAULT_POLL_INTERVAL_US`] microseconds.
    ///
    /// # Errors
    /// - `Transfer` - the engine faulted
    /// - `Timeout` - work still outstanding after `timeout_us`
    pub fn wait_all<D: DelayNs>(&mut self, delay: &mut D, timeout_us: u32) -> Result<()> {
        let mut waited = 0u32;
        loop {
            match self.status() {
                ChannelStatus::Done => return Ok(()),
                ChannelStatus::Error(fault) => return Err(Error::Transfer(fault)),
                ChannelStatus::Pending(_) => {}
            }
            if waited >= timeout_us {
                return Err(ChannelError::Timeout.into());
            }
            delay.delay_us(DEFAULT_POLL_INTERVAL_US);
            waited = waited.saturating_add(DEFAULT_POLL_INTERVAL_US);
        }
    }

    // =========================================================================
    // Data Buffers
    // =========================================================================

    /// Write a source buffer back from the data cache before scheduling a
    /// transfer that reads it.
    pub fn flush_source(&mut self, buf: &[u8]) {
        self.hal.writeback_region(buf.as_ptr(), buf.len());
    }

    /// Discard cached lines over a destination buffer after the engine has
    /// written it.
    pub fn invalidate_destination(&mut self, buf: &[u8]) {
        self.hal.invalidate_region(buf.as_ptr(), buf.len());
    }
}

impl<H: IdmaHal> core::fmt::Debug for Channel<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("mode", &self.ring_mode())
            .field("paused", &self.paused)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
