//! Testing utilities and mock implementations
//!
//! [`MockIdma`] is a software model of the engine: it owns simulated memory,
//! fetches descriptors out of host storage registered through `dma_address`,
//! and executes one descriptor each time the outstanding counter is read.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::vec;
use std::vec::Vec;

use crate::constants::{CHANNEL_REG_STRIDE, DESCRIPTOR_SIZE, MAX_CHANNELS};
use crate::descriptor::predicate::row_enabled;
use crate::descriptor::{DescFlags, Descriptor, DmaAddr, Shape};
use crate::driver::interrupt::fault_kind_to_bits;
use crate::error::{ConfigError, ConfigResult, FaultKind};
use crate::hal::IdmaHal;
use crate::internal::descriptor::{DescriptorSlot, SlotContent};
use crate::register::Reg;
use crate::register::channel::{
    CONTROL_ENABLE, CONTROL_RESET, EngineState, SETTINGS_ERR_INT_EN, STATUS_ALL_INTERRUPTS,
    STATUS_DONE_INT, STATUS_ERR_INT, STATUS_STATE_MASK,
};

/// Bus address where registered descriptor storage starts
pub const DESC_BUS_BASE: u32 = 0x6000_0000;
/// Bus address where local data allocations start
pub const LOCAL_BUS_BASE: u32 = 0x1000_0000;
/// Offset where system-memory allocations start within each segment
pub const SYSTEM_BUS_BASE: u32 = 0x0010_0000;

// Allocations are separated by an unmapped gap so stray accesses fault.
const ALLOC_GAP: u32 = 0x100;

fn align_up(len: usize) -> u32 {
    len.div_ceil(DESCRIPTOR_SIZE) as u32 * DESCRIPTOR_SIZE as u32
}

// =============================================================================
// Mock Engine
// =============================================================================

struct Region {
    segment: u8,
    base: u32,
    data: Vec<u8>,
}

struct DescRegion {
    bus: u32,
    host: usize,
    len: usize,
}

#[derive(Clone, Copy)]
struct ChannelModel {
    regs: [u32; CHANNEL_REG_STRIDE / 4],
    count: u32,
    injected: Option<FaultKind>,
    stalled: bool,
}

impl Default for ChannelModel {
    fn default() -> Self {
        Self {
            regs: [0; CHANNEL_REG_STRIDE / 4],
            count: 0,
            injected: None,
            stalled: false,
        }
    }
}

impl ChannelModel {
    fn reg(&self, reg: Reg) -> u32 {
        self.regs[reg.offset() / 4]
    }

    fn set(&mut self, reg: Reg, value: u32) {
        self.regs[reg.offset() / 4] = value;
    }

    fn set_state(&mut self, state: EngineState) {
        let status = self.reg(Reg::Status);
        self.set(Reg::Status, (status & !STATUS_STATE_MASK) | state.to_bits());
    }

    fn state(&self) -> EngineState {
        EngineState::from_status(self.reg(Reg::Status))
    }
}

#[derive(Default)]
struct MockState {
    channels: [ChannelModel; MAX_CHANNELS],
    regions: Vec<Region>,
    desc_regions: Vec<DescRegion>,
    next_local: u32,
    next_system: [u32; 16],
    next_desc: u32,
    enabled_lines: Vec<u16>,
    unavailable_lines: Vec<u16>,
    writebacks: usize,
    invalidates: usize,
    completed: Vec<(usize, u32)>,
}

/// Software model of the DMA engine
///
/// # Example
///
/// ```ignore
/// let mock = MockIdma::new();
/// let src = mock.alloc(64);
/// mock.write_mem(src.into(), &[0xAA; 64]);
/// let mut ch = Channel::new(0, &mock)?;
/// ```
#[derive(Default)]
pub struct MockIdma {
    state: RefCell<MockState>,
}

impl MockIdma {
    /// Create a new engine model with empty memory
    pub fn new() -> Self {
        let mock = Self::default();
        {
            let mut st = mock.state.borrow_mut();
            st.next_local = LOCAL_BUS_BASE;
            st.next_system = [SYSTEM_BUS_BASE; 16];
            st.next_desc = DESC_BUS_BASE;
        }
        mock
    }

    // =========================================================================
    // Simulated Memory
    // =========================================================================

    /// Allocate `len` zeroed bytes of local memory
    pub fn alloc(&self, len: usize) -> u32 {
        self.alloc_in(0, len).offset()
    }

    /// Allocate `len` zeroed bytes in `segment` (0 = local)
    pub fn alloc_in(&self, segment: u8, len: usize) -> DmaAddr {
        let mut st = self.state.borrow_mut();
        let cursor = if segment == 0 {
            &mut st.next_local
        } else {
            &mut st.next_system[segment as usize]
        };
        let base = *cursor;
        *cursor += align_up(len) + ALLOC_GAP;
        st.regions.push(Region {
            segment,
            base,
            data: vec![0; len],
        });
        DmaAddr::system(segment, base).expect("segment in range")
    }

    /// Copy `data` into simulated memory
    pub fn write_mem(&self, addr: DmaAddr, data: &[u8]) {
        let mut st = self.state.borrow_mut();
        let dst = st
            .mem_mut(addr.segment(), addr.offset(), data.len())
            .expect("write outside allocated memory");
        dst.copy_from_slice(data);
    }

    /// Read `len` bytes of simulated memory
    pub fn read_mem(&self, addr: DmaAddr, len: usize) -> Vec<u8> {
        let st = self.state.borrow();
        st.mem(addr.segment(), addr.offset(), len)
            .expect("read outside allocated memory")
            .to_vec()
    }

    /// Allocate local memory holding `data`
    pub fn alloc_with(&self, data: &[u8]) -> u32 {
        let addr = self.alloc(data.len());
        self.write_mem(addr.into(), data);
        addr
    }

    // =========================================================================
    // Inspection and Fault Injection
    // =========================================================================

    /// Peek at a register without side effects
    pub fn reg(&self, channel: usize, reg: Reg) -> u32 {
        let st = self.state.borrow();
        match reg {
            Reg::NumDesc => st.channels[channel].count,
            _ => st.channels[channel].reg(reg),
        }
    }

    /// Outstanding descriptor count, without advancing the engine
    pub fn outstanding(&self, channel: usize) -> u32 {
        self.reg(channel, Reg::NumDesc)
    }

    /// Make the next descriptor on `channel` fault with `kind`
    pub fn inject_fault(&self, channel: usize, kind: FaultKind) {
        self.state.borrow_mut().channels[channel].injected = Some(kind);
    }

    /// Stop or restart descriptor execution on `channel`
    pub fn set_stalled(&self, channel: usize, stalled: bool) {
        self.state.borrow_mut().channels[channel].stalled = stalled;
    }

    /// Drop all register state, as if the channel lost power
    pub fn power_cycle(&self, channel: usize) {
        self.state.borrow_mut().channels[channel] = ChannelModel::default();
    }

    /// Make `line` fail to enable
    pub fn set_line_unavailable(&self, line: u16) {
        self.state.borrow_mut().unavailable_lines.push(line);
    }

    /// Interrupt lines currently enabled
    pub fn enabled_lines(&self) -> Vec<u16> {
        self.state.borrow().enabled_lines.clone()
    }

    /// Whether `channel` has an interrupt pending
    pub fn irq_pending(&self, channel: usize) -> bool {
        self.reg(channel, Reg::Status) & STATUS_ALL_INTERRUPTS != 0
    }

    /// Number of cache writeback calls
    pub fn writebacks(&self) -> usize {
        self.state.borrow().writebacks
    }

    /// Number of cache invalidate calls
    pub fn invalidates(&self) -> usize {
        self.state.borrow().invalidates
    }

    /// Bus addresses of descriptors completed on `channel`, in order
    pub fn completed(&self, channel: usize) -> Vec<u32> {
        self.state
            .borrow()
            .completed
            .iter()
            .filter(|(ch, _)| *ch == channel)
            .map(|&(_, addr)| addr)
            .collect()
    }

    /// Run the engine until `channel` drains, faults or stops making progress
    pub fn run(&self, channel: usize) {
        let mut st = self.state.borrow_mut();
        while st.channels[channel].count > 0 && st.step(channel) {}
    }
}

impl MockState {
    fn mem(&self, segment: u8, addr: u32, len: usize) -> Option<&[u8]> {
        self.regions.iter().find_map(|r| {
            let off = addr.checked_sub(r.base)? as usize;
            (r.segment == segment && off + len <= r.data.len()).then(|| &r.data[off..off + len])
        })
    }

    fn mem_mut(&mut self, segment: u8, addr: u32, len: usize) -> Option<&mut [u8]> {
        self.regions.iter_mut().find_map(|r| {
            let off = addr.checked_sub(r.base)? as usize;
            (r.segment == segment && off + len <= r.data.len())
                .then(|| &mut r.data[off..off + len])
        })
    }

    fn fetch(&self, addr: u32) -> Result<SlotContent, FaultKind> {
        let region = self
            .desc_regions
            .iter()
            .find(|r| {
                addr >= r.bus && (addr - r.bus) as usize + DESCRIPTOR_SIZE <= r.len
            })
            .ok_or(FaultKind::DescriptorFetch)?;
        if (addr - region.bus) as usize % DESCRIPTOR_SIZE != 0 {
            return Err(FaultKind::DescriptorFetch);
        }
        let host = region.host + (addr - region.bus) as usize;
        // SAFETY: the region was registered from live slot storage that the
        // channel under test still borrows; slots are volatile cells.
        let slot = unsafe { &*(host as *const DescriptorSlot) };
        slot.read().map_err(|_| FaultKind::InvalidDescriptor)
    }

    /// Execute one descriptor. Returns whether the engine made progress.
    fn step(&mut self, ch: usize) -> bool {
        let model = self.channels[ch];
        if model.count == 0
            || model.stalled
            || model.state() == EngineState::Error
            || model.reg(Reg::Control) & CONTROL_ENABLE == 0
        {
            if model.reg(Reg::Control) & CONTROL_ENABLE == 0 && model.count > 0 {
                self.channels[ch].set_state(EngineState::Halt);
            }
            return false;
        }

        let mut addr = model.reg(Reg::DescStartAdrs);
        let mut desc = None;
        for _ in 0..2 {
            match self.fetch(addr) {
                Ok(SlotContent::Jump(target)) => addr = target,
                Ok(SlotContent::Transfer(d)) => {
                    desc = Some(d);
                    break;
                }
                Err(kind) => {
                    self.fault(ch, kind, addr, None);
                    return false;
                }
            }
        }
        let Some(desc) = desc else {
            self.fault(ch, FaultKind::InvalidDescriptor, addr, None);
            return false;
        };

        let result = match self.channels[ch].injected.take() {
            Some(kind) => Err(kind),
            None => self.execute(&desc),
        };
        if let Err(kind) = result {
            self.fault(ch, kind, addr, Some(&desc));
            return false;
        }

        self.completed.push((ch, addr));
        let m = &mut self.channels[ch];
        m.set(Reg::DescStartAdrs, addr + DESCRIPTOR_SIZE as u32);
        m.count -= 1;
        if desc.flags().contains(DescFlags::INTERRUPT) {
            let status = m.reg(Reg::Status);
            m.set(Reg::Status, status | STATUS_DONE_INT);
        }
        m.set_state(if m.count == 0 {
            EngineState::Done
        } else {
            EngineState::Busy
        });
        true
    }

    fn execute(&mut self, desc: &Descriptor) -> Result<(), FaultKind> {
        let (rows, planes, len) = {
            let s = desc.shape();
            (s.rows(), s.planes(), s.row_length())
        };
        let (sp, dp, spp, dpp) = match *desc.shape() {
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

        let mask = match desc.predicate() {
            Some(m) => Some(
                self.mem(0, m.addr(), m.len())
                    .ok_or(FaultKind::Predicate)?
                    .to_vec(),
            ),
            None => None,
        };

        let (src, dst) = (desc.src(), desc.dst());
        let span = |pitch: u32, plane_pitch: u32| {
            u64::from(planes - 1) * u64::from(plane_pitch)
                + u64::from(rows - 1) * u64::from(pitch)
                + u64::from(len)
        };
        let (s0, s1) = (u64::from(src.offset()), u64::from(src.offset()) + span(sp, spp));
        let (d0, d1) = (u64::from(dst.offset()), u64::from(dst.offset()) + span(dp, dpp));
        if src.segment() == dst.segment() && s0 < d1 && d0 < s1 {
            return Err(FaultKind::AddressOverlap);
        }

        for p in 0..planes {
            for r in 0..rows {
                if let Some(mask) = &mask {
                    if !row_enabled(mask, r as usize) {
                        continue;
                    }
                }
                let s = src.offset() + p * spp + r * sp;
                let d = dst.offset() + p * dpp + r * dp;
                let bytes = self
                    .mem(src.segment(), s, len as usize)
                    .ok_or(FaultKind::SourceBus)?
                    .to_vec();
                self.mem_mut(dst.segment(), d, len as usize)
                    .ok_or(FaultKind::DestinationBus)?
                    .copy_from_slice(&bytes);
            }
        }
        Ok(())
    }

    fn fault(&mut self, ch: usize, kind: FaultKind, desc_addr: u32, desc: Option<&Descriptor>) {
        let m = &mut self.channels[ch];
        let mut status = (m.reg(Reg::Status) & !STATUS_STATE_MASK)
            | EngineState::Error.to_bits()
            | fault_kind_to_bits(kind);
        if m.reg(Reg::Settings) & SETTINGS_ERR_INT_EN != 0 {
            status |= STATUS_ERR_INT;
        }
        m.set(Reg::Status, status);
        m.set(Reg::CurrDescAdrs, desc_addr);
        let (src, dst) = desc.map_or((DmaAddr::Local(0), DmaAddr::Local(0)), |d| (d.src(), d.dst()));
        m.set(Reg::SrcAdrs, src.offset());
        m.set(Reg::DstAdrs, dst.offset());
        m.set(Reg::SrcAdrsHi, u32::from(src.segment()));
        m.set(Reg::DstAdrsHi, u32::from(dst.segment()));
    }
}

impl IdmaHal for &MockIdma {
    fn read_reg(&mut self, channel: usize, reg: Reg) -> u32 {
        let mut st = self.state.borrow_mut();
        match reg {
            Reg::NumDesc => {
                st.step(channel);
                st.channels[channel].count
            }
            Reg::NumDescIncr => 0,
            _ => st.channels[channel].reg(reg),
        }
    }

    fn write_reg(&mut self, channel: usize, reg: Reg, value: u32) {
        let mut st = self.state.borrow_mut();
        let m = &mut st.channels[channel];
        match reg {
            Reg::NumDescIncr => m.count += value,
            Reg::Status => {
                let status = m.reg(Reg::Status);
                m.set(Reg::Status, status & !(value & STATUS_ALL_INTERRUPTS));
            }
            Reg::Control if value & CONTROL_RESET != 0 => {
                m.count = 0;
                m.injected = None;
                m.set(Reg::Status, 0);
                m.set(Reg::Control, value & !CONTROL_RESET);
            }
            Reg::Control => {
                m.set(Reg::Control, value);
                if value & CONTROL_ENABLE != 0 && m.state() == EngineState::Halt {
                    m.set_state(EngineState::Busy);
                }
            }
            _ if reg.is_writable() => m.set(reg, value),
            _ => {}
        }
    }

    fn writeback_region(&mut self, _ptr: *const u8, _len: usize) {
        self.state.borrow_mut().writebacks += 1;
    }

    fn invalidate_region(&mut self, _ptr: *const u8, _len: usize) {
        self.state.borrow_mut().invalidates += 1;
    }

    fn enable_interrupt(&mut self, line: u16) -> ConfigResult<()> {
        let mut st = self.state.borrow_mut();
        if st.unavailable_lines.contains(&line) {
            return Err(ConfigError::InterruptUnavailable);
        }
        if !st.enabled_lines.contains(&line) {
            st.enabled_lines.push(line);
        }
        Ok(())
    }

    fn disable_interrupt(&mut self, line: u16) {
        self.state.borrow_mut().enabled_lines.retain(|&l| l != line);
    }

    fn dma_address(&mut self, ptr: *const u8, len: usize) -> u32 {
        let mut st = self.state.borrow_mut();
        let host = ptr as usize;
        if let Some(r) = st.desc_regions.iter().find(|r| r.host == host && r.len == len) {
            return r.bus;
        }
        let bus = st.next_desc;
        st.next_desc += align_up(len) + ALLOC_GAP;
        st.desc_regions.push(DescRegion { bus, host, len });
        bus
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay implementation for testing
///
/// Records the requested delay instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns() / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn allocations_do_not_touch() {
        let mock = MockIdma::new();
        let a = mock.alloc(10);
        let b = mock.alloc(10);
        assert!(b >= a + 10 + ALLOC_GAP);
    }

    #[test]
    fn memory_roundtrip() {
        let mock = MockIdma::new();
        let a = mock.alloc_with(&[1, 2, 3, 4]);
        assert_eq!(mock.read_mem(DmaAddr::Local(a + 1), 2), vec![2, 3]);
    }

    #[test]
    fn system_segments_are_separate() {
        let mock = MockIdma::new();
        let a = mock.alloc_in(2, 8);
        let b = mock.alloc_in(3, 8);
        assert_eq!(a.offset(), b.offset());
        mock.write_mem(a, &[0xAA; 8]);
        assert_eq!(mock.read_mem(b, 8), vec![0; 8]);
    }

    #[test]
    fn status_is_write_one_to_clear() {
        let mock = MockIdma::new();
        let mut hal = &mock;
        mock.state.borrow_mut().channels[0].set(Reg::Status, STATUS_DONE_INT | STATUS_ERR_INT | 3);
        hal.write_reg(0, Reg::Status, STATUS_DONE_INT);
        assert_eq!(mock.reg(0, Reg::Status), STATUS_ERR_INT | 3);
    }

    #[test]
    fn reset_self_clears() {
        let mock = MockIdma::new();
        let mut hal = &mock;
        hal.write_reg(0, Reg::NumDescIncr, 3);
        hal.write_reg(0, Reg::Control, CONTROL_RESET | CONTROL_ENABLE);
        assert_eq!(mock.reg(0, Reg::Control), CONTROL_ENABLE);
        assert_eq!(mock.outstanding(0), 0);
    }

    #[test]
    fn dma_address_is_stable_per_region() {
        let mock = MockIdma::new();
        let mut hal = &mock;
        let storage = [const { DescriptorSlot::new() }; 2];
        let ptr = storage.as_ptr().cast::<u8>();
        let a = hal.dma_address(ptr, 128);
        assert_eq!(hal.dma_address(ptr, 128), a);
        assert_eq!(a, DESC_BUS_BASE);
    }

    #[test]
    fn delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_us(10);
        delay.delay_ns(500);
        assert_eq!(delay.total_ns(), 10_500);
        assert_eq!(delay.total_us(), 10);
    }
}
