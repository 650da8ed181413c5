//! PIT (channel 0) programming and the monotonic tick counter.
//!
//! Grounded in `time/timer.rs` divisor-programming sequence, slowed from
//! 1 kHz to [`crate::config::TIMER_HZ`] (100 Hz) since this kernel has no sub-millisecond
//! timing consumer, and stripped of the RTC wall-clock hookup (no wall-clock requirement
//! here).

use crate::config;
use core::sync::atomic::{AtomicU64, Ordering};
use x86::io;

const PIT_INPUT_FREQ_HZ: u32 = 1_193_182;
const PIT_COMMAND_PORT: u16 = 0x43;
const PIT_CHANNEL0_PORT: u16 = 0x40;

static TICKS: AtomicU64 = AtomicU64::new(0);

pub fn init() {
    let divisor: u16 = (PIT_INPUT_FREQ_HZ / config::TIMER_HZ) as u16;
    unsafe {
        io::outb(PIT_COMMAND_PORT, 0x36);
        io::outb(PIT_CHANNEL0_PORT, (divisor & 0xFF) as u8);
        io::outb(PIT_CHANNEL0_PORT, (divisor >> 8) as u8);
    }
    log::info!("PIT programmed at {} Hz", config::TIMER_HZ);
}

#[inline]
pub fn tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn get_ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}
