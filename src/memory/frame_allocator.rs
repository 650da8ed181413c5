//! Physical frame allocator over the pool `[config::FRAME_POOL_START,
//! config::FRAME_POOL_END)` (§6's `alloc_frame`/`free_frame` contract).
//!
//! Kept close to a bump-plus-freelist idiom (`NEXT_FREE_FRAME` plus a
//! `Vec` of returned frames, consulted first), generalized from a multi-region
//! `bootloader_api::MemoryRegions` walk down to the single identity-mapped window this
//! kernel manages, and re-typed onto [`MemoryRegion`] (SPEC_FULL §3.1) rather than a
//! 64-bit analogue's frame types. The `SIMULATE_OOM` testing hook is kept in
//! spirit: a feature-gated switch that makes `alloc_frame` fail on demand so fork's
//! fatal-allocation-failure path (§4.A, §7) can be exercised without exhausting real
//! memory.

use crate::config::{FRAME_POOL_END, FRAME_POOL_START, PAGE_SIZE};
use alloc::vec::Vec;
#[cfg(feature = "testing")]
use core::sync::atomic::AtomicBool;
use core::sync::atomic::{AtomicU32, Ordering};
use spin::Mutex;

/// One contiguous span of usable physical memory, as reported by the boot protocol
/// (SPEC_FULL §3.1 ambient data-model addition).
#[derive(Debug, Clone, Copy)]
pub struct MemoryRegion {
    pub start: u32,
    pub len: u32,
}

static NEXT_FRAME: AtomicU32 = AtomicU32::new(FRAME_POOL_START / PAGE_SIZE);
static FREE_LIST: Mutex<Vec<u32>> = Mutex::new(Vec::new());
static POOL_LIMIT: AtomicU32 = AtomicU32::new(FRAME_POOL_END / PAGE_SIZE);

#[cfg(feature = "testing")]
static SIMULATE_OOM: AtomicBool = AtomicBool::new(false);

/// Clamps the pool to whatever usable RAM the boot protocol actually reported,
/// intersected with `[FRAME_POOL_START, FRAME_POOL_END)`. Regions outside that window
/// are out of scope for this kernel (§6's fixed identity-mapped window, see
/// `config::KERNEL_IDENTITY_LIMIT`).
pub fn init(regions: &[MemoryRegion]) {
    let pool_end = regions
        .iter()
        .filter(|r| r.start < FRAME_POOL_END)
        .map(|r| (r.start + r.len).min(FRAME_POOL_END))
        .max()
        .unwrap_or(FRAME_POOL_END);
    POOL_LIMIT.store(pool_end / PAGE_SIZE, Ordering::Relaxed);
    log::info!(
        "frame_allocator: pool {:#x}..{:#x} ({} frames)",
        FRAME_POOL_START,
        pool_end,
        (pool_end - FRAME_POOL_START) / PAGE_SIZE
    );
}

/// Allocates one physical frame, returning its frame number (`phys_addr / PAGE_SIZE`).
/// Consults the free list before bumping the watermark, matching a similar
/// freed-frames-first policy.
pub fn alloc_frame() -> Option<u32> {
    #[cfg(feature = "testing")]
    if SIMULATE_OOM.load(Ordering::Relaxed) {
        return None;
    }

    if let Some(frame) = FREE_LIST.lock().pop() {
        return Some(frame);
    }

    let limit = POOL_LIMIT.load(Ordering::Relaxed);
    let frame = NEXT_FRAME.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |f| {
        if f < limit {
            Some(f + 1)
        } else {
            None
        }
    });
    frame.ok()
}

/// Releases a frame previously returned by [`alloc_frame`] back onto the free list.
pub fn free_frame(frame: u32) {
    FREE_LIST.lock().push(frame);
}

/// Number of frames currently allocated (bump watermark minus what's been returned),
/// used by the P3 reaper-balance test.
pub fn frames_in_use() -> u32 {
    let allocated = NEXT_FRAME.load(Ordering::Relaxed) - FRAME_POOL_START / PAGE_SIZE;
    allocated - FREE_LIST.lock().len() as u32
}

#[cfg(feature = "testing")]
pub fn set_simulate_oom(enabled: bool) {
    SIMULATE_OOM.store(enabled, Ordering::Relaxed);
}
