//! Kernel stack allocator (`image.stack` allocation, §3, §6).
//!
//! Reserves `[config::KERNEL_STACK_REGION_START, config::KERNEL_STACK_REGION_END)`,
//! a fixed bitmap-managed slot array living entirely inside the kernel directory's
//! identity-mapped window, so slots are backed by physical memory the instant they're
//! handed out — no per-slot page-table walk, unlike a high-half
//! `kernel_page_table::map_kernel_page` path. Kept: the bitmap
//! allocator shape itself (`STACK_BITMAP`, word-at-a-time free-bit scan) and the
//! `Drop`-releases-the-slot discipline. Each slot carries one guard page below the
//! usable region, matching a stack+guard layout, even though §3 only
//! requires `[stack - KERNEL_STACK_SIZE, stack)` be mapped and owned — the guard page
//! is an unmapped sentinel, not part of that owned region, and only serves to turn a
//! kernel-stack overflow into an immediate page fault instead of silent corruption of
//! the slot below.

use crate::config::{KERNEL_STACK_REGION_END, KERNEL_STACK_REGION_START, KERNEL_STACK_SIZE, PAGE_SIZE};
use spin::Mutex;

const GUARD_PAGE_SIZE: u32 = PAGE_SIZE;
const STACK_SLOT_SIZE: u32 = KERNEL_STACK_SIZE + GUARD_PAGE_SIZE;
const MAX_KERNEL_STACKS: usize =
    ((KERNEL_STACK_REGION_END - KERNEL_STACK_REGION_START) / STACK_SLOT_SIZE) as usize;
const BITMAP_SIZE: usize = (MAX_KERNEL_STACKS + 63) / 64;

static STACK_BITMAP: Mutex<[u64; BITMAP_SIZE]> = Mutex::new([0; BITMAP_SIZE]);

/// One task's kernel stack slot. `top` is the `image.stack` value stored on the task
/// (§3); the stack occupies `[top - KERNEL_STACK_SIZE, top)`.
#[derive(Debug)]
pub struct KernelStack {
    index: usize,
    top: u32,
}

impl KernelStack {
    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.top - KERNEL_STACK_SIZE
    }
}

impl Drop for KernelStack {
    fn drop(&mut self) {
        let mut bitmap = STACK_BITMAP.lock();
        bitmap[self.index / 64] &= !(1u64 << (self.index % 64));
        log::trace!("kernel_stack: freed slot {}", self.index);
    }
}

/// Allocates one kernel stack slot for `spawn_process`/`spawn_init` (§6).
pub fn allocate_kernel_stack() -> Result<KernelStack, &'static str> {
    let mut bitmap = STACK_BITMAP.lock();

    let mut found = None;
    'outer: for (word_idx, word) in bitmap.iter_mut().enumerate() {
        if *word == u64::MAX {
            continue;
        }
        for bit_idx in 0..64 {
            let global_idx = word_idx * 64 + bit_idx;
            if global_idx >= MAX_KERNEL_STACKS {
                break 'outer;
            }
            if *word & (1u64 << bit_idx) == 0 {
                *word |= 1u64 << bit_idx;
                found = Some(global_idx);
                break 'outer;
            }
        }
    }

    let index = found.ok_or("no free kernel stack slots")?;
    drop(bitmap);

    let slot_base = KERNEL_STACK_REGION_START + index as u32 * STACK_SLOT_SIZE;
    let top = slot_base + STACK_SLOT_SIZE;

    log::trace!(
        "kernel_stack: allocated slot {} at {:#x}..{:#x} (guard at {:#x})",
        index,
        top - KERNEL_STACK_SIZE,
        top,
        slot_base
    );

    Ok(KernelStack { index, top })
}

pub fn init() {
    log::info!(
        "kernel_stack: {} slots of {} KiB over {:#x}..{:#x}",
        MAX_KERNEL_STACKS,
        KERNEL_STACK_SIZE / 1024,
        KERNEL_STACK_REGION_START,
        KERNEL_STACK_REGION_END
    );
}
