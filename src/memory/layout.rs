//! Kernel memory layout constants.
//!
//! A 64-bit analogue's `layout.rs` reserves an elaborate set of higher-half canonical regions
//! (per-CPU stack areas, mmap regions, TLS blocks) for a 64-bit kernel with a split
//! low/high address-space alias. None of that applies to this flat 32-bit, single-address-
//! space-pair design: the kernel occupies a fixed low region and every user process gets
//! its own private region above it. What's kept is the shape of a similar
//! `get_kernel_*_range`/`&code`/`&end` bridge, since the P8 kernel-text-range invariant depends on it.

use crate::config::{KERNEL_IDENTITY_LIMIT, PAGE_SIZE};

/// Physical/virtual base at which the kernel image is linked (`linker.ld`'s `KERNEL_VMA`).
pub const KERNEL_VMA: u32 = 0x0010_0000;

/// Base of the identity-mapped region shared by every address space (kernel code, data,
/// heap, kernel stacks and the physical-frame direct map all live below this split).
pub const KERNEL_SPACE_END: u32 = KERNEL_IDENTITY_LIMIT;

/// Base of the private region each user process's page tables map independently.
pub const USER_SPACE_BASE: u32 = KERNEL_IDENTITY_LIMIT;

/// Linker-provided bounds of the kernel's executable text, used by `switch_next` (§4.D) to
/// validate P8 — every scheduled task's `thread.eip` must lie in `[&code, &end)`.
extern "C" {
    static code: u8;
    static end: u8;
}

/// Address of the first byte of kernel text.
#[inline]
pub fn kernel_text_start() -> u32 {
    unsafe { &code as *const u8 as u32 }
}

/// Address one past the last byte of the kernel image (text+rodata+data+bss).
#[inline]
pub fn kernel_text_end() -> u32 {
    unsafe { &end as *const u8 as u32 }
}

/// True when `eip` lies within `[&code, &end)` — the P8 invariant.
#[inline]
pub fn eip_in_kernel_text(eip: u32) -> bool {
    eip >= kernel_text_start() && eip < kernel_text_end()
}

#[inline]
pub fn is_user_address(addr: u32) -> bool {
    addr >= USER_SPACE_BASE
}

#[inline]
pub const fn page_align_down(addr: u32) -> u32 {
    addr & !(PAGE_SIZE - 1)
}

#[inline]
pub const fn page_align_up(addr: u32) -> u32 {
    (addr + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

pub fn log_layout() {
    log::info!(
        "LAYOUT: kernel text {:#x}..{:#x}, kernel space ends {:#x}, user space base {:#x}",
        kernel_text_start(),
        kernel_text_end(),
        KERNEL_SPACE_END,
        USER_SPACE_BASE,
    );
}
