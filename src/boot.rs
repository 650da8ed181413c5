//! Multiboot-compliant entry point.
//!
//! No bootloader crate is involved: GRUB (or QEMU's `-kernel`) loads this image directly
//! per the Multiboot 1 header below and jumps to `_start` in 32-bit protected mode with
//! paging disabled, `%eax == 0x2BADB002`, and `%ebx` pointing at the `multiboot_info_t`.

use crate::memory::MemoryRegion;
use core::arch::global_asm;

pub const MULTIBOOT_MAGIC: u32 = 0x2BADB002;

/// Physical address of the multiboot info structure, stashed by `_start` before Rust
/// code touches any register `ebx` would otherwise occupy.
#[no_mangle]
pub static mut MULTIBOOT_INFO_ADDR: u32 = 0;

const MMAP_VALID: u32 = 1 << 6;
const MULTIBOOT_MEMORY_AVAILABLE: u32 = 1;

/// Layout of the fixed-offset prefix of `multiboot_info_t` (Multiboot 1). Only the
/// fields this kernel actually reads are named; the rest of the real structure follows
/// `mmap_addr` and is never touched.
#[repr(C)]
struct MultibootInfoHeader {
    flags: u32,
    mem_lower: u32,
    mem_upper: u32,
    boot_device: u32,
    cmdline: u32,
    mods_count: u32,
    mods_addr: u32,
    syms: [u32; 4],
    mmap_length: u32,
    mmap_addr: u32,
}

#[repr(C)]
struct MmapEntry {
    size: u32,
    base_addr: u64,
    length: u64,
    entry_type: u32,
}

/// Parses the memory map GRUB (or QEMU's `-kernel` loader) left at
/// [`MULTIBOOT_INFO_ADDR`] into `out`, returning the number of available-RAM regions
/// written (SPEC_FULL §3.1's `MemoryRegion`, standing in for
/// `bootloader_api::info::MemoryRegions`). Falls back to a single region spanning
/// `mem_upper` when the bootloader didn't set the full-map flag — every Multiboot 1
/// loader sets at least `mem_lower`/`mem_upper` per the header's memory-info request bit.
pub fn memory_regions(out: &mut [MemoryRegion]) -> usize {
    let info_addr = unsafe { core::ptr::addr_of!(MULTIBOOT_INFO_ADDR).read() };
    let info = unsafe { &*(info_addr as *const MultibootInfoHeader) };

    if info.flags & MMAP_VALID == 0 || out.is_empty() {
        if out.is_empty() {
            return 0;
        }
        out[0] = MemoryRegion {
            start: crate::memory::layout::KERNEL_VMA,
            len: info.mem_upper * 1024,
        };
        return 1;
    }

    let mut count = 0;
    let mut addr = info.mmap_addr;
    let end = info.mmap_addr + info.mmap_length;
    while addr < end && count < out.len() {
        let entry = unsafe { &*(addr as *const MmapEntry) };
        if entry.entry_type == MULTIBOOT_MEMORY_AVAILABLE {
            out[count] = MemoryRegion {
                start: entry.base_addr as u32,
                len: entry.length as u32,
            };
            count += 1;
        }
        addr += entry.size + 4;
    }
    count
}

global_asm!(
    r#"
    .section .multiboot, "a"
    .align 4
    .long 0x1BADB002          // magic
    .long 0x00000003          // flags: align modules, provide memory map
    .long -(0x1BADB002 + 0x00000003)

    .section .text
    .global _start
    .extern kernel_main_entry
    _start:
        mov [MULTIBOOT_INFO_ADDR], ebx
        mov esp, offset BOOT_STACK_TOP
        mov ebp, esp
        push 0
        popf
        call kernel_main_entry
    .hang:
        hlt
        jmp .hang

    .section .bss
    .align 16
    BOOT_STACK_BOTTOM:
        .skip 65536
    BOOT_STACK_TOP:
    "#
);
