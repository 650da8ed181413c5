//! Binary entry point. `boot.rs`'s `_start` (in the `kernel` lib) jumps here once
//! paging is still off and `MULTIBOOT_INFO_ADDR` is stashed; this is the one place the
//! real multiboot memory map gets turned into the `MemoryRegion`s `kernel::memory::init`
//! wants, and the one place interrupts actually get switched on for good (§4.D, §7).
//!
//! Trimmed down from an earlier `main.rs` (a `bootloader_api::entry_point!` wrapper that
//! only ever painted the framebuffer gray) to this crate's real boot sequence —
//! this kernel has no framebuffer or `bootloader_api` dependency at all.

#![no_std]
#![no_main]

use core::panic::PanicInfo;
use kernel::memory::MemoryRegion;
use kernel::{config, gdt, interrupts, logger, memory, serial, task};

const MAX_REGIONS: usize = 32;

#[no_mangle]
extern "C" fn kernel_main_entry() -> ! {
    logger::init_early();
    serial::init();
    logger::serial_ready();
    gdt::init();

    let mut regions = [MemoryRegion { start: 0, len: 0 }; MAX_REGIONS];
    let count = kernel::boot::memory_regions(&mut regions);
    let count = if count == 0 {
        // No bootloader handed us a usable map at all; fall back to the identity-mapped
        // frame pool `config.rs` reserves so the kernel still boots (degraded, but alive).
        regions[0] = MemoryRegion {
            start: config::FRAME_POOL_START,
            len: config::FRAME_POOL_END - config::FRAME_POOL_START,
        };
        1
    } else {
        count
    };
    memory::init(&regions[..count]);

    interrupts::init();
    task::lifecycle::tasking_install();

    log::info!("tasking installed, entering idle loop");
    kernel::hlt_loop();
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log::error!("kernel panic: {}", info);
    kernel::hlt_loop();
}
