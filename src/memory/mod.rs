//! Memory management: physical frame allocator, kernel heap, kernel stacks, and the
//! paging subsystem that backs the task-management core's address-space cloning.
//!
//! Wiring kept from `memory/mod.rs`'s own prior shape: a single `init()` entry point
//! called once from `main`, in the order frame allocator → paging → heap → kernel
//! stacks, logging each step. Trimmed of the `kernel_page_table`/
//! `process_memory`/`vma`/`per_cpu_stack`/`frame_metadata`/`stack` modules — this
//! crate's two-level paging design (`paging.rs`) folds what they did (page-table
//! walking, per-process address space, guard-page bookkeeping) directly into
//! `PageDirectory`/`PageTable` and `kernel_stack.rs`.

pub mod frame_allocator;
pub mod heap;
pub mod kernel_stack;
pub mod layout;
pub mod paging;
pub mod tlb;

pub use frame_allocator::MemoryRegion;

/// Initializes the memory subsystem in dependency order: frame allocator first (so
/// paging and the heap have frames to draw from), then the kernel directory (so the
/// heap and kernel-stack regions are backed the moment `cr3` is loaded), then the
/// heap itself and the kernel-stack bitmap.
pub fn init(regions: &[MemoryRegion]) {
    log::info!("memory: initializing");

    layout::log_layout();
    frame_allocator::init(regions);
    // Paging is still disabled at this point (multiboot entry leaves it off), so every
    // address below `KERNEL_IDENTITY_LIMIT` is its own physical address; the heap and
    // the kernel directory can bootstrap themselves before the identity map they'll
    // both live inside actually exists in hardware.
    heap::init();
    paging::init();
    paging::enable_paging();
    kernel_stack::init();

    log::info!("memory: initialized");
}
