//! Kernel heap (`kvmalloc_p`/`free` contract, §6).
//!
//! Grounded in a `linked_list_allocator`-backed global allocator. A 64-bit analogue
//! maps heap pages on demand through an `OffsetPageTable` because its heap
//! lives in high-half virtual memory outside any static mapping. This kernel's heap
//! region (`config::HEAP_START..HEAP_START+HEAP_SIZE`) instead falls entirely inside
//! the kernel directory's identity-mapped window (`config::KERNEL_IDENTITY_LIMIT`,
//! built once by `memory::paging::init`), so no page-table walk is needed here: the
//! region is already backed by physical memory the moment the kernel directory is
//! loaded into `cr3`.

use crate::config::{HEAP_SIZE, HEAP_START};
use linked_list_allocator::LockedHeap;

/// Global allocator instance. A free-list allocator (rather than a bump allocator)
/// properly reclaims memory freed by `spawn_process`/`reap_process` churn.
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Initializes the heap over its fixed, already identity-mapped region. Must run
/// after `memory::paging::init` has installed the kernel directory (and, in a running
/// kernel, after that directory is loaded into `cr3`).
pub fn init() {
    unsafe {
        ALLOCATOR.lock().init(HEAP_START as *mut u8, HEAP_SIZE as usize);
    }
    log::info!(
        "heap initialized at {:#x}, size {} KiB",
        HEAP_START,
        HEAP_SIZE / 1024
    );
}

/// `kvmalloc_p(size, *phys)` (§6): allocates kernel-virtual memory and reports its
/// physical address. Because the heap is identity-mapped, the physical address is
/// numerically identical to the virtual one.
pub fn kvmalloc_p(layout: core::alloc::Layout, phys: &mut u32) -> *mut u8 {
    let ptr = unsafe { alloc::alloc::alloc(layout) };
    *phys = ptr as u32;
    ptr
}

/// `free(p)` (§6): releases memory obtained from [`kvmalloc_p`] or the global
/// allocator.
///
/// # Safety
/// `ptr` must have been allocated with the global allocator using `layout`.
pub unsafe fn free(ptr: *mut u8, layout: core::alloc::Layout) {
    alloc::alloc::dealloc(ptr, layout);
}

#[alloc_error_handler]
fn alloc_error_handler(layout: core::alloc::Layout) -> ! {
    panic!("allocation error: {:?}", layout)
}
