//! Translation Lookaside Buffer (TLB) management.
//!
//! A full `cr3` reload (every `switch_page_directory` call in `paging.rs` performs one)
//! already flushes every non-global TLB entry on x86, so the only primitive this module
//! needs beyond that is a single-page `invlpg`, used when a mapping changes without
//! swapping the whole directory (kernel-stack allocation, heap growth).

/// Flushes the TLB entry for a single page, without reloading `cr3`.
#[inline]
pub fn flush_page(virt_addr: u32) {
    unsafe {
        x86::tlb::flush(virt_addr as usize);
    }
}

/// Flushes the entire TLB by reloading `cr3` with its current value.
#[inline]
pub fn flush_all() {
    unsafe {
        x86::tlb::flush_all();
    }
}
