//! Compile-time kernel configuration constants.
//!
//! Collected in one place rather than scattered per-module, since this crate has far
//! fewer subsystems than a general-purpose kernel.

/// Fixed size of every task's kernel stack (§3, §6).
pub const KERNEL_STACK_SIZE: u32 = 16 * 1024;

/// PIT frequency driving `switch_task(reschedule = true)` (§5).
pub const TIMER_HZ: u32 = 100;

/// Kernel heap region (`kvmalloc_p`/`free` contract, §6). Lives inside the
/// identity-mapped kernel region below [`KERNEL_IDENTITY_LIMIT`].
pub const HEAP_START: u32 = 0x0020_0000;
pub const HEAP_SIZE: u32 = 4 * 1024 * 1024;

/// Kernel stack bitmap region (`memory::kernel_stack`), directly above the heap.
pub const KERNEL_STACK_REGION_START: u32 = 0x0060_0000;
pub const KERNEL_STACK_REGION_END: u32 = 0x0100_0000;

/// Upper bound of the kernel's identity-mapped physical window (§5: "kernel page
/// tables are shared immutably across every address space"). Every directory,
/// regardless of task, maps this whole range 1:1 and refers to the *same* physical
/// page tables for it; `copy_page_physical` relies on every physical frame below this
/// limit being reachable through its identity alias even when it isn't mapped in the
/// currently active directory. This kernel does not grow the window at runtime, so
/// usable RAM beyond it is left untouched by the frame allocator (documented
/// limitation, not a demand-paging system).
pub const KERNEL_IDENTITY_LIMIT: u32 = 0x0400_0000;

/// General-purpose physical frame pool handed out by `memory::frame_allocator`
/// (page tables, page directories, user frames). Everything below it is already
/// spoken for by the kernel image, heap and kernel stacks.
pub const FRAME_POOL_START: u32 = KERNEL_STACK_REGION_END;
pub const FRAME_POOL_END: u32 = KERNEL_IDENTITY_LIMIT;

/// Resume sentinel returned by the capture-resume primitive on the resume path.
/// Chosen below `KERNEL_VMA` so it can never alias a real `eip` inside `[&code, &end)` (P8).
pub const RESUME_MAGIC: u32 = 0x10000;

/// Stack-integrity sentinel placed on the kernel stack before capture-resume (§4.C, P5).
pub const TASK_MAGIC: u32 = 0xDEAD_C0DE;

/// Recognition magic pushed onto the user stack's argv frame (§4.F).
pub const ARGV_FRAME_MAGIC: u32 = 0xDECADE21;

/// Page size / entries-per-table, fixed by the x86 two-level paging design (§3).
pub const PAGE_SIZE: u32 = 4096;
pub const ENTRIES_PER_TABLE: usize = 1024;
