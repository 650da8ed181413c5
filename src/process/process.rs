//! `Task` (§3): the unit of scheduling, plus its small family of value types.
//!
//! Field shape is grounded in a `Process` struct (`id`/`state`/
//! `main_thread`/`parent`/`children`), generalized to a narrower
//! `thread{eip,esp,ebp,page_directory}` register snapshot in place of a fuller
//! `Thread`/`CpuContext`, since this spec only ever saves/restores three
//! registers plus the address-space pointer (§4.D) rather than a complete GPR set.

use crate::memory::kernel_stack::KernelStack;
use crate::memory::paging::PageDirectory;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique, monotonically-assigned task identifier (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(u64);

impl ProcessId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Starts at 0 so `spawn_init`'s task is PID 0 and the first task ever forked is PID 1,
/// matching §8 scenario 2's literal "parent observes return value = 1".
static NEXT_PID: AtomicU64 = AtomicU64::new(0);

/// Allocates the next monotonic task id (§3 `id`).
pub fn next_process_id() -> ProcessId {
    ProcessId(NEXT_PID.fetch_add(1, Ordering::Relaxed))
}

/// Exit status recorded by `task_exit`, valid once `finished` (§3 `status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

/// Carried alongside `finished`/`reapable` booleans for ease of assertion in tests
/// (SPEC_FULL §3.1); mirrors the five-state machine of §4.D:
/// `Ready → Running → (Ready | Blocked | Finished) → Reapable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Finished,
    Reapable,
}

/// Saved execution context (§3 `thread`): `{eip, esp, ebp, page_directory}`.
/// `page_directory` is an `Arc` so kernel tables and, under `clone`, the whole address
/// space, can be shared by reference between tasks (§3 invariants).
pub struct ThreadContext {
    pub eip: u32,
    pub esp: u32,
    pub ebp: u32,
    pub page_directory: Arc<PageDirectory>,
}

/// Number of file-descriptor slots reserved per task. The VFS/fd layer itself is out
/// of scope (§1); this crate only owns the table's storage so `reap_process` has
/// something concrete to free (§4.E).
pub const MAX_FDS: usize = 32;

/// Opaque fd slot — out-of-scope contract (§1), kept only so the table has a size and
/// a storage lifetime for `reap_process` to release.
#[derive(Clone, Copy, Default)]
pub struct FdSlot;

/// A task (§3). Owns its kernel stack slot and fd-table storage so `reap_process` can
/// actually release them; everything else mirrors that attribute list directly.
pub struct Task {
    pub id: ProcessId,
    pub thread: ThreadContext,
    /// Kernel-stack allocation backing `image.stack`; `kernel_stack.top()` is the
    /// spec's `image.stack` value. Kept as the owning handle (rather than a bare `u32`)
    /// so the allocator slot is released exactly once, by `reap_process`, when this
    /// field is dropped.
    pub kernel_stack: KernelStack,
    /// Pointer, within this task's own kernel stack, to the saved-register frame of an
    /// in-progress syscall trap; `0` stands in for null (§3).
    pub syscall_registers: u32,
    pub fds: [FdSlot; MAX_FDS],
    /// Ids of tasks blocked awaiting this task's termination (§3, §9: weak
    /// back-references — ownership of a waiter lives in the scheduler's ready/blocked
    /// set, not here).
    pub wait_queue: Vec<ProcessId>,
    pub status: ExitCode,
    pub finished: bool,
    pub reapable: bool,
    pub state: ProcessState,
    pub parent: Option<ProcessId>,
    pub children: Vec<ProcessId>,
}

impl Task {
    pub fn new(id: ProcessId, kernel_stack: KernelStack, page_directory: Arc<PageDirectory>) -> Self {
        let top = kernel_stack.top();
        Task {
            id,
            thread: ThreadContext {
                eip: 0,
                esp: top,
                ebp: top,
                page_directory,
            },
            kernel_stack,
            syscall_registers: 0,
            fds: [FdSlot; MAX_FDS],
            wait_queue: Vec::new(),
            status: ExitCode(0),
            finished: false,
            reapable: false,
            state: ProcessState::Ready,
            parent: None,
            children: Vec::new(),
        }
    }

    /// `image.stack`: the high address (top) of the kernel stack (§3).
    pub fn image_stack(&self) -> u32 {
        self.kernel_stack.top()
    }
}
