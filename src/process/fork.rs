//! Fork/clone primitive (§4.C): stack-relocated context duplication built on the
//! capture-resume primitive (§4.D, §9).
//!
//! Grounded in `process/fork.rs` copy-on-write forking (`copy_user_pages`,
//! page-table walk over the active `OffsetPageTable`) and `interrupts/context_switch.rs`'s
//! `switch_to` (the source of the capture-resume idea). This spec's fork has no CoW and
//! no active-mapping walk: it works entirely on byte ranges and physical addresses
//! (`paging::clone_directory`, a raw `memcpy` of the whole kernel stack region),
//! generalized from a per-frame `Cr3`-relative walk down to the flatter
//! "every frame below `KERNEL_IDENTITY_LIMIT` is reachable at its own address" model
//! `memory/paging.rs` establishes.
//!
//! Resolves the asymmetric-`ebp`-formula REDESIGN FLAG (§9): both `esp` and `ebp` are
//! rebased by the same signed `Δ = child.image_stack() - parent.image_stack()`, matching
//! `syscall_registers`'s rebase — this spec only ever applies one relocation constant
//! per fork, whatever its sign.

use crate::config::{KERNEL_STACK_SIZE, RESUME_MAGIC, TASK_MAGIC};
use crate::memory::paging::{self, HardwareBackend};
use crate::process::manager;
use crate::task::context;
use core::ptr;

enum AddressSpacePolicy {
    /// `fork` (§4.C): child gets a deep copy of the parent's address space (4.B).
    Clone,
    /// `clone` (§4.C): child shares the parent's address space by `Arc` reference.
    Share,
}

/// `fork()` (§6): returns `child.id` to the parent, `0` to the child on its first
/// schedule (P4).
pub fn fork() -> u32 {
    duplicate(AddressSpacePolicy::Clone)
}

/// `clone(stack_top, stack_old)` (§6): child shares the parent's address space.
/// `stack_top`/`stack_old` describe the userspace-visible stack relocation the *caller*
/// performs on the shared address space; the kernel core here only ever preserves the
/// register file, so these are recorded for the caller's bookkeeping and otherwise
/// unused by this primitive.
pub fn clone(_stack_top: u32, _stack_old: u32) -> u32 {
    duplicate(AddressSpacePolicy::Share)
}

/// `getpid()` (§6, implied by "Exposed to the rest of the kernel").
pub fn getpid() -> u32 {
    manager::current_pid()
        .expect("getpid: tasking not installed")
        .as_u64() as u32
}

fn duplicate(policy: AddressSpacePolicy) -> u32 {
    unsafe { x86::irq::disable() };

    let parent = manager::current_pid().expect("fork: tasking not installed");
    let parent_top = manager::with_task(parent, |t| t.image_stack());
    let parent_bottom = parent_top - KERNEL_STACK_SIZE;

    // Step 1 (§4.C): the stack-integrity sentinel goes one word below the stack top, a
    // location that exists identically on every task's stack (P5).
    unsafe { ptr::write(magic_slot(parent_top), TASK_MAGIC) };

    // Step 2: a fresh task with its own kernel stack, still pointing at the parent's
    // directory until step 3 installs the real one.
    let child = manager::spawn_process(parent);

    // Step 3: bind the selected address space.
    let child_dir = match policy {
        AddressSpacePolicy::Clone => {
            let parent_dir = manager::with_task(parent, |t| t.thread.page_directory.clone());
            let mut backend = HardwareBackend;
            paging::clone_directory(&parent_dir, &mut backend)
        }
        AddressSpacePolicy::Share => manager::with_task(parent, |t| t.thread.page_directory.clone()),
    };
    manager::set_process_environment(child, child_dir);

    let child_top = manager::with_task(child, |t| t.image_stack());
    let delta: i64 = child_top as i64 - parent_top as i64;
    let relocate = |addr: u32| (addr as i64 + delta) as u32;

    // Step 4: capture-resume. Returns live here on the parent's immediate path; returns
    // a second time, with `eip == RESUME_MAGIC`, in the child's context the first time
    // the scheduler resumes it (§4.D, §9).
    let (eip, esp, ebp) = unsafe { context::capture() };

    if eip == RESUME_MAGIC {
        // Child branch (§4.C): the byte-copy below already placed TASK_MAGIC at this
        // exact offset on the child's own stack; re-assert it (P5) and return 0 (P4).
        let magic = unsafe { ptr::read(magic_slot(child_top)) };
        assert_eq!(magic, TASK_MAGIC, "fork: TASK_MAGIC corrupted on child's first schedule (P5)");
        return 0;
    }

    // Parent branch (§4.C).
    let magic = unsafe { ptr::read(magic_slot(parent_top)) };
    assert_eq!(magic, TASK_MAGIC, "fork: TASK_MAGIC corrupted on parent resume (P5)");

    // Byte-copy the parent's entire kernel stack region into the child's, verbatim —
    // this is what makes the relocated esp'/ebp' land on a stack whose contents already
    // match, frame for frame, modulo the constant Δ (§9).
    unsafe {
        ptr::copy_nonoverlapping(
            parent_bottom as *const u8,
            (child_top - KERNEL_STACK_SIZE) as *mut u8,
            KERNEL_STACK_SIZE as usize,
        );
    }

    let parent_syscall_regs = manager::with_task(parent, |t| t.syscall_registers);
    let child_syscall_regs = if parent_syscall_regs == 0 {
        0
    } else {
        relocate(parent_syscall_regs)
    };

    manager::with_task(child, |t| {
        t.thread.eip = eip;
        t.thread.esp = relocate(esp);
        t.thread.ebp = relocate(ebp);
        t.syscall_registers = child_syscall_regs;
    });

    manager::make_process_ready(child);

    unsafe { x86::irq::enable() };

    child.as_u64() as u32
}

/// One word below the stack top — the known location §4.C step 1 writes `TASK_MAGIC`
/// to, identical in every task's stack layout so parent and child can both check it by
/// the same offset from their own `image_stack()`.
fn magic_slot(stack_top: u32) -> *mut u32 {
    (stack_top - 4) as *mut u32
}
