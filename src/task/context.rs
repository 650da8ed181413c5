//! The capture-resume primitive (§4.D, §9) and the context switcher built on top of
//! it (`switch_task`/`switch_next`).
//!
//! Grounded in `task/context.rs` (a `global_asm!` stub wrapped by a thin
//! Rust entry point), re-derived from a full 16-register `switch_context`
//! save/restore down to this spec's narrower `{eip, esp, ebp}` snapshot plus `cr3` —
//! this spec never preserves general-purpose registers across a switch (no FP save,
//! no SMP, §1 Non-goals), only the three values needed to resume a kernel call stack
//! and its address space.

use crate::config::RESUME_MAGIC;
use crate::gdt;
use crate::memory::{layout, paging};
use crate::process::manager;
use crate::task::lifecycle;
use core::arch::asm;

/// `read_eip()` (§6, §9): the capture-resume primitive. Captures `{eip, esp, ebp}` as
/// one atomic snapshot — all three read from the same point inside this one shared
/// function body — so that jumping back to the returned `eip` with the returned
/// `esp`/`ebp` restored re-enters exactly this `pop`/capture sequence, and its normal
/// `ret` epilogue carries control back out to whichever of `switch_task` or `fork`
/// called it, as if the call had simply returned a second time. [`resume_into`] arranges
/// for that second return to report [`RESUME_MAGIC`] instead of the real label address,
/// by pre-loading it where `call` would have pushed the return address.
#[inline(never)]
pub unsafe fn read_eip() -> (u32, u32, u32) {
    let eip: u32;
    let esp: u32;
    let ebp: u32;
    asm!(
        "call 2f",
        "2:",
        "pop {eip}",
        "mov {esp}, esp",
        "mov {ebp}, ebp",
        eip = out(reg) eip,
        esp = out(reg) esp,
        ebp = out(reg) ebp,
    );
    (eip, esp, ebp)
}

/// Restores `esp`/`ebp`/`cr3` and jumps to `eip`, arranging that whatever
/// [`read_eip`] call site `eip` points at reports [`RESUME_MAGIC`] as its result
/// (§9). Never returns to its caller — control resumes inside the target task's own
/// call stack instead.
#[inline(never)]
unsafe fn resume_into(eip: u32, esp: u32, ebp: u32, cr3: u32) -> ! {
    asm!(
        "mov esp, {esp}",
        "mov ebp, {ebp}",
        "mov cr3, {cr3}",
        "push {magic}",
        "jmp {eip}",
        esp = in(reg) esp,
        ebp = in(reg) ebp,
        cr3 = in(reg) cr3,
        magic = const RESUME_MAGIC,
        eip = in(reg) eip,
        options(noreturn),
    );
}

/// `switch_task(reschedule)` (§4.D): the rescheduling entry point, called from the
/// timer IRQ (`reschedule = true`) or a voluntary yield (`reschedule = false`).
///
/// Preconditions per §4.D: no-ops silently if tasking isn't installed yet or no task
/// is ready (§7 "no-op conditions").
pub fn switch_task(reschedule: bool) {
    let current = match manager::current_pid() {
        Some(id) => id,
        None => return,
    };
    if !manager::process_available() {
        return;
    }

    unsafe {
        let (eip, esp, ebp) = read_eip();

        if eip == RESUME_MAGIC {
            // We were resumed by some other task's switch_next. The outgoing-path
            // logic below already ran the first time through; just drain the reap
            // list (§4.D step 2) and return to our caller.
            lifecycle::drain_reap_list();
            return;
        }

        // Outgoing path: persist this snapshot and, if this is a cooperative
        // reschedule rather than a block, rejoin the ready set.
        manager::with_task(current, |task| {
            task.thread.eip = eip;
            task.thread.esp = esp;
            task.thread.ebp = ebp;
        });
        if reschedule {
            manager::make_process_ready(current);
        }

        switch_next();
    }
}

/// `switch_next()` (§4.D): selects the next ready task, validates P8, installs its
/// address space and kernel stack, and resumes it. Never returns — the resumed
/// task's own `switch_task` call eventually returns to its own caller instead.
pub unsafe fn switch_next() -> ! {
    let next = loop {
        match manager::next_ready_process() {
            Some(id) => break id,
            None => {
                // Nothing ready; this can only happen if a caller raced
                // `process_available()` — spin isn't correct at kernel level, so
                // this is a fatal invariant violation (§7).
                panic!("switch_next: no ready task despite process_available()");
            }
        }
    };

    let (eip, esp, ebp, directory) = manager::thread_snapshot(next);

    assert!(
        layout::eip_in_kernel_text(eip),
        "switch_next: task {} eip {:#x} outside kernel text (P8)",
        next.as_u64(),
        eip
    );

    manager::set_current_pid(next);
    paging::switch_page_directory(&directory);
    gdt::set_kernel_stack(manager::with_task(next, |t| t.kernel_stack.top()));

    resume_into(eip, esp, ebp, directory.physical_address)
}

/// Used by `fork`/`clone` (§4.C step 4): captures the live `{eip, esp, ebp}` without
/// touching the ready queue or address space — the caller branches on `eip ==
/// RESUME_MAGIC` (the child's first-schedule resume) vs. a live value (the parent's
/// immediate return) and decides what to do with the snapshot in each case.
pub unsafe fn capture() -> (u32, u32, u32) {
    read_eip()
}
