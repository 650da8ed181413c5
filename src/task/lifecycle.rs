//! Task lifecycle (§4.E): `tasking_install`, `task_exit`, `reap_process`.
//!
//! Grounded in `process::init`/`task::scheduler` boot and exit wiring,
//! narrowed to three entry points plus the reap-draining step
//! `switch_task` performs on every resume (§4.D step 2).

use crate::memory::paging::{self, HardwareBackend};
use crate::process::manager;
use crate::process::process::{ExitCode, ProcessId};
use core::sync::atomic::{AtomicBool, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// `tasking_install` (§4.E): disables interrupts, spawns init bound to the live
/// kernel directory, and re-enables interrupts. Post-condition: `current_process`
/// denotes init, the ready set is empty, and timer IRQs may begin driving
/// `switch_task`.
pub fn tasking_install() {
    unsafe { x86::irq::disable() };

    let init = manager::spawn_init();
    manager::set_current_pid(init);

    INSTALLED.store(true, Ordering::Release);
    log::info!("tasking_install: init task {} installed", init.as_u64());

    unsafe { x86::irq::enable() };
}

pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// `task_exit(retval)` (§4.E): marks the current task finished, wakes its waiters,
/// marks it reapable, and yields via `switch_next` without saving context — the task
/// never resumes.
///
/// # Safety
/// Never returns; the caller's stack is abandoned the instant `switch_next` installs
/// another task's own stack and address space.
pub unsafe fn task_exit(retval: i32) -> ! {
    let current = manager::current_pid().expect("task_exit: tasking not installed");

    x86::irq::disable();

    let waiters = manager::mark_finished(current, ExitCode(retval));
    super::wait::wakeup_queue(&waiters);
    manager::mark_reapable(current);
    manager::make_process_reapable(current);

    log::debug!("task_exit: task {} exited with code {}", current.as_u64(), retval);

    super::context::switch_next()
}

/// `kexit(code)` (§6): the kernel-internal name for `task_exit`, used by callers that
/// only know the retval, not that it's specifically *this task's* exit.
pub unsafe fn kexit(code: i32) -> ! {
    task_exit(code)
}

/// Drains the reap list (§4.D step 2, §4.E), called from the resumed context of some
/// *other* task immediately after a switch — never the task being reaped itself (P7).
pub fn drain_reap_list() {
    let mut backend = HardwareBackend;
    while manager::should_reap() {
        if let Some(id) = manager::next_reapable_process() {
            reap_process(id, &mut backend);
        }
    }
}

/// `reap_process(p)` (§4.E): frees, in order, the wait-queue list, the kernel stack
/// region, the page directory (via 4.B's dual), and the file-descriptor table
/// storage. Never called while `current_process == p` (P7).
pub fn reap_process(id: ProcessId, backend: &mut HardwareBackend) {
    debug_assert_ne!(
        Some(id),
        manager::current_pid(),
        "reap_process: attempted to reap the running task (P7 violation)"
    );

    let task = manager::take_task(id);
    // `task.wait_queue` was already drained into waiters by `task_exit`'s
    // `mark_finished` call; anything left here is freed by `Task`'s own `Drop` glue
    // when `manager::reap` drops the value below.
    let _ = &task.wait_queue;
    log::debug!("reap_process: reaping task {}", id.as_u64());
    manager::reap(task, backend);
}
