//! Wait-queue primitive (§6's `wakeup_queue`).
//!
//! Grounded in `task/scheduler.rs` waiters list, generalized per the
//! spec's design note (§9): a task's `wait_queue` is a list of *ids*, not owning
//! pointers — a waiter's ownership lives in the scheduler's ready/blocked set, never
//! here, so there's no cycle between a task and the tasks waiting on it.

use crate::process::manager;
use crate::process::process::ProcessId;

/// Blocks the current task on `target`'s wait queue (used by a future `waitpid`-style
/// caller; not itself named in §6, but the natural dual of `wakeup_queue`).
pub fn wait_on(target: ProcessId, waiter: ProcessId) {
    manager::with_task(target, |t| t.wait_queue.push(waiter));
}

/// `wakeup_queue(q)` (§6): moves every waiter in `waiters` onto the ready set. Called
/// by `task_exit` (§4.E) with the wait queue it just drained from the exiting task.
pub fn wakeup_queue(waiters: &[ProcessId]) {
    for &id in waiters {
        manager::make_process_ready(id);
    }
}
