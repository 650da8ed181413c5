//! Process tree, ready queue, and reap queue (§6's `spawn_process`/`spawn_init`,
//! `make_process_ready`/`next_ready_process`/`process_available`,
//! `make_process_reapable`/`next_reapable_process`/`should_reap`).
//!
//! Grounded in `ProcessManager` global-manager pattern (a single
//! `spin`-locked struct reachable through a handful of free functions), trimmed from
//! a much larger version — ELF loading, exec, and per-architecture
//! branching are all out of scope here — down to the narrower contract §6 names, plus
//! a `task/scheduler.rs`-style `VecDeque`-backed ready-queue idiom for the two
//! queues this spec actually needs.

use super::process::{next_process_id, ExitCode, ProcessId, ProcessState, Task};
use crate::memory::kernel_stack;
use crate::memory::paging::{self, PageBackend, PageDirectory};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::sync::Arc;
use spin::Mutex;

/// All process-tree/scheduler state lives behind one lock, matching a similar
/// single-global-manager discipline; callers that need to touch it while interrupts
/// could fire (fork, clone, the timer handler) bracket access with `IRQ_OFF`/`IRQ_RES`
/// themselves (§5) rather than this module hiding that from them.
struct Manager {
    tasks: BTreeMap<ProcessId, Task>,
    current: Option<ProcessId>,
    ready: VecDeque<ProcessId>,
    reap: VecDeque<ProcessId>,
}

impl Manager {
    const fn new() -> Self {
        Manager {
            tasks: BTreeMap::new(),
            current: None,
            ready: VecDeque::new(),
            reap: VecDeque::new(),
        }
    }
}

static MANAGER: Mutex<Manager> = Mutex::new(Manager::new());

/// Builds a fresh task with a newly allocated kernel stack, bound to `page_directory`.
/// Shared by `spawn_process`/`spawn_init`; `page_directory` policy (clone vs. share vs.
/// fresh kernel directory) is the caller's decision (§4.B/§4.C).
fn new_task(page_directory: Arc<PageDirectory>) -> Task {
    let stack = kernel_stack::allocate_kernel_stack().expect("spawn: out of kernel stack slots");
    Task::new(next_process_id(), stack, page_directory)
}

/// `spawn_init()` (§6): the very first task, bound to the live kernel directory.
/// Called once from `task::lifecycle::tasking_install`.
pub fn spawn_init() -> ProcessId {
    let mut mgr = MANAGER.lock();
    let task = new_task(paging::kernel_directory().clone());
    let id = task.id;
    mgr.tasks.insert(id, task);
    id
}

/// `spawn_process(parent)` (§6): a fresh task inheriting `parent`'s credentials/fds/
/// image metadata and a fresh kernel stack. Address space is installed separately by
/// the caller via [`set_process_environment`] (§4.C step 3) — `spawn_process` itself
/// always starts the child on `parent`'s current directory so a partially-constructed
/// task is never left without one between the two calls.
pub fn spawn_process(parent: ProcessId) -> ProcessId {
    let mut mgr = MANAGER.lock();
    let parent_dir = mgr
        .tasks
        .get(&parent)
        .expect("spawn_process: unknown parent")
        .thread
        .page_directory
        .clone();
    let mut child = new_task(parent_dir);
    child.parent = Some(parent);
    let id = child.id;
    mgr.tasks.insert(id, child);
    if let Some(p) = mgr.tasks.get_mut(&parent) {
        p.children.push(id);
    }
    id
}

/// `set_process_environment(t, dir)` (§6): binds an address space to a task, used by
/// `fork`/`clone` (§4.C step 3) after `spawn_process` to install the cloned or shared
/// directory in place of the placeholder one `spawn_process` assigned.
pub fn set_process_environment(id: ProcessId, dir: Arc<PageDirectory>) {
    let mut mgr = MANAGER.lock();
    let task = mgr.tasks.get_mut(&id).expect("set_process_environment: unknown task");
    task.thread.page_directory = dir;
}

/// `make_process_ready(t)` (§6): insert into the ready set.
pub fn make_process_ready(id: ProcessId) {
    let mut mgr = MANAGER.lock();
    if let Some(task) = mgr.tasks.get_mut(&id) {
        task.state = ProcessState::Ready;
    }
    mgr.ready.push_back(id);
}

/// `next_ready_process()` (§6): pop a ready task, FIFO (a fair ready queue — P6).
pub fn next_ready_process() -> Option<ProcessId> {
    MANAGER.lock().ready.pop_front()
}

/// `process_available()` (§6).
pub fn process_available() -> bool {
    !MANAGER.lock().ready.is_empty()
}

/// `make_process_reapable(t)` (§6): move a finished task onto the reap queue. Callers
/// must have already set `finished`/`reapable` on the task (§4.E `task_exit`).
pub fn make_process_reapable(id: ProcessId) {
    MANAGER.lock().reap.push_back(id);
}

/// `should_reap()` (§6).
pub fn should_reap() -> bool {
    !MANAGER.lock().reap.is_empty()
}

/// `next_reapable_process()` (§6).
pub fn next_reapable_process() -> Option<ProcessId> {
    MANAGER.lock().reap.pop_front()
}

/// Removes a task from the process tree, returning it for `reap_process` to tear down.
/// The caller (§4.E) has already popped it off the reap queue; this is the final step
/// that erases it from the process tree (§3 lifecycle).
pub fn take_task(id: ProcessId) -> Task {
    MANAGER.lock().tasks.remove(&id).expect("take_task: unknown task")
}

/// Current running task's id (`current_process`, §3/§5).
pub fn current_pid() -> Option<ProcessId> {
    MANAGER.lock().current
}

/// Installs `id` as `current_process`. Written only by `switch_next` (§5).
pub fn set_current_pid(id: ProcessId) {
    MANAGER.lock().current = Some(id);
}

/// Runs `f` with mutable access to a single task by id, for callers (fork, the
/// switcher) that need to read/write a task's saved register snapshot or status.
pub fn with_task<F, R>(id: ProcessId, f: F) -> R
where
    F: FnOnce(&mut Task) -> R,
{
    let mut mgr = MANAGER.lock();
    let task = mgr.tasks.get_mut(&id).expect("with_task: unknown task");
    f(task)
}

/// Reads a task's `ThreadContext` snapshot (`eip`/`esp`/`ebp`/directory) by value,
/// without holding the manager lock across the caller's use of it.
pub fn thread_snapshot(id: ProcessId) -> (u32, u32, u32, Arc<PageDirectory>) {
    with_task(id, |t| {
        (t.thread.eip, t.thread.esp, t.thread.ebp, t.thread.page_directory.clone())
    })
}

/// `task_exit(retval)`'s bookkeeping half (§4.E), separated from the
/// never-resumes-after-this control transfer in `task::lifecycle::task_exit` so it can
/// be unit tested without a live switcher. Returns the waiter ids to wake.
pub fn mark_finished(id: ProcessId, code: ExitCode) -> alloc::vec::Vec<ProcessId> {
    let mut mgr = MANAGER.lock();
    let task = mgr.tasks.get_mut(&id).expect("mark_finished: unknown task");
    task.finished = true;
    task.status = code;
    task.state = ProcessState::Finished;
    core::mem::take(&mut task.wait_queue)
}

pub fn mark_reapable(id: ProcessId) {
    let mut mgr = MANAGER.lock();
    if let Some(task) = mgr.tasks.get_mut(&id) {
        task.reapable = true;
        task.state = ProcessState::Reapable;
    }
}

/// Frees a task's address space (via the 4.B dual) and then drops it, which releases
/// its kernel-stack bitmap slot (`memory::kernel_stack`'s `Drop`) and its inline fd
/// table storage — the three things §4.E's `reap_process` names.
///
/// A `clone`d task shares its `Arc<PageDirectory>` with its parent rather than owning
/// a `fork`-style deep copy (§4.C `AddressSpacePolicy::Share`); frame-freeing only
/// happens when this is the last handle to the directory, so reaping such a child
/// never strips frames a still-running parent maps (§3 "a task's resources may be
/// freed by another task" presumes they're actually this task's alone).
pub fn reap<B: PageBackend>(task: Task, backend: &mut B) {
    if Arc::strong_count(&task.thread.page_directory) == 1 {
        paging::free_directory(&task.thread.page_directory, backend);
    }
    drop(task);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::paging::tests::MockPageBackend;

    fn reset() {
        let mut mgr = MANAGER.lock();
        mgr.tasks.clear();
        mgr.current = None;
        mgr.ready.clear();
        mgr.reap.clear();
    }

    #[test]
    fn ready_queue_is_fifo() {
        reset();
        let a = spawn_init();
        let b = spawn_process(a);
        let c = spawn_process(a);

        assert!(!process_available());
        make_process_ready(b);
        make_process_ready(c);
        assert!(process_available());
        assert_eq!(next_ready_process(), Some(b));
        assert_eq!(next_ready_process(), Some(c));
        assert_eq!(next_ready_process(), None);
        assert!(!process_available());
    }

    #[test]
    fn reap_queue_and_finish_bookkeeping() {
        reset();
        let parent = spawn_init();
        let child = spawn_process(parent);

        assert!(!should_reap());
        let waiters = mark_finished(child, ExitCode(42));
        assert!(waiters.is_empty());
        mark_reapable(child);
        make_process_reapable(child);
        assert!(should_reap());

        let popped = next_reapable_process().unwrap();
        assert_eq!(popped, child);
        let task = take_task(popped);
        assert!(task.finished);
        assert!(task.reapable);
        assert_eq!(task.status, ExitCode(42));

        let mut backend = MockPageBackend::new();
        reap(task, &mut backend);
        assert!(!should_reap());
    }
}
