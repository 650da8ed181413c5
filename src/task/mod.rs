//! Task-side half of the core: the capture-resume context switcher (4.D), lifecycle
//! entry points (4.E), the wait-queue primitive (§6), and the one-shot ring-3 descent
//! (4.F).
//!
//! Trimmed down from an `executor`/`scheduler`/`kthread`-style `task/` directory (`executor`, `scheduler`, `kthread`,
//! `workqueue`, `softirqd`, `process_context`, `process_task`, `spawn` — an async
//! executor and kernel-thread layer this crate has no use for, §1 out-of-scope) down to
//! the four modules this crate actually uses.

pub mod context;
pub mod lifecycle;
pub mod userspace;
pub mod wait;
