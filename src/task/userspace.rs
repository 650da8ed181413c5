//! One-shot descent to ring 3 (§4.F `enter_user_jmp`).
//!
//! Grounded in `task/userspace_switch.rs` (`switch_to_userspace`,
//! built around `iretq`), re-derived for the 32-bit `iret` and this spec's four-word
//! argv frame in place of a full register-restore trampoline — there is
//! no return path here, so nothing but the entry registers needs restoring.

use crate::config::ARGV_FRAME_MAGIC;
use crate::gdt::{self, USER_CODE_SELECTOR, USER_DATA_SELECTOR};
use crate::process::manager;
use core::arch::asm;

/// `enter_user_jmp(entry, argc, argv, user_stack_top)` (§4.F): installs the current
/// task's kernel stack top in the TSS, pushes `(0, argv, argc, ARGV_FRAME_MAGIC)` onto
/// the user stack, loads user data selectors, and executes an interrupt-return into
/// ring 3 with interrupts enabled. There is no return.
///
/// # Safety
/// `entry` and `user_stack_top` must be valid, mapped user addresses in the current
/// task's address space; `user_stack_top` must leave at least 16 bytes of mapped,
/// writable stack below it for the argv frame.
pub unsafe fn enter_user_jmp(entry: u32, argc: u32, argv: u32, user_stack_top: u32) -> ! {
    x86::irq::disable();

    let current = manager::current_pid().expect("enter_user_jmp: tasking not installed");
    gdt::set_kernel_stack(manager::with_task(current, |t| t.kernel_stack.top()));

    // Scenario 6 (§8): esp ends at `user_stack_top - 16` with this exact word order
    // on top, recognizable via ARGV_FRAME_MAGIC.
    let frame = (user_stack_top - 16) as *mut u32;
    frame.add(0).write(0);
    frame.add(1).write(argv);
    frame.add(2).write(argc);
    frame.add(3).write(ARGV_FRAME_MAGIC);
    let user_esp = user_stack_top - 16;

    let user_cs = USER_CODE_SELECTOR.bits() as u32;
    let user_ss = USER_DATA_SELECTOR.bits() as u32;
    let eflags = x86::flags::read().bits() as u32 | x86::flags::Flags::FLAGS_IF.bits() as u32;

    asm!(
        "mov ax, {user_ss:x}",
        "mov ds, ax",
        "mov es, ax",
        "mov fs, ax",
        "mov gs, ax",
        "push {user_ss}",
        "push {user_esp}",
        "push {eflags}",
        "push {user_cs}",
        "push {entry}",
        "iretd",
        user_ss = in(reg) user_ss,
        user_esp = in(reg) user_esp,
        eflags = in(reg) eflags,
        user_cs = in(reg) user_cs,
        entry = in(reg) entry,
        options(noreturn),
    );
}
