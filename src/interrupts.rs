//! IDT, PIC remap, and exception/IRQ handlers.
//!
//! A 64-bit analogue builds its IDT through `x86_64::structures::idt::InterruptDescriptorTable`
//! and dispatches per-CPU preemption bookkeeping, IST stacks, and framebuffer diagnostics
//! out of every handler. None of that applies here: this kernel is single-core, has no
//! IST concept (the 32-bit TSS carries only `esp0`), and has no graphics console. The IDT
//! entry layout and `extern "x86-interrupt"` handler ABI are grounded in
//! `Retro-DOS-DEV-imm-dos-nx/kernel/src/idt.rs`, re-typed onto the `x86` crate's
//! `dtables::{DescriptorTablePointer, lidt}` in place of a hand-rolled `lidt` asm stub, to
//! stay consistent with `gdt.rs`'s use of the same crate for `lgdt`.

use crate::config;
use crate::gdt::KERNEL_CODE_SELECTOR;
use crate::task;
use pic8259::ChainedPics;
use spin::Mutex;
use x86::dtables::{self, DescriptorTablePointer};

pub mod timer;

pub const PIC_1_OFFSET: u8 = 32;
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

const DIVIDE_ERROR: usize = 0;
const PAGE_FAULT: usize = 14;
const GENERAL_PROTECTION_FAULT: usize = 13;
const DOUBLE_FAULT: usize = 8;
const TIMER_IRQ: usize = PIC_1_OFFSET as usize;

const IDT_ENTRIES: usize = 256;
const GATE_PRESENT: u8 = 1 << 7;
const GATE_TYPE_INT_32: u8 = 0xe;

#[derive(Copy, Clone)]
#[repr(C, packed)]
struct IdtEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_and_attr: u8,
    offset_high: u16,
}

impl IdtEntry {
    const fn missing() -> Self {
        IdtEntry {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_and_attr: 0,
            offset_high: 0,
        }
    }

    fn new(handler: u32, selector: u16) -> Self {
        IdtEntry {
            offset_low: handler as u16,
            selector,
            zero: 0,
            type_and_attr: GATE_PRESENT | GATE_TYPE_INT_32,
            offset_high: (handler >> 16) as u16,
        }
    }
}

static mut IDT: [IdtEntry; IDT_ENTRIES] = [IdtEntry::missing(); IDT_ENTRIES];

/// Register frame pushed by the CPU (and, for faulting vectors, the error code) before
/// the `extern "x86-interrupt"` handler runs. The ABI guarantees the handler restores
/// every general-purpose register it touches, so this only models what the hardware
/// itself pushes.
#[repr(C)]
pub struct InterruptStackFrame {
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
}

fn set_gate(vector: usize, handler: u32) {
    unsafe {
        IDT[vector] = IdtEntry::new(handler, KERNEL_CODE_SELECTOR.bits());
    }
}

pub fn init_idt() {
    set_gate(DIVIDE_ERROR, divide_error_handler as u32);
    set_gate(DOUBLE_FAULT, double_fault_handler as u32);
    set_gate(GENERAL_PROTECTION_FAULT, general_protection_fault_handler as u32);
    set_gate(PAGE_FAULT, page_fault_handler as u32);
    set_gate(TIMER_IRQ, timer_interrupt_handler as u32);

    let idtr = unsafe {
        DescriptorTablePointer::new_from_slice(&IDT[..])
    };
    unsafe {
        dtables::lidt(&idtr);
    }

    log::info!("IDT loaded ({} entries)", IDT_ENTRIES);
}

/// Remap the PICs so IRQs 0-15 land on vectors 32-47, clear of the CPU exception range,
/// then mask every line except the PIT (IRQ0). Raw port I/O is identical on 32- and
/// 64-bit x86, so this is carried over unchanged in substance.
pub fn init_pic() {
    unsafe {
        PICS.lock().initialize();
        PICS.lock().write_masks(0b1111_1110, 0b1111_1111);
    }
    log::info!("PICs remapped: master={:#x} slave={:#x}", PIC_1_OFFSET, PIC_2_OFFSET);
}

pub fn init() {
    init_idt();
    init_pic();
    timer::init();
    unsafe {
        x86::irq::enable();
    }
}

extern "x86-interrupt" fn divide_error_handler(stack_frame: &InterruptStackFrame) {
    log::error!(
        "EXCEPTION: DIVIDE ERROR at eip={:#x} cs={:#x} eflags={:#x}",
        stack_frame.eip, stack_frame.cs, stack_frame.eflags
    );
    crate::hlt_loop();
}

extern "x86-interrupt" fn general_protection_fault_handler(
    stack_frame: &InterruptStackFrame,
    error_code: u32,
) {
    log::error!(
        "EXCEPTION: GENERAL PROTECTION FAULT error_code={:#x} eip={:#x} cs={:#x}",
        error_code, stack_frame.eip, stack_frame.cs
    );
    crate::hlt_loop();
}

extern "x86-interrupt" fn double_fault_handler(
    stack_frame: &InterruptStackFrame,
    error_code: u32,
) -> ! {
    log::error!(
        "DOUBLE FAULT error_code={:#x} eip={:#x} cs={:#x} eflags={:#x}",
        error_code, stack_frame.eip, stack_frame.cs, stack_frame.eflags
    );
    loop {
        unsafe { x86::halt() };
    }
}

extern "x86-interrupt" fn page_fault_handler(stack_frame: &InterruptStackFrame, error_code: u32) {
    let cr2 = unsafe { x86::controlregs::cr2() };
    log::error!(
        "EXCEPTION: PAGE FAULT accessing {:#x}, error_code={:#x} eip={:#x}",
        cr2, error_code, stack_frame.eip
    );
    crate::hlt_loop();
}

/// Runs on every PIT tick. Bumps the tick counter, sends EOI, and asks the scheduler to
/// reschedule (§4.D, §5) — the actual register save/restore happens inside
/// `task::context::switch_task`, invoked after EOI so the next task never misses a tick
/// of interrupt latency waiting on PIC acknowledgement.
extern "x86-interrupt" fn timer_interrupt_handler(_stack_frame: &InterruptStackFrame) {
    timer::tick();
    unsafe {
        PICS.lock().notify_end_of_interrupt(TIMER_IRQ as u8);
    }
    task::context::switch_task(true);
}
