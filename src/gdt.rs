//! Global Descriptor Table and Task State Segment.
//!
//! Flat kernel/user code+data segments plus a single TSS whose `esp0` is the only field
//! this kernel ever updates (on every context switch, via [`set_kernel_stack`]). Grounded
//! in `gdt.rs`'s own prior shape (`OnceCell`-based lazy init, `set_kernel_stack` contract),
//! re-typed onto the 32-bit `x86` crate in place of `x86_64`.

use conquer_once::spin::OnceCell;
use core::sync::atomic::{AtomicU32, Ordering};
use x86::bits32::task::TaskStateSegment;
use x86::dtables::{self, DescriptorTablePointer};
use x86::segmentation::{
    BuildDescriptor, CodeSegmentType, DataSegmentType, Descriptor as SegDescriptor,
    DescriptorBuilder, SegmentDescriptorBuilder, SegmentSelector,
};
use x86::task;
use x86::Ring;

const GDT_ENTRIES: usize = 6;

const KERNEL_CODE_IDX: usize = 1;
const KERNEL_DATA_IDX: usize = 2;
const USER_CODE_IDX: usize = 3;
const USER_DATA_IDX: usize = 4;
const TSS_IDX: usize = 5;

pub const KERNEL_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(KERNEL_CODE_IDX as u16, Ring::Ring0);
pub const KERNEL_DATA_SELECTOR: SegmentSelector = SegmentSelector::new(KERNEL_DATA_IDX as u16, Ring::Ring0);
pub const USER_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(USER_CODE_IDX as u16, Ring::Ring3);
pub const USER_DATA_SELECTOR: SegmentSelector = SegmentSelector::new(USER_DATA_IDX as u16, Ring::Ring3);

static TSS: OnceCell<TaskStateSegment> = OnceCell::uninit();
static GDT: OnceCell<[u64; GDT_ENTRIES]> = OnceCell::uninit();

/// Cached `esp0` so [`get_kernel_stack`] (used by tests) doesn't need to read the TSS back.
static CURRENT_ESP0: AtomicU32 = AtomicU32::new(0);

pub fn init() {
    TSS.init_once(|| {
        let mut tss = TaskStateSegment::new();
        tss.ss0 = KERNEL_DATA_SELECTOR.bits();
        tss.esp0 = 0;
        tss.iomap_base = core::mem::size_of::<TaskStateSegment>() as u16;
        tss
    });

    let tss_ref = TSS.get().unwrap();

    GDT.init_once(|| {
        let mut entries = [0u64; GDT_ENTRIES];

        entries[KERNEL_CODE_IDX] = SegDescriptor::builder()
            .limit(0xFFFFF)
            .base(0)
            .granularity(true)
            .present()
            .dpl(Ring::Ring0)
            .execute_code(CodeSegmentType::ExecuteRead)
            .finish()
            .as_u64();

        entries[KERNEL_DATA_IDX] = SegDescriptor::builder()
            .limit(0xFFFFF)
            .base(0)
            .granularity(true)
            .present()
            .dpl(Ring::Ring0)
            .execute_data(DataSegmentType::ReadWrite)
            .finish()
            .as_u64();

        entries[USER_CODE_IDX] = SegDescriptor::builder()
            .limit(0xFFFFF)
            .base(0)
            .granularity(true)
            .present()
            .dpl(Ring::Ring3)
            .execute_code(CodeSegmentType::ExecuteRead)
            .finish()
            .as_u64();

        entries[USER_DATA_IDX] = SegDescriptor::builder()
            .limit(0xFFFFF)
            .base(0)
            .granularity(true)
            .present()
            .dpl(Ring::Ring3)
            .execute_data(DataSegmentType::ReadWrite)
            .finish()
            .as_u64();

        let tss_base = tss_ref as *const _ as u32;
        let tss_limit = core::mem::size_of::<TaskStateSegment>() as u32 - 1;
        entries[TSS_IDX] = SegDescriptor::builder()
            .limit(tss_limit)
            .base(tss_base)
            .present()
            .dpl(Ring::Ring0)
            .tss()
            .finish()
            .as_u64();

        entries
    });

    let entries = GDT.get().unwrap();
    let gdtr = DescriptorTablePointer::new_from_slice(entries.as_slice());

    unsafe {
        dtables::lgdt(&gdtr);
        x86::segmentation::load_cs(KERNEL_CODE_SELECTOR);
        x86::segmentation::load_ds(KERNEL_DATA_SELECTOR);
        x86::segmentation::load_es(KERNEL_DATA_SELECTOR);
        x86::segmentation::load_ss(KERNEL_DATA_SELECTOR);
        task::load_tr(SegmentSelector::new(TSS_IDX as u16, Ring::Ring0));
    }

    log::info!("GDT loaded: kernel CS={:#x} DS={:#x}, user CS={:#x} DS={:#x}, TSS={:#x}",
        KERNEL_CODE_SELECTOR.bits(), KERNEL_DATA_SELECTOR.bits(),
        USER_CODE_SELECTOR.bits(), USER_DATA_SELECTOR.bits(), TSS_IDX);
}

/// Install `stack_top` as the ring-0 stack pointer used on the next ring-3 → ring-0
/// transition (interrupt, exception, or `enter_user_jmp`'s eventual syscall-back). This
/// is the `set_kernel_stack` external contract from §6, invoked by `switch_next` (§4.D)
/// on every context switch.
pub fn set_kernel_stack(stack_top: u32) {
    // SAFETY: TSS is only ever mutated through this single-writer accessor, and only the
    // `esp0` field (never touched by the CPU except on a ring transition) is written.
    let tss_ptr = TSS.get().expect("TSS not initialized") as *const TaskStateSegment as *mut TaskStateSegment;
    unsafe {
        (*tss_ptr).esp0 = stack_top;
    }
    CURRENT_ESP0.store(stack_top, Ordering::Release);
}

pub fn get_kernel_stack() -> u32 {
    CURRENT_ESP0.load(Ordering::Acquire)
}
