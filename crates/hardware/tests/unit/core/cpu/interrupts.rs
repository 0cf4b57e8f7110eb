//! Software and hardware interrupts, vector tables, and virtual interrupts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use smpvm_core::common::addr::page_base;
use smpvm_core::common::constants::{GENERAL_REGISTER_COUNT, PAGE_SIZE};
use smpvm_core::common::error::{Fault, MemoryError};
use smpvm_core::common::reg::Register;
use smpvm_core::common::sync::lock;
use smpvm_core::config::Config;
use smpvm_core::core::arch::flags::Flags;
use smpvm_core::core::cpu::{CoreInitState, CoreState, CpuCore};
use smpvm_core::core::interrupts::{
    ALLOC_FAILED, HALT_INTERRUPT, MEMORY_INTERRUPT, VirtualInterrupt, VirtualInterruptTable,
};
use smpvm_core::soc::traits::{InterruptVector, MemoryBackend, PageInfo};
use smpvm_core::soc::{CpuBuilder, share};

use crate::common::builder::{ProgramBuilder, r};
use crate::common::harness::{DATA_BASE, MEMORY_SIZE, STACK_TOP, TestContext};
use crate::common::mocks::memory::MockBackend;

const HANDLER: u32 = 0x100;

fn vector(sp: u32) -> InterruptVector {
    InterruptVector {
        cs: 1,
        ds: 2,
        ip: HANDLER,
        sp,
    }
}

/// `main` raises interrupt 5; the handler clobbers `r3` and returns.
fn int_program() -> (Vec<u32>, Vec<u32>) {
    let main = ProgramBuilder::new().li(r(3), 77).int(5).hlt_reg(r(3));
    let handler = ProgramBuilder::new().li(r(3), 1).retint();
    (main.words(), handler.words())
}

fn free_pages(ctx: &TestContext) -> u32 {
    lock(&ctx.memory).free_page_count()
}

#[test]
fn int_with_allocated_stack_switches_and_restores_context() {
    let (main, handler) = int_program();
    let mut ctx = TestContext::new()
        .with_vectors(&[(5, vector(0))])
        .load_program(0, &main)
        .load_program(HANDLER, &handler)
        .boot();
    let free_before = free_pages(&ctx);

    ctx.step_n(0, 2);
    let core = ctx.core(0);
    let page = 0x200;
    assert_eq!(core.interrupt_depth(), 1);
    assert_eq!(core.regs().ip, HANDLER);
    assert_eq!(core.regs().ds, 2);
    assert!(core.regs().flags.privileged);
    assert_eq!(free_pages(&ctx), free_before - 1);
    assert!(lock(&ctx.memory).get_page(page).unwrap().allocated);
    // 34 context words plus the two-word frame.
    let top = page_base(page).val() + PAGE_SIZE - DATA_BASE;
    assert_eq!(core.regs().sp, top - 36 * 4);
    assert_eq!(core.frames().len(), 1);

    ctx.step_n(0, 2);
    let core = ctx.core(0);
    assert_eq!(core.interrupt_depth(), 0);
    assert_eq!(core.regs().ip, 8);
    assert_eq!(core.regs().sp, STACK_TOP);
    assert_eq!(ctx.gpr(0, 3), 77);
    assert!(core.frames().is_empty());
    assert_eq!(free_pages(&ctx), free_before);

    assert!(ctx.step(0));
    assert_eq!(ctx.core(0).exit_code(), 77);
}

#[test]
fn int_with_fixed_stack_allocates_nothing() {
    let (main, handler) = int_program();
    let mut ctx = TestContext::new()
        .with_vectors(&[(5, vector(0x4000))])
        .load_program(0, &main)
        .load_program(HANDLER, &handler)
        .boot();
    let free_before = free_pages(&ctx);

    ctx.step_n(0, 2);
    assert_eq!(ctx.core(0).regs().sp, 0x4000 - 36 * 4);
    assert_eq!(free_pages(&ctx), free_before);

    let _ = ctx.run(10);
    assert_eq!(ctx.core(0).exit_code(), 77);
    assert_eq!(free_pages(&ctx), free_before);
}

#[test]
fn retint_restores_flags_of_the_interrupted_code() {
    let main = ProgramBuilder::new().li(r(1), 0).int(5).hlt(0);
    let handler = ProgramBuilder::new().li(r(1), -1).retint();
    let mut ctx = TestContext::new()
        .with_vectors(&[(5, vector(0))])
        .load_program(0, &main.words())
        .load_program(HANDLER, &handler.words())
        .boot();
    ctx.step_n(0, 1);
    let flags = ctx.core(0).regs().flags;
    assert!(flags.zero);

    ctx.step_n(0, 3);
    assert_eq!(ctx.core(0).regs().flags, flags);
}

#[test]
fn retint_without_active_interrupt_faults() {
    let program = ProgramBuilder::new().retint();
    let mut ctx = TestContext::new().load_program(0, &program.words()).boot();
    assert!(ctx.step(0));
    assert_eq!(
        ctx.core(0).last_fault(),
        Some(&Fault::InvalidFrame {
            expected: 0,
            found: STACK_TOP,
        })
    );
}

#[test]
fn irq_wakes_a_suspended_core() {
    let main = ProgramBuilder::new().idle().hlt(3);
    let handler = ProgramBuilder::new().retint();
    let mut ctx = TestContext::new()
        .with_vectors(&[(5, vector(0))])
        .load_program(0, &main.words())
        .load_program(HANDLER, &handler.words())
        .boot();
    assert!(ctx.step(0));
    assert_eq!(ctx.core(0).state(), CoreState::Suspended);

    assert!(ctx.core_mut(0).irq(5));
    let core = ctx.core(0);
    assert_eq!(core.state(), CoreState::Running);
    assert_eq!(core.regs().ip, HANDLER);

    let _ = ctx.run(5);
    assert_eq!(ctx.core(0).exit_code(), 3);
}

#[test]
fn irq_is_refused_when_disabled_or_not_alive() {
    let mut ctx = TestContext::new().with_vectors(&[(5, vector(0))]);
    assert!(!ctx.core_mut(0).irq(5));

    let mut ctx = ctx.boot();
    ctx.core_mut(0).regs_mut().flags.hwint_enabled = false;
    assert!(!ctx.core_mut(0).irq(5));
    assert_eq!(ctx.core(0).interrupt_depth(), 0);

    ctx.core_mut(0).halt(0);
    ctx.core_mut(0).regs_mut().flags.hwint_enabled = true;
    assert!(!ctx.core_mut(0).irq(5));
}

#[test]
fn cli_and_sti_toggle_interrupt_delivery() {
    let program = ProgramBuilder::new().cli().sti();
    let mut ctx = TestContext::new()
        .with_vectors(&[(5, vector(0))])
        .load_program(0, &program.words())
        .boot();
    ctx.step_n(0, 1);
    assert!(!ctx.core(0).regs().flags.hwint_enabled);
    assert!(!ctx.core_mut(0).irq(5));
    ctx.step_n(0, 1);
    assert!(ctx.core_mut(0).irq(5));
}

#[test]
fn halt_interrupt_uses_r0_as_exit_code() {
    let program = ProgramBuilder::new()
        .li(r(0), 0x2A)
        .int(HALT_INTERRUPT as i32)
        .hlt(0);
    let mut ctx = TestContext::new().load_program(0, &program.words()).boot();
    ctx.step_n(0, 2);
    let core = ctx.core(0);
    assert_eq!(core.state(), CoreState::Halted);
    assert_eq!(core.exit_code(), 0x2A);
    assert_eq!(core.interrupt_depth(), 0);
}

#[test]
fn memory_interrupt_allocates_frees_and_counts() {
    let program = ProgramBuilder::new()
        .li(r(0), 0)
        .int(MEMORY_INTERRUPT as i32)
        .mov(r(5), r(0))
        .li(r(0), 2)
        .int(MEMORY_INTERRUPT as i32)
        .mov(r(6), r(0))
        .mov(r(1), r(5))
        .li(r(0), 1)
        .int(MEMORY_INTERRUPT as i32)
        .li(r(0), 2)
        .int(MEMORY_INTERRUPT as i32)
        .hlt(0);
    let mut ctx = TestContext::new().load_program(0, &program.words()).boot();
    let free_before = free_pages(&ctx);

    ctx.step_n(0, 2);
    let page = ctx.gpr(0, 0);
    assert_ne!(page, ALLOC_FAILED);
    assert!(lock(&ctx.memory).get_page(page).unwrap().allocated);

    let _ = ctx.run(20);
    assert_eq!(ctx.core(0).exit_code(), 0);
    assert_eq!(ctx.gpr(0, 6), free_before - 1);
    assert_eq!(ctx.gpr(0, 0), free_before);
    assert!(!lock(&ctx.memory).get_page(page).unwrap().allocated);
}

#[test]
fn memory_interrupt_reports_exhaustion_in_r0() {
    let mut config = Config::default();
    config.memory.size = PAGE_SIZE * 2;
    let program = ProgramBuilder::new()
        .li(r(0), 0)
        .int(MEMORY_INTERRUPT as i32)
        .hlt(0);
    let mut ctx = TestContext::with_config(&config);
    {
        let mut memory = lock(&ctx.memory);
        memory.write_u32(page_base(0), program.words()[0]).unwrap();
        memory.write_u32(page_base(0).offset(4), program.words()[1]).unwrap();
        memory.write_u32(page_base(0).offset(8), program.words()[2]).unwrap();
        memory.reserve(page_base(0), PAGE_SIZE * 2).unwrap();
    }
    ctx.cpu
        .boot(&[CoreInitState {
            cs: 0,
            ds: 0,
            sp: PAGE_SIZE * 2,
            ip: 0,
            privileged: true,
        }])
        .unwrap();
    ctx.step_n(0, 2);
    assert_eq!(ctx.gpr(0, 0), ALLOC_FAILED);
    assert_eq!(ctx.core(0).state(), CoreState::Running);
}

#[test]
fn unknown_memory_service_faults() {
    let program = ProgramBuilder::new()
        .li(r(0), 9)
        .int(MEMORY_INTERRUPT as i32);
    let mut ctx = TestContext::new().load_program(0, &program.words()).boot();
    ctx.step_n(0, 2);
    assert!(matches!(
        ctx.core(0).last_fault(),
        Some(Fault::AccessViolation(_))
    ));
}

struct Counter(Arc<AtomicU32>);

impl VirtualInterrupt for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn run(&self, core: &mut CpuCore) -> Result<(), Fault> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        core.write(Register::General(0), n)
    }
}

#[test]
fn custom_virtual_interrupt_shadows_the_vector_table() {
    let hits = Arc::new(AtomicU32::new(0));
    let mut table = VirtualInterruptTable::with_defaults();
    table.install(5, Arc::new(Counter(Arc::clone(&hits))));
    let mut config = Config::default();
    config.memory.size = MEMORY_SIZE;
    let builder = CpuBuilder::new(&config).virtual_interrupts(table);

    let program = ProgramBuilder::new().int(5).int(5).hlt_reg(r(0));
    let mut ctx = TestContext::with_builder(builder)
        .with_vectors(&[(5, vector(0))])
        .load_program(0, &program.words())
        .boot();
    let _ = ctx.run(10);

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(ctx.core(0).exit_code(), 2);
    assert_eq!(ctx.core(0).interrupt_depth(), 0);
}

/// Overwrites every general register, then returns.
fn clobbering_handler() -> Vec<u32> {
    (0..GENERAL_REGISTER_COUNT as u8)
        .fold(ProgramBuilder::new(), |p, n| p.li(r(n), -1 - i32::from(n)))
        .retint()
        .words()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn retint_restores_the_interrupted_register_file(
        seed in any::<u32>(),
        cs in 0u32..4,
        ds in 0u32..4,
        sp in any::<u32>(),
        fp in any::<u32>(),
        ip in any::<u32>(),
        flag_bits in 0u32..64,
        allocated_stack in any::<bool>(),
    ) {
        let handler = clobbering_handler();
        let stack = if allocated_stack { 0 } else { 0x4000 };
        let mut ctx = TestContext::new()
            .with_vectors(&[(5, vector(stack))])
            .load_program(HANDLER, &handler)
            .boot();
        let free_before = free_pages(&ctx);

        let core = ctx.core_mut(0);
        let regs = core.regs_mut();
        for (n, reg) in regs.gpr.iter_mut().enumerate() {
            *reg = seed.wrapping_add(n as u32).rotate_left(n as u32);
        }
        regs.cs = cs;
        regs.ds = ds;
        regs.sp = sp;
        regs.fp = fp;
        regs.ip = ip;
        regs.flags = Flags::from_u32(flag_bits);
        let before = core.regs().clone();

        prop_assert!(core.do_int(5).is_ok());
        prop_assert_eq!(core.regs().ip, HANDLER);
        prop_assert!(core.regs().privileged());

        ctx.step_n(0, handler.len());
        let core = ctx.core(0);
        prop_assert_eq!(core.state(), CoreState::Running);
        prop_assert_eq!(core.interrupt_depth(), 0);

        let mut expected = before;
        expected.cnt = core.regs().cnt;
        prop_assert_eq!(core.regs(), &expected);
        prop_assert_eq!(free_pages(&ctx), free_before);
    }
}

#[test]
fn failed_entry_releases_the_handler_stack_even_when_free_fails() {
    const STACK_PAGE: u32 = 0x1F0;
    let mut backend = MockBackend::new();
    // Vector table words are readable; the handler stack is not.
    backend.expect_read_u16().returning(|addr| {
        if addr.val() < 0x100 {
            Ok(1)
        } else {
            Err(MemoryError::OutOfBounds {
                addr: addr.val(),
                size: 2,
            })
        }
    });
    backend.expect_read_u32().returning(|_| Ok(0));
    backend
        .expect_alloc_page()
        .times(1)
        .returning(|_| Ok(STACK_PAGE));
    backend.expect_get_page().returning(|page| {
        Ok(PageInfo {
            index: page,
            base: page_base(page),
            allocated: true,
        })
    });
    backend
        .expect_free_page()
        .withf(|page| *page == STACK_PAGE)
        .times(1)
        .returning(|page| Err(MemoryError::PageNotAllocated(page)));

    let mut cpu = CpuBuilder::new(&Config::default())
        .memory(share(backend))
        .build();
    cpu.boot(&[CoreInitState {
        cs: 1,
        ds: 2,
        sp: STACK_TOP,
        ip: 0,
        privileged: true,
    }])
    .unwrap();

    let core = cpu.core_mut(0).unwrap();
    assert!(matches!(
        core.do_int(5),
        Err(Fault::Memory(MemoryError::OutOfBounds { .. }))
    ));
    assert_eq!(core.interrupt_depth(), 0);
    assert_eq!(core.regs().ds, 2);
    assert_eq!(core.regs().sp, STACK_TOP);
    assert_eq!(core.regs().cs, 1);
}
