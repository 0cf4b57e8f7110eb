//! Multi-core programs sharing one data segment.

use pretty_assertions::assert_eq;
use smpvm_core::common::addr::PhysAddr;
use smpvm_core::common::error::CpuError;
use smpvm_core::core::cpu::CoreState;
use smpvm_core::isa::instruction::{Condition, Width};

use crate::common::builder::{ProgramBuilder, r};
use crate::common::harness::{DATA_BASE, STACK_STRIDE, STACK_TOP, TestContext, init_state};

const SHARED: i32 = 0x300;

/// Stores 0xBEEF to the shared word, then halts.
fn producer() -> ProgramBuilder {
    ProgramBuilder::new()
        .li(r(1), 0xBEEF)
        .li(r(2), SHARED)
        .store(Width::Word, r(1), r(2), 0)
        .hlt(0)
}

/// Spins until the shared word is non-zero, then halts with it.
fn consumer() -> ProgramBuilder {
    ProgramBuilder::new()
        .li(r(2), SHARED)
        .load(Width::Word, r(1), r(2), 0)
        .cmp_imm(r(1), 0)
        .branch(Condition::Equal, -12)
        .hlt_reg(r(1))
}

#[test]
fn consumer_sees_producer_store() {
    let mut ctx = TestContext::with_cores(2)
        .load_program(0, &producer().words())
        .load_program(0x40, &consumer().words())
        .boot_at(&[0, 0x40]);

    let rounds = ctx.run(50);
    assert!(rounds < 50);
    assert_eq!(ctx.core(0).exit_code(), 0);
    assert_eq!(ctx.core(1).exit_code(), 0xBEEF);
    assert_eq!(ctx.cpu.exit_code(), 0xBEEF);
    assert_eq!(ctx.backend_u32(SHARED as u32), 0xBEEF);
}

#[test]
fn cores_get_separate_stacks() {
    let ctx = TestContext::with_cores(3).boot_at(&[0, 0, 0]);
    for id in 0..3 {
        assert_eq!(
            ctx.core(id).regs().sp,
            STACK_TOP - STACK_STRIDE * id as u32
        );
    }
}

#[test]
fn write_on_one_core_invalidates_the_other() {
    let ctx = TestContext::with_cores(2).boot_at(&[0, 0]);
    let addr = PhysAddr(DATA_BASE + 0x80);
    let (a, b) = (ctx.core(0).dcache(), ctx.core(1).dcache());

    assert_eq!(b.read_u16(addr).unwrap(), 0);
    a.write_u16(addr, 0x4242).unwrap();
    assert!(b.entry(addr).is_none());
    assert_eq!(b.read_u16(addr).unwrap(), 0x4242);
    assert_eq!(ctx.backend_u16(addr.val()), 0x4242);
}

#[test]
fn broadcast_suspend_wake_and_halt() {
    let mut ctx = TestContext::with_cores(3).boot_at(&[0, 0]);

    ctx.cpu.suspend();
    assert_eq!(ctx.cpu.count_in(CoreState::Suspended), 2);
    assert!(ctx.cpu.runnable_cores().is_empty());
    assert_eq!(ctx.cpu.step_round(), 0);
    assert!(ctx.cpu.is_alive());

    ctx.cpu.wake_up();
    assert_eq!(ctx.cpu.runnable_cores(), vec![0, 1]);

    ctx.cpu.halt(5);
    assert!(!ctx.cpu.is_alive());
    assert_eq!(ctx.cpu.count_in(CoreState::Halted), 2);
    assert_eq!(ctx.cpu.count_in(CoreState::Reset), 1);
    assert_eq!(ctx.cpu.exit_code(), 5);
    assert!(ctx.cpu.controller().live_cores().is_empty());
}

#[test]
fn exit_code_is_first_non_zero_in_core_order() {
    let mut ctx = TestContext::with_cores(3)
        .load_program(0, &ProgramBuilder::new().hlt(0).words())
        .load_program(0x10, &ProgramBuilder::new().hlt(6).words())
        .load_program(0x20, &ProgramBuilder::new().hlt(9).words())
        .boot_at(&[0, 0x10, 0x20]);
    assert_eq!(ctx.cpu.step_round(), 3);
    assert_eq!(ctx.cpu.exit_code(), 6);
}

#[test]
fn irq_all_reaches_only_cores_that_accept() {
    let mut ctx = TestContext::with_cores(3).boot_at(&[0, 0]);
    ctx.core_mut(1).regs_mut().flags.hwint_enabled = false;
    assert_eq!(ctx.cpu.irq_all(4), 1);
    assert_eq!(ctx.core(0).interrupt_depth(), 1);
    assert_eq!(ctx.core(1).interrupt_depth(), 0);
}

#[test]
fn boot_rejects_more_states_than_cores() {
    let mut ctx = TestContext::with_cores(1);
    let states = [init_state(0, 0), init_state(1, 0)];
    assert_eq!(
        ctx.cpu.boot(&states),
        Err(CpuError::TooManyInitStates { given: 2, cores: 1 })
    );
    assert_eq!(ctx.cpu.count_in(CoreState::Reset), 1);
    assert_eq!(ctx.cpu.core(3).unwrap_err(), CpuError::NoSuchCore(3));
}

#[test]
fn message_passing_between_threads() {
    // Writer: X = 0xBEEF, then Y = 1. Reader: wait for Y, then read X.
    let writer = ProgramBuilder::new()
        .li(r(1), 0xBEEF)
        .li(r(2), SHARED)
        .store(Width::Word, r(1), r(2), 0)
        .li(r(3), 1)
        .store(Width::Word, r(3), r(2), 4)
        .hlt(0);
    let reader = ProgramBuilder::new()
        .li(r(2), SHARED)
        .load(Width::Word, r(3), r(2), 4)
        .cmp_imm(r(3), 0)
        .branch(Condition::Equal, -12)
        .load(Width::Word, r(1), r(2), 0)
        .hlt_reg(r(1));
    let mut ctx = TestContext::with_cores(2)
        .load_program(0, &writer.words())
        .load_program(0x80, &reader.words())
        .boot_at(&[0, 0x80]);

    let (first, second) = ctx.cpu.cores_mut().split_at_mut(1);
    let (a, b) = (&mut first[0], &mut second[0]);
    std::thread::scope(|s| {
        s.spawn(move || while a.step() {});
        s.spawn(move || {
            for _ in 0..1_000_000 {
                if !b.step() {
                    break;
                }
            }
        });
    });

    assert_eq!(ctx.core(0).state(), CoreState::Halted);
    assert_eq!(ctx.core(1).state(), CoreState::Halted);
    assert_eq!(ctx.core(1).exit_code(), 0xBEEF);
}
