//! Snapshot capture, serialization, and restore.

use pretty_assertions::assert_eq;
use smpvm_core::common::error::CpuError;
use smpvm_core::core::cpu::CoreState;
use smpvm_core::core::cpu::snapshot::CoreSnapshot;
use smpvm_core::isa::MATH_SET_ID;
use smpvm_core::isa::instruction::MathOp;

use crate::common::builder::{ProgramBuilder, r};
use crate::common::harness::TestContext;

fn program() -> ProgramBuilder {
    ProgramBuilder::new()
        .li(r(5), 0x55)
        .sis(i32::from(MATH_SET_ID))
        .math(MathOp::PushW(r(5)))
        .math(MathOp::PopW(r(6)))
        .sis(0)
        .hlt_reg(r(6))
}

fn paused_after(steps: usize) -> TestContext {
    let mut ctx = TestContext::new()
        .load_program(0, &program().words())
        .boot();
    ctx.step_n(0, steps);
    ctx
}

#[test]
fn snapshot_captures_architectural_state() {
    let ctx = paused_after(3);
    let snapshot = ctx.core(0).snapshot();
    assert_eq!(snapshot.id, 0);
    assert_eq!(snapshot.state, CoreState::Running);
    assert_eq!(snapshot.gpr.len(), 30);
    assert_eq!(snapshot.gpr[5], 0x55);
    assert_eq!(snapshot.ip, 12);
    assert_eq!(snapshot.cnt, 3);
    assert_eq!(snapshot.active_set, MATH_SET_ID);
    assert_eq!(snapshot.math_stack, vec![0x55]);
    assert_eq!(snapshot.fault, None);
}

#[test]
fn snapshot_survives_json() {
    let snapshot = paused_after(3).core(0).snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: CoreSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn restored_core_resumes_where_the_snapshot_left_off() {
    let snapshot = paused_after(3).core(0).snapshot();

    let mut fresh = TestContext::new().load_program(0, &program().words());
    fresh.core_mut(0).restore(&snapshot).unwrap();
    let core = fresh.core(0);
    assert_eq!(core.state(), CoreState::Running);
    assert_eq!(core.active_set(), MATH_SET_ID);
    assert_eq!(core.math_stack().values(), &[0x55]);
    assert!(core.controller().is_registered(0));

    let _ = fresh.run(10);
    assert_eq!(fresh.core(0).exit_code(), 0x55);
}

#[test]
fn restore_requires_a_reset_core() {
    let snapshot = paused_after(1).core(0).snapshot();
    let mut running = paused_after(1);
    assert_eq!(
        running.core_mut(0).restore(&snapshot),
        Err(CpuError::InvalidState {
            core: 0,
            action: "restore",
            state: "running",
        })
    );
}

#[test]
fn restore_rejects_a_halted_snapshot() {
    let done = paused_after(10);
    assert_eq!(done.core(0).state(), CoreState::Halted);
    let snapshot = done.core(0).snapshot();

    let mut fresh = TestContext::new();
    assert!(matches!(
        fresh.core_mut(0).restore(&snapshot),
        Err(CpuError::InvalidState { state: "halted", .. })
    ));
    assert_eq!(fresh.core(0).state(), CoreState::Reset);
}

#[test]
fn faulted_snapshot_records_the_fault_text() {
    let mut ctx = TestContext::new().load_program(0, &[0x3F]).boot();
    assert!(ctx.step(0));
    let snapshot = ctx.core(0).snapshot();
    assert_eq!(snapshot.state, CoreState::Halted);
    assert_eq!(snapshot.exit_code, 1);
    assert_eq!(
        snapshot.fault.as_deref(),
        Some("invalid opcode 0x3f in instruction 0x0000003f")
    );
}
