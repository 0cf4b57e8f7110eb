//! Disassembly of decoded instructions and raw words.

use pretty_assertions::assert_eq;
use rstest::rstest;
use smpvm_core::common::reg::Register;
use smpvm_core::isa::disasm::{disassemble_word, format};
use smpvm_core::isa::encode;
use smpvm_core::isa::instruction::{AluOp, Condition, Instruction, MathOp, Operand, Width};
use smpvm_core::isa::{BASE_SET_ID, InstructionSetTable, MATH_SET_ID};

use crate::common::builder::r;

#[rstest]
#[case(Instruction::Nop, "nop")]
#[case(Instruction::Hlt { code: Operand::Imm(0) }, "hlt 0x0")]
#[case(Instruction::Hlt { code: Operand::Reg(r(3)) }, "hlt r3")]
#[case(Instruction::Int { index: Operand::Imm(0x21) }, "int 0x21")]
#[case(Instruction::Call { target: Operand::Imm(-16) }, "call -0x10")]
#[case(Instruction::Li { dst: r(0), imm: -1 }, "li r0, -0x1")]
#[case(Instruction::Liu { dst: r(7), imm: 0xBEEF }, "liu r7, 0xbeef")]
#[case(Instruction::Mov { dst: Register::Fp, src: Register::Sp }, "mov fp, sp")]
#[case(
    Instruction::Alu { op: AluOp::Shl, dst: r(1), src: Operand::Imm(4) },
    "shl r1, 0x4"
)]
#[case(
    Instruction::Alu { op: AluOp::Xor, dst: r(1), src: Operand::Reg(r(2)) },
    "xor r1, r2"
)]
#[case(Instruction::Cmp { lhs: r(4), rhs: Operand::Imm(0) }, "cmp r4, 0x0")]
#[case(
    Instruction::Jump { cond: Condition::Always, target: Operand::Reg(r(9)) },
    "j r9"
)]
#[case(
    Instruction::Jump { cond: Condition::Greater, target: Operand::Imm(12) },
    "bg 0xc"
)]
#[case(
    Instruction::Load { width: Width::Half, dst: r(2), base: Register::Fp, offset: 8 },
    "ls r2, [fp + 0x8]"
)]
#[case(
    Instruction::Store { width: Width::Word, src: r(5), base: Register::Sp, offset: -4 },
    "stw [sp - 0x4], r5"
)]
#[case(Instruction::Push { src: Operand::Imm(3) }, "push 0x3")]
#[case(Instruction::Pop { dst: r(29) }, "pop r29")]
#[case(Instruction::Math(MathOp::PushUW(r(1))), "pushuw r1")]
#[case(Instruction::Math(MathOp::Swap), "swpl")]
fn formats_instructions(#[case] inst: Instruction, #[case] text: &str) {
    assert_eq!(format(&inst), text);
}

#[test]
fn words_decode_in_the_context_of_their_set() {
    let table = InstructionSetTable::with_defaults();
    // Opcode 5 is CALL in the base set and ADDL in the math set.
    let word = encode::op(5);
    assert_eq!(disassemble_word(&table, MATH_SET_ID, word), "addl");
    assert!(disassemble_word(&table, BASE_SET_ID, word).starts_with("call"));
}

#[test]
fn undecodable_words_render_as_data() {
    let table = InstructionSetTable::with_defaults();
    assert_eq!(
        disassemble_word(&table, MATH_SET_ID, 0x0000_0030),
        ".word 0x00000030"
    );
}

#[test]
fn unknown_sets_are_annotated() {
    let table = InstructionSetTable::with_defaults();
    assert_eq!(
        disassemble_word(&table, 9, 0),
        ".word 0x00000000  ; invalid instruction set 9"
    );
}
