use crate::tests::*;
use crate::{ExecOutcome, FrameTag, OpCode};

#[test]
fn write_decodes_escapes() {
    let prog = program(vec![instr(OpCode::WRITE, vec![string("a\\092b\\010c")])]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "a\\b\nc");
}

#[test]
fn write_nil_is_empty_string() {
    let prog = program(vec![instr(OpCode::WRITE, vec![nil()])]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "");
}

#[test]
fn read_int_from_input() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
        instr(OpCode::READ, vec![var(FrameTag::Gf, "x"), type_name("int")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "x")]),
    ]);
    let (outcome, stdout) = run_with_input(&prog, input_from(&["42"]));
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "42");
}

#[test]
fn read_bool_is_case_insensitive_true_else_false() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "a")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "b")]),
        instr(OpCode::READ, vec![var(FrameTag::Gf, "a"), type_name("bool")]),
        instr(OpCode::READ, vec![var(FrameTag::Gf, "b"), type_name("bool")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "a")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "b")]),
    ]);
    let (outcome, stdout) = run_with_input(&prog, input_from(&["TRUE", "nope"]));
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "truefalse");
}

#[test]
fn read_at_eof_stores_nil() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "t")]),
        instr(OpCode::READ, vec![var(FrameTag::Gf, "x"), type_name("string")]),
        instr(OpCode::TYPE, vec![var(FrameTag::Gf, "t"), var(FrameTag::Gf, "x")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "t")]),
    ]);
    let (outcome, stdout) = run_with_input(&prog, input_from(&[]));
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "nil");
}

#[test]
fn read_unparseable_int_falls_back_to_nil() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "t")]),
        instr(OpCode::READ, vec![var(FrameTag::Gf, "x"), type_name("int")]),
        instr(OpCode::TYPE, vec![var(FrameTag::Gf, "t"), var(FrameTag::Gf, "x")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "t")]),
    ]);
    let (outcome, stdout) = run_with_input(&prog, input_from(&["not-a-number"]));
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "nil");
}
