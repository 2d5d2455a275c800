use crate::tests::*;
use crate::{ExecOutcome, FrameTag, OpCode};

#[test]
fn defvar_move_write() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "h")]),
        instr(OpCode::MOVE, vec![var(FrameTag::Gf, "h"), string("Hello")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "h")]),
        instr(OpCode::WRITE, vec![string("\\032world")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "Hello world");
}

#[test]
fn duplicate_defvar_is_error_52() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
    ]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 52);
}

#[test]
fn write_to_undeclared_variable_is_error_54() {
    let prog = program(vec![instr(OpCode::MOVE, vec![var(FrameTag::Gf, "x"), int(1)])]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 54);
}

#[test]
fn access_through_absent_frame_is_error_55() {
    let prog = program(vec![instr(OpCode::DEFVAR, vec![var(FrameTag::Tf, "x")])]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 55);
}

#[test]
fn reading_uninitialized_variable_is_error_56() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "x")]),
    ]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 56);
}

#[test]
fn type_of_uninitialized_variable_is_empty_string() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "x")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "t")]),
        instr(OpCode::TYPE, vec![var(FrameTag::Gf, "t"), var(FrameTag::Gf, "x")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "t")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "");
}

#[test]
fn create_push_write_pop_preserves_value_across_frame_swap() {
    // Declare v in TF, push, write through LF, pop, and re-read through TF,
    // both ends of the swap must observe the same value.
    let prog = program(vec![
        instr(OpCode::CREATEFRAME, vec![]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Tf, "v")]),
        instr(OpCode::PUSHFRAME, vec![]),
        instr(OpCode::MOVE, vec![var(FrameTag::Lf, "v"), int(42)]),
        instr(OpCode::POPFRAME, vec![]),
        instr(OpCode::WRITE, vec![var(FrameTag::Tf, "v")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "42");
}

#[test]
fn pushframe_without_temporary_frame_is_error_55() {
    let prog = program(vec![instr(OpCode::PUSHFRAME, vec![])]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 55);
}
