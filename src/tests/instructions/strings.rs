use crate::tests::*;
use crate::{ExecOutcome, FrameTag, OpCode};

#[test]
fn concat_and_strlen() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "s")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "n")]),
        instr(OpCode::CONCAT, vec![var(FrameTag::Gf, "s"), string("foo"), string("bar")]),
        instr(OpCode::STRLEN, vec![var(FrameTag::Gf, "n"), var(FrameTag::Gf, "s")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "s")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "n")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "foobar6");
}

#[test]
fn strlen_of_concat_is_sum_of_strlens() {
    let s1 = "hello";
    let s2 = "world!!";
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "c")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "n")]),
        instr(OpCode::CONCAT, vec![var(FrameTag::Gf, "c"), string(s1), string(s2)]),
        instr(OpCode::STRLEN, vec![var(FrameTag::Gf, "n"), var(FrameTag::Gf, "c")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "n")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, (s1.len() + s2.len()).to_string());
}

#[test]
fn getchar_out_of_range_is_error_58() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "c")]),
        instr(OpCode::GETCHAR, vec![var(FrameTag::Gf, "c"), string("abc"), int(3)]),
    ]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 58);
}

#[test]
fn getchar_on_empty_string_is_error_58() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "c")]),
        instr(OpCode::GETCHAR, vec![var(FrameTag::Gf, "c"), string(""), int(0)]),
    ]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 58);
}

#[test]
fn setchar_replaces_code_point() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "s")]),
        instr(OpCode::MOVE, vec![var(FrameTag::Gf, "s"), string("hello")]),
        instr(OpCode::SETCHAR, vec![var(FrameTag::Gf, "s"), int(0), string("H")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "s")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "Hello");
}

#[test]
fn setchar_on_empty_replacement_is_error_58() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "s")]),
        instr(OpCode::MOVE, vec![var(FrameTag::Gf, "s"), string("hello")]),
        instr(OpCode::SETCHAR, vec![var(FrameTag::Gf, "s"), int(0), string("")]),
    ]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 58);
}

#[test]
fn int2char_and_stri2int_roundtrip() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "c")]),
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "n")]),
        instr(OpCode::INT2CHAR, vec![var(FrameTag::Gf, "c"), int(65)]),
        instr(OpCode::STRI2INT, vec![var(FrameTag::Gf, "n"), var(FrameTag::Gf, "c"), int(0)]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "c")]),
        instr(OpCode::WRITE, vec![var(FrameTag::Gf, "n")]),
    ]);
    let (outcome, stdout) = run(&prog);
    assert_eq!(outcome.unwrap(), ExecOutcome::Finished);
    assert_eq!(stdout, "A65");
}

#[test]
fn int2char_rejects_invalid_code_point() {
    let prog = program(vec![
        instr(OpCode::DEFVAR, vec![var(FrameTag::Gf, "c")]),
        instr(OpCode::INT2CHAR, vec![var(FrameTag::Gf, "c"), int(-1)]),
    ]);
    let (outcome, _) = run(&prog);
    assert_eq!(outcome.unwrap_err().code(), 58);
}
