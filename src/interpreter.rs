use std::cmp::Ordering;
use std::convert::TryFrom;
use std::io::Write;

use crate::error::RuntimeError;
use crate::frame::{FrameTag, Frames};
use crate::input::InputSource;
use crate::opcode::OpCode;
use crate::program::{Instruction, Operand, Program};
use crate::value::{decode_escapes, Tag, TypedValue, Value};

/// What happened on an otherwise-successful execution: either the program
/// ran off the end of its instruction list (success) or an `EXIT`
/// instruction requested a specific code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExecOutcome {
    Finished,
    Exited(i32),
}

impl ExecOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExecOutcome::Finished => 0,
            ExecOutcome::Exited(code) => code,
        }
    }
}

/// Result of dispatching one instruction: whether the instruction counter
/// should advance by one, was already repointed by the instruction itself
/// (jumps, `CALL`, `RETURN`), or the program is terminating.
enum Tick {
    Advance,
    Jumped,
    Exit(i32),
}

/// The instruction dispatcher: owns the instruction counter, the frame set,
/// the call and data stacks, and the input/output handles.
/// `step()`/`run()` are the only entry points; every opcode family has its
/// own private helper, matching the shape of a single `match` in `run()`.
pub struct Interpreter<'p> {
    program: &'p Program,
    frames: Frames,
    ic: usize,
    call_stack: Vec<usize>,
    data_stack: Vec<TypedValue>,
    input: InputSource,
    output: Box<dyn Write>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program, input: InputSource, output: Box<dyn Write>) -> Interpreter<'p> {
        Interpreter {
            program,
            frames: Frames::new(),
            ic: 0,
            call_stack: Vec::new(),
            data_stack: Vec::new(),
            input,
            output,
        }
    }

    /// Runs until the program finishes or exits, flushing output either way.
    pub fn run(&mut self) -> Result<ExecOutcome, RuntimeError> {
        let outcome = self.run_inner();
        let _ = self.output.flush();
        outcome
    }

    fn run_inner(&mut self) -> Result<ExecOutcome, RuntimeError> {
        loop {
            if self.ic >= self.program.len() {
                return Ok(ExecOutcome::Finished);
            }
            match self.tick()? {
                Tick::Advance => self.ic += 1,
                Tick::Jumped => {}
                Tick::Exit(code) => return Ok(ExecOutcome::Exited(code)),
            }
        }
    }

    fn tick(&mut self) -> Result<Tick, RuntimeError> {
        let instr = self.program.instructions[self.ic].clone();
        self.dispatch(&instr)
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<Tick, RuntimeError> {
        use OpCode::*;

        let args = &instr.operands[..];

        match instr.opcode {
            MOVE => {
                let (tag, name) = require_var(&args[0])?;
                let value = self.resolve(&args[1])?;
                self.frames.write(tag, name, value)?;
                Ok(Tick::Advance)
            }
            CREATEFRAME => {
                self.frames.create_frame();
                Ok(Tick::Advance)
            }
            PUSHFRAME => {
                self.frames.push_frame()?;
                Ok(Tick::Advance)
            }
            POPFRAME => {
                self.frames.pop_frame()?;
                Ok(Tick::Advance)
            }
            DEFVAR => {
                let (tag, name) = require_var(&args[0])?;
                self.frames.declare(tag, name)?;
                Ok(Tick::Advance)
            }

            CALL => {
                let target = self.label_target(&args[0])?;
                self.call_stack.push(self.ic);
                self.ic = target;
                Ok(Tick::Jumped)
            }
            RETURN => {
                let saved = self
                    .call_stack
                    .pop()
                    .ok_or_else(|| RuntimeError::MissingValue("RETURN with empty call stack".into()))?;
                self.ic = saved;
                Ok(Tick::Advance)
            }
            JUMP => {
                self.ic = self.label_target(&args[0])?;
                Ok(Tick::Jumped)
            }
            JUMPIFEQ | JUMPIFNEQ => {
                let target = self.label_target(&args[0])?;
                let a = self.resolve(&args[1])?;
                let b = self.resolve(&args[2])?;
                check_eq_comparable(a.tag, b.tag)?;
                let equal = a.value == b.value;
                let should_jump = if instr.opcode == JUMPIFEQ { equal } else { !equal };
                if should_jump {
                    self.ic = target;
                    Ok(Tick::Jumped)
                } else {
                    Ok(Tick::Advance)
                }
            }
            LABEL => Ok(Tick::Advance),
            EXIT => {
                let code = self.exit_code(&args[0])?;
                Ok(Tick::Exit(code))
            }

            PUSHS => {
                let value = self.resolve(&args[0])?;
                self.data_stack.push(value);
                Ok(Tick::Advance)
            }
            POPS => {
                let (tag, name) = require_var(&args[0])?;
                let value = self
                    .data_stack
                    .pop()
                    .ok_or_else(|| RuntimeError::MissingValue("POPS with empty data stack".into()))?;
                self.frames.write(tag, name, value)?;
                Ok(Tick::Advance)
            }

            ADD | SUB | MUL | IDIV => {
                self.arithmetic(instr.opcode, args)?;
                Ok(Tick::Advance)
            }
            LT | GT | EQ => {
                self.compare(instr.opcode, args)?;
                Ok(Tick::Advance)
            }
            AND | OR => {
                self.logic(instr.opcode, args)?;
                Ok(Tick::Advance)
            }
            NOT => {
                self.not(args)?;
                Ok(Tick::Advance)
            }

            INT2CHAR => {
                self.int2char(args)?;
                Ok(Tick::Advance)
            }
            STRI2INT => {
                self.stri2int(args)?;
                Ok(Tick::Advance)
            }

            READ => {
                self.read(args)?;
                Ok(Tick::Advance)
            }
            WRITE => {
                self.write(args)?;
                Ok(Tick::Advance)
            }

            CONCAT => {
                self.concat(args)?;
                Ok(Tick::Advance)
            }
            STRLEN => {
                self.strlen(args)?;
                Ok(Tick::Advance)
            }
            GETCHAR => {
                self.getchar(args)?;
                Ok(Tick::Advance)
            }
            SETCHAR => {
                self.setchar(args)?;
                Ok(Tick::Advance)
            }

            TYPE => {
                self.type_of(args)?;
                Ok(Tick::Advance)
            }

            BREAK => {
                self.dump_state();
                Ok(Tick::Advance)
            }
            DPRINT => {
                let value = self.resolve(&args[0])?;
                eprintln!("{:?}", value);
                Ok(Tick::Advance)
            }
        }
    }

    /// Resolves a symbol operand (variable or literal) to its value.
    fn resolve(&self, operand: &Operand) -> Result<TypedValue, RuntimeError> {
        match operand {
            Operand::Variable { frame, name } => self.frames.read_value(*frame, name),
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Label(_) | Operand::TypeName(_) => Err(RuntimeError::Internal(
                "expected a symbol operand, found a label/type literal".into(),
            )),
        }
    }

    /// Resolves a symbol operand's tag, permissively for `TYPE`: an
    /// uninitialized variable yields `None` rather than code 56.
    fn resolve_type(&self, operand: &Operand, permissive: bool) -> Result<Option<Tag>, RuntimeError> {
        match operand {
            Operand::Variable { frame, name } => self.frames.read_type(*frame, name, permissive),
            Operand::Literal(value) => Ok(Some(value.tag)),
            Operand::Label(_) | Operand::TypeName(_) => Err(RuntimeError::Internal(
                "expected a symbol operand, found a label/type literal".into(),
            )),
        }
    }

    fn label_target(&self, operand: &Operand) -> Result<usize, RuntimeError> {
        let name = match operand {
            Operand::Label(name) => name,
            _ => return Err(RuntimeError::Internal("expected a label operand".into())),
        };
        self.program
            .labels
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UndefinedLabelOrRedefinition(format!("undefined label: {}", name)))
    }

    fn exit_code(&self, operand: &Operand) -> Result<i32, RuntimeError> {
        let value = self.resolve(operand)?;
        let n = match value.value {
            Value::Int(n) => n,
            _ => return Err(RuntimeError::OperandType("EXIT requires an int operand".into())),
        };
        if (0..=49).contains(&n) {
            Ok(n as i32)
        } else {
            Err(RuntimeError::BadOperandValue(format!(
                "EXIT code out of range [0, 49]: {}",
                n
            )))
        }
    }

    fn arithmetic(&mut self, op: OpCode, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let a = int_operand(&self.resolve(&args[1])?)?;
        let b = int_operand(&self.resolve(&args[2])?)?;
        let result = match op {
            OpCode::ADD => a.wrapping_add(b),
            OpCode::SUB => a.wrapping_sub(b),
            OpCode::MUL => a.wrapping_mul(b),
            OpCode::IDIV => {
                if b == 0 {
                    return Err(RuntimeError::BadOperandValue("IDIV by zero".into()));
                }
                floor_div(a, b)
            }
            _ => unreachable!(),
        };
        self.frames.write(tag, name, TypedValue::int(result))
    }

    fn compare(&mut self, op: OpCode, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let a = self.resolve(&args[1])?;
        let b = self.resolve(&args[2])?;

        let result = match op {
            OpCode::EQ => {
                check_eq_comparable(a.tag, b.tag)?;
                a.value == b.value
            }
            OpCode::LT | OpCode::GT => {
                if a.tag != b.tag || a.tag == Tag::Nil {
                    return Err(RuntimeError::OperandType(
                        "LT/GT require two operands of the same non-nil type".into(),
                    ));
                }
                let ordering = match (&a.value, &b.value) {
                    (Value::Int(x), Value::Int(y)) => x.cmp(y),
                    (Value::Str(x), Value::Str(y)) => x.cmp(y),
                    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                    _ => unreachable!("tags matched above"),
                };
                if op == OpCode::LT {
                    ordering == Ordering::Less
                } else {
                    ordering == Ordering::Greater
                }
            }
            _ => unreachable!(),
        };
        self.frames.write(tag, name, TypedValue::bool(result))
    }

    fn logic(&mut self, op: OpCode, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let a = bool_operand(&self.resolve(&args[1])?)?;
        let b = bool_operand(&self.resolve(&args[2])?)?;
        let result = match op {
            OpCode::AND => a && b,
            OpCode::OR => a || b,
            _ => unreachable!(),
        };
        self.frames.write(tag, name, TypedValue::bool(result))
    }

    fn not(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let a = bool_operand(&self.resolve(&args[1])?)?;
        self.frames.write(tag, name, TypedValue::bool(!a))
    }

    fn int2char(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let n = int_operand(&self.resolve(&args[1])?)?;
        let ch = u32::try_from(n)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| RuntimeError::StringIndex(format!("INT2CHAR: not a valid code point: {}", n)))?;
        self.frames.write(tag, name, TypedValue::string(ch.to_string()))
    }

    fn stri2int(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let s = str_operand(&self.resolve(&args[1])?)?;
        let pos = int_operand(&self.resolve(&args[2])?)?;
        let ch = char_at(&s, pos)?;
        self.frames.write(tag, name, TypedValue::int(ch as i64))
    }

    fn read(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let type_name = match &args[1] {
            Operand::TypeName(name) => name.as_str(),
            _ => return Err(RuntimeError::Internal("READ requires a type operand".into())),
        };

        let value = match self
            .input
            .read_line()
            .map_err(|err| RuntimeError::Internal(format!("I/O error reading input: {}", err)))?
        {
            None => TypedValue::nil(),
            Some(line) => match type_name {
                "bool" => TypedValue::bool(line.eq_ignore_ascii_case("true")),
                "int" => match line.trim().parse::<i64>() {
                    Ok(n) => TypedValue::int(n),
                    Err(_) => TypedValue::nil(),
                },
                "string" => TypedValue::string(line),
                "nil" => TypedValue::nil(),
                other => {
                    return Err(RuntimeError::Internal(format!("unknown READ type: {}", other)))
                }
            },
        };
        self.frames.write(tag, name, value)
    }

    fn write(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let value = self.resolve(&args[0])?;
        let text = match value.value {
            Value::Nil => String::new(),
            Value::Str(s) => decode_escapes(&s),
            Value::Int(n) => n.to_string(),
            Value::Bool(b) => if b { "true" } else { "false" }.to_string(),
        };
        write!(self.output, "{}", text)
            .map_err(|err| RuntimeError::Internal(format!("I/O error writing output: {}", err)))
    }

    fn concat(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let a = str_operand(&self.resolve(&args[1])?)?;
        let b = str_operand(&self.resolve(&args[2])?)?;
        self.frames.write(tag, name, TypedValue::string(a + &b))
    }

    fn strlen(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let s = str_operand(&self.resolve(&args[1])?)?;
        self.frames.write(tag, name, TypedValue::int(s.chars().count() as i64))
    }

    fn getchar(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let s = str_operand(&self.resolve(&args[1])?)?;
        let pos = int_operand(&self.resolve(&args[2])?)?;
        let ch = char_at(&s, pos)?;
        self.frames.write(tag, name, TypedValue::string(ch.to_string()))
    }

    fn setchar(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let pos = int_operand(&self.resolve(&args[1])?)?;
        let replacement = str_operand(&self.resolve(&args[2])?)?;

        let current = self.frames.read_value(tag, name)?;
        let mut chars: Vec<char> = match current.value {
            Value::Str(s) => s.chars().collect(),
            _ => return Err(RuntimeError::OperandType("SETCHAR target must hold a string".into())),
        };
        if chars.is_empty() {
            return Err(RuntimeError::StringIndex("SETCHAR on empty target string".into()));
        }
        let new_char = replacement
            .chars()
            .next()
            .ok_or_else(|| RuntimeError::StringIndex("SETCHAR with empty replacement string".into()))?;
        if pos < 0 || pos as usize >= chars.len() {
            return Err(RuntimeError::StringIndex(format!("SETCHAR index out of range: {}", pos)));
        }
        chars[pos as usize] = new_char;
        self.frames
            .write(tag, name, TypedValue::string(chars.into_iter().collect::<String>()))
    }

    fn type_of(&mut self, args: &[Operand]) -> Result<(), RuntimeError> {
        let (tag, name) = require_var(&args[0])?;
        let type_name = match self.resolve_type(&args[1], true)? {
            Some(t) => t.name(),
            None => "",
        };
        self.frames.write(tag, name, TypedValue::string(type_name))
    }

    fn dump_state(&self) {
        eprintln!(
            "IC={} call_stack_depth={} data_stack_depth={} local_frame_depth={}",
            self.ic,
            self.call_stack.len(),
            self.data_stack.len(),
            self.frames.local_stack_depth()
        );
    }
}

fn require_var(operand: &Operand) -> Result<(FrameTag, &str), RuntimeError> {
    match operand {
        Operand::Variable { frame, name } => Ok((*frame, name.as_str())),
        _ => Err(RuntimeError::Internal("expected a variable operand".into())),
    }
}

fn int_operand(value: &TypedValue) -> Result<i64, RuntimeError> {
    match value.value {
        Value::Int(n) => Ok(n),
        _ => Err(RuntimeError::OperandType(format!(
            "expected int operand, found {}",
            value.tag
        ))),
    }
}

fn bool_operand(value: &TypedValue) -> Result<bool, RuntimeError> {
    match value.value {
        Value::Bool(b) => Ok(b),
        _ => Err(RuntimeError::OperandType(format!(
            "expected bool operand, found {}",
            value.tag
        ))),
    }
}

fn str_operand(value: &TypedValue) -> Result<String, RuntimeError> {
    match &value.value {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(RuntimeError::OperandType(format!(
            "expected string operand, found {}",
            value.tag
        ))),
    }
}

fn char_at(s: &str, pos: i64) -> Result<char, RuntimeError> {
    if pos < 0 {
        return Err(RuntimeError::StringIndex(format!("negative index: {}", pos)));
    }
    s.chars()
        .nth(pos as usize)
        .ok_or_else(|| RuntimeError::StringIndex(format!("index out of range: {}", pos)))
}

fn check_eq_comparable(a: Tag, b: Tag) -> Result<(), RuntimeError> {
    if a == b || a == Tag::Nil || b == Tag::Nil {
        Ok(())
    } else {
        Err(RuntimeError::OperandType(format!(
            "cannot compare {} with {}",
            a, b
        )))
    }
}

/// Floor division: rounds toward negative infinity, as `IDIV` requires.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}
