use std::collections::HashMap;

use crate::error::RuntimeError;
use crate::value::{Tag, TypedValue};

/// The frame a variable token names: `GF@`, `LF@`, or `TF@`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrameTag {
    Gf,
    Lf,
    Tf,
}

impl FrameTag {
    pub fn prefix(self) -> &'static str {
        match self {
            FrameTag::Gf => "GF",
            FrameTag::Lf => "LF",
            FrameTag::Tf => "TF",
        }
    }
}

/// A declared variable's storage slot. `None` means declared-but-
/// uninitialized, which is distinct from holding a `nil` value. Reading it
/// is an error (code 56) everywhere except `TYPE`'s permissive mode.
pub type Slot = Option<TypedValue>;

/// A mapping from variable name to [`Slot`], unique within one frame.
#[derive(Default, Debug)]
pub struct Frame {
    slots: HashMap<String, Slot>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame::default()
    }

    fn declare(&mut self, name: &str) -> Result<(), RuntimeError> {
        if self.slots.contains_key(name) {
            return Err(RuntimeError::UndefinedLabelOrRedefinition(format!(
                "variable redefinition: {}",
                name
            )));
        }
        self.slots.insert(name.to_string(), None);
        Ok(())
    }
}

/// Owns the global frame (always present), the temporary frame (present
/// only between `CREATEFRAME` and the next `PUSHFRAME`/`CREATEFRAME`), and
/// the stack of pushed local frames.
///
/// The local frame (LF) is never aliased into a separate handle; it is
/// always "whichever frame is on top of `locals`". This avoids the
/// alias/stack-top divergence bug a separately-tracked LF handle invites.
#[derive(Default)]
pub struct Frames {
    global: Frame,
    temporary: Option<Frame>,
    locals: Vec<Frame>,
}

impl Frames {
    pub fn new() -> Frames {
        Frames {
            global: Frame::new(),
            temporary: None,
            locals: Vec::new(),
        }
    }

    fn frame_mut(&mut self, tag: FrameTag) -> Result<&mut Frame, RuntimeError> {
        match tag {
            FrameTag::Gf => Ok(&mut self.global),
            FrameTag::Tf => self.temporary.as_mut().ok_or_else(no_such_frame(tag)),
            FrameTag::Lf => self.locals.last_mut().ok_or_else(no_such_frame(tag)),
        }
    }

    fn frame(&self, tag: FrameTag) -> Result<&Frame, RuntimeError> {
        match tag {
            FrameTag::Gf => Ok(&self.global),
            FrameTag::Tf => self.temporary.as_ref().ok_or_else(no_such_frame(tag)),
            FrameTag::Lf => self.locals.last().ok_or_else(no_such_frame(tag)),
        }
    }

    /// `DEFVAR`: declares `name` in the frame named by `tag`. Code 55 if the
    /// frame doesn't exist, code 52 if the name is already declared there.
    pub fn declare(&mut self, tag: FrameTag, name: &str) -> Result<(), RuntimeError> {
        self.frame_mut(tag)?.declare(name)
    }

    fn slot_mut(&mut self, tag: FrameTag, name: &str) -> Result<&mut Slot, RuntimeError> {
        self.frame_mut(tag)?
            .slots
            .get_mut(name)
            .ok_or_else(undeclared(tag, name))
    }

    fn slot(&self, tag: FrameTag, name: &str) -> Result<&Slot, RuntimeError> {
        self.frame(tag)?
            .slots
            .get(name)
            .ok_or_else(undeclared(tag, name))
    }

    /// Writes `value` into an already-declared variable. Code 54 if
    /// undeclared, code 55 if the frame is absent.
    pub fn write(&mut self, tag: FrameTag, name: &str, value: TypedValue) -> Result<(), RuntimeError> {
        *self.slot_mut(tag, name)? = Some(value);
        Ok(())
    }

    /// Reads a variable's value. Code 56 if declared but uninitialized.
    pub fn read_value(&self, tag: FrameTag, name: &str) -> Result<TypedValue, RuntimeError> {
        self.slot(tag, name)?.clone().ok_or_else(|| {
            RuntimeError::MissingValue(format!(
                "reading uninitialized variable {}@{}",
                tag.prefix(),
                name
            ))
        })
    }

    /// Reads a variable's tag. In permissive mode (used only by `TYPE`), an
    /// uninitialized variable yields `None` instead of code 56.
    pub fn read_type(
        &self,
        tag: FrameTag,
        name: &str,
        permissive: bool,
    ) -> Result<Option<Tag>, RuntimeError> {
        match self.slot(tag, name)? {
            Some(v) => Ok(Some(v.tag)),
            None if permissive => Ok(None),
            None => Err(RuntimeError::MissingValue(format!(
                "reading uninitialized variable {}@{}",
                tag.prefix(),
                name
            ))),
        }
    }

    /// `CREATEFRAME`: unconditionally replaces TF with a fresh empty frame.
    pub fn create_frame(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: requires TF to exist; moves it onto the frame stack.
    pub fn push_frame(&mut self) -> Result<(), RuntimeError> {
        let frame = self.temporary.take().ok_or_else(no_such_frame(FrameTag::Tf))?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: requires a non-empty frame stack; moves its top into TF.
    pub fn pop_frame(&mut self) -> Result<(), RuntimeError> {
        let frame = self.locals.pop().ok_or_else(no_such_frame(FrameTag::Lf))?;
        self.temporary = Some(frame);
        Ok(())
    }

    pub fn local_stack_depth(&self) -> usize {
        self.locals.len()
    }

    pub fn temporary_frame_exists(&self) -> bool {
        self.temporary.is_some()
    }
}

fn no_such_frame(tag: FrameTag) -> impl Fn() -> RuntimeError {
    move || RuntimeError::NoSuchFrame(format!("frame {} does not exist", tag.prefix()))
}

fn undeclared(tag: FrameTag, name: &str) -> impl Fn() -> RuntimeError {
    let msg = format!("undeclared variable {}@{}", tag.prefix(), name);
    move || RuntimeError::UndeclaredVariable(msg.clone())
}
