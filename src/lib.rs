//! Execution engine for IPPcode22.
//!
//! This crate owns the runtime side of the interpreter: the value and frame
//! model, the program representation that a loader (see the `ippcode22-xml`
//! crate) builds from source, and the instruction dispatcher that walks it.
//!
//! Loading a program (parsing, sorting, structural validation) is
//! deliberately kept out of this crate; [`Program`] and [`Instruction`] are
//! plain data that any loader can construct.

pub mod error;
pub mod frame;
pub mod input;
pub mod interpreter;
pub mod opcode;
pub mod program;
pub mod value;

pub use error::{LoadError, RuntimeError};
pub use frame::{Frame, FrameTag, Frames, Slot};
pub use input::InputSource;
pub use interpreter::{ExecOutcome, Interpreter};
pub use opcode::OpCode;
pub use program::{Instruction, Operand, Program};
pub use value::{Tag, TypedValue, Value};
