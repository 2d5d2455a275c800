use util::EnumFromStr;
use util_derive::EnumFromStr;

/// One IPPcode22 opcode mnemonic. Variant names match the mnemonics
/// verbatim (uppercase) so that `EnumFromStr` can parse the loader's
/// already-uppercased opcode text with no further translation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
#[allow(non_camel_case_types)]
pub enum OpCode {
    // Frame and declaration
    MOVE,
    CREATEFRAME,
    PUSHFRAME,
    POPFRAME,
    DEFVAR,

    // Control flow
    CALL,
    RETURN,
    JUMP,
    JUMPIFEQ,
    JUMPIFNEQ,
    LABEL,
    EXIT,

    // Stack
    PUSHS,
    POPS,

    // Arithmetic
    ADD,
    SUB,
    MUL,
    IDIV,

    // Comparison
    LT,
    GT,
    EQ,

    // Logic
    AND,
    OR,
    NOT,

    // Conversions
    INT2CHAR,
    STRI2INT,

    // Input/output
    READ,
    WRITE,

    // Strings
    CONCAT,
    STRLEN,
    GETCHAR,
    SETCHAR,

    // Type introspection
    TYPE,

    // Debug
    BREAK,
    DPRINT,
}
