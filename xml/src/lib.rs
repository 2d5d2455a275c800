//! XML normalizer and program builder for IPPcode22.
//!
//! Parses a `<program>` document with `quick-xml`, sorts and validates its
//! structure, and produces an [`ippcode22::Program`] plus its label table.
//! Well-formedness failures are code 31, structural and opcode problems are
//! code 32, duplicate labels are code 52, see [`ippcode22::LoadError`].

mod build;
mod tree;

use std::io::BufRead;

use ippcode22::{LoadError, Program};

pub fn load_program<R: BufRead>(reader: R) -> Result<Program, LoadError> {
    let root = tree::parse(reader)?;
    build::build(root)
}
