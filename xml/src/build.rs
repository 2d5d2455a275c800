use std::collections::HashMap;

use std::str::FromStr;

use ippcode22::{FrameTag, Instruction, LoadError, OpCode, Operand, Program, TypedValue};

use crate::tree::Element;

/// Normalizes and builds a [`Program`] from a parsed `<program>` element.
/// Order-sorts instructions, tag-sorts each instruction's arguments,
/// validates structure, and runs the label pre-pass.
pub fn build(root: Element) -> Result<Program, LoadError> {
    if root.tag != "program" {
        return Err(LoadError::InvalidStructure(format!(
            "root element must be <program>, found <{}>",
            root.tag
        )));
    }
    let language = root.attr("language").ok_or_else(|| {
        LoadError::InvalidStructure("<program> is missing a language attribute".to_string())
    })?;
    if language.to_lowercase() != "ippcode22" {
        return Err(LoadError::InvalidStructure(format!(
            "unsupported language: {}",
            language
        )));
    }

    let instructions = sort_instructions(root.children)?;
    let instructions = instructions
        .into_iter()
        .map(build_instruction)
        .collect::<Result<Vec<_>, _>>()?;
    let labels = scan_labels(&instructions)?;

    Ok(Program::new(instructions, labels))
}

/// Sorts `instruction` elements by their `order` attribute. Non-integer,
/// non-positive, or duplicate orders are all code 32.
fn sort_instructions(children: Vec<Element>) -> Result<Vec<Element>, LoadError> {
    let mut keyed = Vec::with_capacity(children.len());
    for element in children {
        if element.tag != "instruction" {
            return Err(LoadError::InvalidStructure(format!(
                "expected <instruction>, found <{}>",
                element.tag
            )));
        }
        let order_text = element.attr("order").ok_or_else(|| {
            LoadError::InvalidStructure("<instruction> is missing an order attribute".to_string())
        })?;
        let order: i64 = order_text
            .parse()
            .map_err(|_| LoadError::InvalidStructure(format!("non-integer order: {}", order_text)))?;
        if order <= 0 {
            return Err(LoadError::InvalidStructure(format!(
                "order must be strictly positive: {}",
                order
            )));
        }
        keyed.push((order, element));
    }

    keyed.sort_by_key(|(order, _)| *order);
    for pair in keyed.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(LoadError::InvalidStructure(format!(
                "duplicate instruction order: {}",
                pair[0].0
            )));
        }
    }

    Ok(keyed.into_iter().map(|(_, element)| element).collect())
}

fn build_instruction(mut element: Element) -> Result<Instruction, LoadError> {
    let opcode_text = element
        .attr("opcode")
        .ok_or_else(|| LoadError::InvalidStructure("<instruction> is missing an opcode attribute".to_string()))?
        .to_uppercase();
    // `FromStr for OpCode` is derived alongside `EnumFromStr`, see opcode.rs.
    let opcode = OpCode::from_str(&opcode_text)
        .map_err(|_| LoadError::InvalidStructure(format!("unknown opcode: {}", opcode_text)))?;

    element.children.sort_by(|a, b| a.tag.cmp(&b.tag));
    for (i, arg) in element.children.iter().enumerate() {
        let expected = format!("arg{}", i + 1);
        if arg.tag != expected {
            return Err(LoadError::InvalidStructure(format!(
                "non-dense argument tags in {}: expected <{}>, found <{}>",
                opcode_text, expected, arg.tag
            )));
        }
    }

    let shape = operand_shape(opcode);
    if element.children.len() != shape.len() {
        return Err(LoadError::InvalidStructure(format!(
            "{} takes {} operand(s), found {}",
            opcode_text,
            shape.len(),
            element.children.len()
        )));
    }

    let operands = element
        .children
        .into_iter()
        .map(build_operand)
        .collect::<Result<Vec<_>, _>>()?;

    for (operand, kind) in operands.iter().zip(shape.iter()) {
        if !kind.matches(operand) {
            return Err(LoadError::InvalidStructure(format!(
                "{}: operand has the wrong shape for its position",
                opcode_text
            )));
        }
    }

    Ok(Instruction::new(opcode, operands))
}

/// The `<var>`/`<symb>`/`<label>`/`<type>` shape each opcode expects at each
/// operand position. Checked here so a malformed document surfaces as code
/// 32 at load time instead of the dispatcher finding an operand it can't
/// use for the position it's in.
#[derive(Clone, Copy)]
enum OperandKind {
    Var,
    Symb,
    Label,
    Type,
}

impl OperandKind {
    fn matches(self, operand: &Operand) -> bool {
        match (self, operand) {
            (OperandKind::Var, Operand::Variable { .. }) => true,
            (OperandKind::Symb, Operand::Variable { .. }) | (OperandKind::Symb, Operand::Literal(_)) => true,
            (OperandKind::Label, Operand::Label(_)) => true,
            (OperandKind::Type, Operand::TypeName(_)) => true,
            _ => false,
        }
    }
}

fn operand_shape(opcode: OpCode) -> &'static [OperandKind] {
    use OpCode::*;
    use OperandKind::*;
    match opcode {
        CREATEFRAME | PUSHFRAME | POPFRAME | RETURN | BREAK => &[],
        DEFVAR | POPS => &[Var],
        CALL | JUMP | LABEL => &[Label],
        EXIT | PUSHS | WRITE | DPRINT => &[Symb],
        MOVE | NOT | INT2CHAR | STRLEN | TYPE => &[Var, Symb],
        READ => &[Var, Type],
        JUMPIFEQ | JUMPIFNEQ => &[Label, Symb, Symb],
        ADD | SUB | MUL | IDIV | LT | GT | EQ | AND | OR | STRI2INT | CONCAT | GETCHAR | SETCHAR => {
            &[Var, Symb, Symb]
        }
    }
}

fn build_operand(arg: Element) -> Result<Operand, LoadError> {
    let arg_type = arg
        .attr("type")
        .ok_or_else(|| LoadError::InvalidStructure(format!("<{}> is missing a type attribute", arg.tag)))?
        .to_string();
    let text = arg.text.unwrap_or_default();

    match arg_type.as_str() {
        "var" => {
            let (frame, name) = split_variable(&text)?;
            Ok(Operand::Variable { frame, name })
        }
        "int" => {
            let n: i64 = text
                .trim()
                .parse()
                .map_err(|_| LoadError::InvalidStructure(format!("invalid int literal: {}", text)))?;
            Ok(Operand::Literal(TypedValue::int(n)))
        }
        "bool" => match text.trim() {
            "true" => Ok(Operand::Literal(TypedValue::bool(true))),
            "false" => Ok(Operand::Literal(TypedValue::bool(false))),
            other => Err(LoadError::InvalidStructure(format!("invalid bool literal: {}", other))),
        },
        "string" => Ok(Operand::Literal(TypedValue::string(text))),
        "nil" => Ok(Operand::Literal(TypedValue::nil())),
        "label" => Ok(Operand::Label(text)),
        "type" => match text.trim() {
            "int" | "bool" | "string" | "nil" => Ok(Operand::TypeName(text.trim().to_string())),
            other => Err(LoadError::InvalidStructure(format!("unknown type name: {}", other))),
        },
        other => Err(LoadError::InvalidStructure(format!("unknown argument type: {}", other))),
    }
}

fn split_variable(text: &str) -> Result<(FrameTag, String), LoadError> {
    let prefixes = [("GF@", FrameTag::Gf), ("LF@", FrameTag::Lf), ("TF@", FrameTag::Tf)];
    for (prefix, tag) in prefixes.iter() {
        if let Some(name) = text.strip_prefix(prefix) {
            return Ok((*tag, name.to_string()));
        }
    }
    Err(LoadError::InvalidStructure(format!("malformed variable token: {}", text)))
}

/// The label pre-pass: a single scan over the already-sorted instruction
/// sequence, independent of instruction construction.
fn scan_labels(instructions: &[Instruction]) -> Result<HashMap<String, usize>, LoadError> {
    let mut labels = HashMap::new();
    for (index, instr) in instructions.iter().enumerate() {
        if instr.opcode != OpCode::LABEL {
            continue;
        }
        if let Some(Operand::Label(name)) = instr.operands.first() {
            if labels.insert(name.clone(), index).is_some() {
                return Err(LoadError::DuplicateLabel(name.clone()));
            }
        }
    }
    Ok(labels)
}
