//! Static recovery of a plugin's declared name from its class file.
//!
//! The class is never loaded: the class file is parsed with
//! `ristretto_classfile`, the `getName()Ljava/lang/String;` method is located,
//! and its instruction stream is scanned for `ldc`/`ldc_w` loads of
//! `CONSTANT_String` entries that are returned as they are. A load counts when
//! the next instruction is `areturn`, or a `goto` joining a conditional
//! expression at its return. Loads feeding anything else (`StringBuilder.append`
//! in an inlined concatenation, a local, a field) do not count, and a single
//! `areturn` of a non-literal value makes the whole name computed.
//!
//! The last returned literal wins. When distinct literals are returned on
//! different paths the result is marked [`Confidence::LastSeen`] rather than
//! pretending it is exact.

use crate::error::{DiscoveryError, Result};
use crate::model::Confidence;
use ristretto_classfile::attributes::{Attribute, Instruction};
use ristretto_classfile::{ClassFile, Constant, Method};
use std::io::Cursor;

pub const ACCESSOR_NAME: &str = "getName";
pub const ACCESSOR_DESCRIPTOR: &str = "()Ljava/lang/String;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLiteral {
    pub value: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticOutcome {
    Literal(StaticLiteral),
    /// The accessor exists but returns no string constant as is.
    NoLiteral,
    /// The class does not declare the accessor itself.
    MethodNotFound,
}

/// Inspects the class file `bytes` read from archive entry `entry`.
pub fn inspect(entry: &str, bytes: Vec<u8>) -> Result<StaticOutcome> {
    let class = ClassFile::from_bytes(&mut Cursor::new(bytes))
        .map_err(|e| malformed(entry, format!("{e:?}")))?;

    let Some(method) = find_accessor(&class, entry)? else {
        return Ok(StaticOutcome::MethodNotFound);
    };

    let Some(code) = method.attributes.iter().find_map(|attribute| match attribute {
        Attribute::Code { code, .. } => Some(code),
        _ => None,
    }) else {
        // abstract or native
        return Ok(StaticOutcome::NoLiteral);
    };

    let mut literals: Vec<&str> = Vec::new();
    for (i, instruction) in code.iter().enumerate() {
        if matches!(instruction, Instruction::Areturn) {
            let returns_literal = i > 0 && string_constant(&class, &code[i - 1]).is_some();
            if !returns_literal {
                tracing::debug!("{} returns a computed value from {}", entry, ACCESSOR_NAME);
                return Ok(StaticOutcome::NoLiteral);
            }
            continue;
        }

        let Some(index) = string_constant(&class, instruction) else {
            continue;
        };
        let returned = matches!(
            code.get(i + 1),
            Some(Instruction::Areturn | Instruction::Goto(_) | Instruction::Goto_w(_))
        );
        if !returned {
            continue;
        }
        let value = class
            .constant_pool
            .try_get_utf8(index)
            .map_err(|e| malformed(entry, format!("bad string constant: {e:?}")))?;
        literals.push(value);
    }

    let Some(last) = literals.last() else {
        return Ok(StaticOutcome::NoLiteral);
    };
    let confidence = if literals.iter().all(|l| l == last) {
        Confidence::SinglePath
    } else {
        tracing::debug!(
            "{} returns {} distinct literals from {}, keeping the last",
            entry,
            literals.len(),
            ACCESSOR_NAME
        );
        Confidence::LastSeen
    };

    Ok(StaticOutcome::Literal(StaticLiteral {
        value: last.to_string(),
        confidence,
    }))
}

/// UTF-8 index behind `instruction` when it is an `ldc`/`ldc_w` of a `CONSTANT_String`.
fn string_constant(class: &ClassFile, instruction: &Instruction) -> Option<u16> {
    let index = match instruction {
        Instruction::Ldc(index) => u16::from(*index),
        Instruction::Ldc_w(index) => *index,
        _ => return None,
    };
    match class.constant_pool.get(index) {
        Some(Constant::String(utf8_index)) => Some(*utf8_index),
        _ => None,
    }
}

fn find_accessor<'a>(class: &'a ClassFile, entry: &str) -> Result<Option<&'a Method>> {
    for method in &class.methods {
        let name = class
            .constant_pool
            .try_get_utf8(method.name_index)
            .map_err(|e| malformed(entry, format!("bad method name: {e:?}")))?;
        if name != ACCESSOR_NAME {
            continue;
        }
        let descriptor = class
            .constant_pool
            .try_get_utf8(method.descriptor_index)
            .map_err(|e| malformed(entry, format!("bad method descriptor: {e:?}")))?;
        if descriptor == ACCESSOR_DESCRIPTOR {
            return Ok(Some(method));
        }
    }
    Ok(None)
}

fn malformed(entry: &str, reason: String) -> DiscoveryError {
    DiscoveryError::MalformedBinary {
        entry: entry.to_string(),
        reason,
    }
}
