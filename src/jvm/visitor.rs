//! Push-based traversal of method definitions
//!
//! A [`MethodVisitor`] receives everything known about one method: its attributes, annotations,
//! line numbers and (if it asks for it) the body. Consumers implement only the callbacks they need,
//! since every callback has a no-op default.

use super::class_file::{Attribute, ByteRegion, CodeAttribute, ExceptionTableEntry, RawAttribute};
use super::{Error, MethodDefinition, MethodReference, TypeReference};
use byteorder::{BigEndian, ReadBytesExt};

/// Receives the contents of one method
///
/// Calls arrive in this order: attributes and annotations, then the body (only if
/// [`MethodVisitor::can_visit_body`] is true), then line numbers, and finally
/// [`MethodVisitor::visit_end`], which happens exactly once per traversal.
pub trait MethodVisitor {
    /// Should the driver bother decoding the body?
    fn can_visit_body(&self) -> bool {
        false
    }

    /// Start visiting the body, returning the visitor for its instructions
    fn visit_body(
        &mut self,
        _max_stack: u32,
        _max_locals: u32,
    ) -> Option<&mut dyn InstructionVisitor> {
        None
    }

    fn visit_frame(&mut self, _frame: &Frame) {}

    /// Instruction at which a source line starts
    fn visit_line_number(&mut self, _instruction: &Instruction, _line_number: u32) {}

    fn visit_attribute(&mut self, _attribute: &Attribute) {}

    fn visit_annotation(&mut self, _annotations: &RawAttribute, _visible: bool) {}

    fn visit_end(&mut self) {}
}

/// Receives the instruction stream of one method body
pub trait InstructionVisitor {
    /// Raw bytecode to decode
    fn visit_code(&mut self, code: &ByteRegion);

    fn visit_exception_handler(&mut self, _handler: &ExceptionTableEntry) {}

    fn visit_end(&mut self) {}
}

/// Position of an instruction in the bytecode
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub offset: u32,

    /// Raw byte at `offset`
    ///
    /// This is only an opcode if `offset` really is an instruction boundary. Offsets taken from
    /// a `LineNumberTable` are not checked, so a malformed table can land on an operand byte.
    pub opcode: u8,
}

/// State of the locals and stack at some offset, as recorded in a `StackMapTable`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub offset: u32,
    pub locals: Vec<FrameValue>,
    pub stack: Vec<FrameValue>,
}

/// Verification type of one local or stack slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameValue {
    Top,
    Integer,
    Float,
    Long,
    Double,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    Object(TypeReference),

    /// Result of `new` before the constructor has run, with the offset of the `new`
    Uninitialized(u32),
}

impl FrameValue {
    /// Number of local variable slots taken up
    pub fn width(&self) -> usize {
        match self {
            FrameValue::Long | FrameValue::Double => 2,
            _ => 1,
        }
    }
}

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";

impl MethodDefinition {
    /// Push this method through a visitor
    pub fn accept<V: MethodVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), Error> {
        log::trace!("Visiting {}", self.full_name());

        for attribute in self.attributes() {
            match attribute {
                Attribute::Raw(raw) if raw.name == RUNTIME_VISIBLE_ANNOTATIONS => {
                    visitor.visit_annotation(raw, true)
                }
                Attribute::Raw(raw) if raw.name == RUNTIME_INVISIBLE_ANNOTATIONS => {
                    visitor.visit_annotation(raw, false)
                }
                other => visitor.visit_attribute(other),
            }
        }

        // Always finish the traversal, even if the body turns out to be unreadable
        let result = match self.body() {
            Some(body) if body.has_code() && visitor.can_visit_body() => {
                Self::accept_body(body, visitor)
            }
            Some(body) if body.has_code() => {
                log::debug!("Skipping body of {}", self.full_name());
                Ok(())
            }
            _ => Ok(()),
        };

        visitor.visit_end();
        result
    }

    fn accept_body<V: MethodVisitor + ?Sized>(
        body: &CodeAttribute,
        visitor: &mut V,
    ) -> Result<(), Error> {
        let code = match body.code() {
            Some(code) => code,
            None => return Ok(()),
        };

        if let Some(instructions) = visitor.visit_body(body.max_stack(), body.max_locals()) {
            instructions.visit_code(code);
            for handler in body.exception_table() {
                instructions.visit_exception_handler(handler);
            }
            instructions.visit_end();
        }

        for attribute in body.attributes() {
            match attribute {
                Attribute::Raw(raw) if raw.name == LINE_NUMBER_TABLE => {
                    for (instruction, line_number) in line_numbers(raw, code)? {
                        visitor.visit_line_number(&instruction, line_number);
                    }
                }
                other => visitor.visit_attribute(other),
            }
        }

        Ok(())
    }
}

/// Decode a `LineNumberTable` attribute against the code it describes
///
/// Entries pointing outside the code are dropped. The remaining offsets are trusted, so the
/// `opcode` of each [`Instruction`] is just the byte found there.
pub fn line_numbers(
    attribute: &RawAttribute,
    code: &ByteRegion,
) -> Result<Vec<(Instruction, u32)>, Error> {
    let mut cursor = attribute.info.reader();
    let count = cursor.read_u16::<BigEndian>()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let offset = cursor.read_u16::<BigEndian>()?;
        let line_number = cursor.read_u16::<BigEndian>()?;
        match code.u8_at(offset as usize) {
            Some(opcode) => entries.push((
                Instruction {
                    offset: offset as u32,
                    opcode,
                },
                line_number as u32,
            )),
            None => log::warn!(
                "Line number {} points past the end of the code (offset {})",
                line_number,
                offset
            ),
        }
    }
    Ok(entries)
}
