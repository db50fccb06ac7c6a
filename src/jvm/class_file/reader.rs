use super::{
    check_code_bounds, Attribute, ByteRegion, CodeAttribute, ExceptionTableEntry,
    ExceptionsAttribute, RawAttribute, ReaderSettings,
};
use crate::jvm::{Error, TypeReference};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

/// Constant pool lookups needed while decoding attributes
///
/// Parsing the pool itself is left to the class file reader.
pub trait ConstantPool {
    /// `CONSTANT_Utf8` entry at `index`
    fn utf8(&self, index: u16) -> Result<&str, Error>;

    /// Type named by the `CONSTANT_Class` entry at `index`
    fn class(&self, index: u16) -> Result<TypeReference, Error>;
}

/// Decodes attributes out of a class file buffer
pub struct AttributeReader<'a, P: ConstantPool + ?Sized> {
    buffer: &'a [u8],
    constants: &'a P,
    settings: &'a ReaderSettings,
}

impl<'a, P: ConstantPool + ?Sized> AttributeReader<'a, P> {
    pub fn new(
        buffer: &'a [u8],
        constants: &'a P,
        settings: &'a ReaderSettings,
    ) -> AttributeReader<'a, P> {
        AttributeReader {
            buffer,
            constants,
            settings,
        }
    }

    /// Read a `u2` attribute count followed by that many attributes, starting at `offset`
    ///
    /// Returns the attributes and the offset just past the last one.
    pub fn read_attributes(&self, offset: usize) -> Result<(Vec<Attribute>, usize), Error> {
        let mut cursor = Cursor::new(self.buffer);
        cursor.set_position(offset as u64);
        let attributes = self.attributes_at(&mut cursor)?;
        Ok((attributes, cursor.position() as usize))
    }

    /// Read one attribute (header included) starting at `offset`
    ///
    /// Returns the attribute and the offset just past it.
    pub fn read_attribute(&self, offset: usize) -> Result<(Attribute, usize), Error> {
        let mut cursor = Cursor::new(self.buffer);
        cursor.set_position(offset as u64);
        let attribute = self.attribute_at(&mut cursor)?;
        Ok((attribute, cursor.position() as usize))
    }

    fn attributes_at(&self, cursor: &mut Cursor<&'a [u8]>) -> Result<Vec<Attribute>, Error> {
        let count = cursor.read_u16::<BigEndian>()?;
        (0..count).map(|_| self.attribute_at(cursor)).collect()
    }

    fn attribute_at(&self, cursor: &mut Cursor<&'a [u8]>) -> Result<Attribute, Error> {
        let name_index = cursor.read_u16::<BigEndian>()?;
        let size = cursor.read_u32::<BigEndian>()?;
        let start = cursor.position() as usize;
        let end = super::check_bounds(start, size as usize, self.buffer.len())?;

        let name = self.constants.utf8(name_index)?;
        log::trace!("Reading {} attribute ({} bytes at {})", name, size, start);

        let attribute = match name {
            CodeAttribute::NAME => Attribute::Code(Box::new(self.code_at(cursor, size)?)),
            ExceptionsAttribute::NAME => Attribute::Exceptions(self.exceptions_at(cursor)?),
            _ => {
                let info = ByteRegion::copy_from(self.buffer, start, size as usize)?;
                cursor.set_position(end as u64);
                Attribute::Raw(RawAttribute {
                    name: name.to_string(),
                    info,
                })
            }
        };

        let read_until = cursor.position() as usize;
        if read_until != end {
            let msg = format!(
                "{} attribute at {} declares {} bytes but its contents span {}",
                name,
                start,
                size,
                read_until as isize - start as isize
            );
            // Contents running past the declared end were decoded from the next attribute's bytes
            if self.settings.strict_attribute_lengths || read_until > end {
                return Err(Error::MalformedAttribute(msg));
            }
            log::warn!("{}, resuming at the declared end", msg);
            cursor.set_position(end as u64);
        }

        Ok(attribute)
    }

    fn code_at(&self, cursor: &mut Cursor<&'a [u8]>, size: u32) -> Result<CodeAttribute, Error> {
        let max_stack = cursor.read_u16::<BigEndian>()?;
        let max_locals = cursor.read_u16::<BigEndian>()?;
        let code_length = cursor.read_u32::<BigEndian>()?;
        if code_length > self.settings.max_code_length {
            return Err(Error::MalformedAttribute(format!(
                "code length {} exceeds the maximum of {}",
                code_length, self.settings.max_code_length
            )));
        }

        let code_offset = cursor.position() as usize;
        check_code_bounds(code_offset, code_length as usize, self.buffer)?;
        cursor.set_position((code_offset + code_length as usize) as u64);

        let entry_count = cursor.read_u16::<BigEndian>()?;
        let mut exception_table = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let start_offset = cursor.read_u16::<BigEndian>()?;
            let end_offset = cursor.read_u16::<BigEndian>()?;
            let handler_offset = cursor.read_u16::<BigEndian>()?;
            let catch_type = match cursor.read_u16::<BigEndian>()? {
                0 => None,
                index => Some(self.constants.class(index)?),
            };
            exception_table.push(ExceptionTableEntry::new(
                start_offset as u32,
                end_offset as u32,
                handler_offset as u32,
                catch_type,
            ));
        }

        let attributes = self.attributes_at(cursor)?;

        let code = CodeAttribute::new(
            size,
            max_stack as u32,
            max_locals as u32,
            code_offset,
            code_length as usize,
            self.buffer,
            exception_table,
            attributes,
        )?;
        if self.settings.validate_exception_table {
            code.validate_exception_table()?;
        }
        log::trace!(
            "Read {} bytes of code with {} exception handlers",
            code.code_length(),
            code.exception_table().len()
        );
        Ok(code)
    }

    /// Class index 0 is never a valid thrown type
    fn exceptions_at(&self, cursor: &mut Cursor<&'a [u8]>) -> Result<ExceptionsAttribute, Error> {
        let count = cursor.read_u16::<BigEndian>()?;
        let exception_types = (0..count)
            .map(|_| -> Result<Option<TypeReference>, Error> {
                match cursor.read_u16::<BigEndian>()? {
                    0 => Ok(None),
                    index => self.constants.class(index).map(Some),
                }
            })
            .collect::<Result<Vec<Option<TypeReference>>, Error>>()?;
        ExceptionsAttribute::from_optional(exception_types)
    }
}
