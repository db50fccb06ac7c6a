#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use jdec::jvm::class_file::ConstantPool;
use jdec::jvm::{parse_class_constant, Error, TypeReference};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

enum Constant {
    Utf8(String),
    Class(u16),
}

/// Constant pool backed by a vector, indexed from 1 like the real thing
#[derive(Default)]
pub struct VecConstantPool {
    constants: Vec<Constant>,
}

impl VecConstantPool {
    pub fn new() -> VecConstantPool {
        VecConstantPool::default()
    }

    pub fn add_utf8(&mut self, value: &str) -> u16 {
        self.constants.push(Constant::Utf8(value.to_string()));
        self.constants.len() as u16
    }

    pub fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.constants.push(Constant::Class(name_index));
        self.constants.len() as u16
    }

    fn get(&self, index: u16) -> Option<&Constant> {
        (index as usize)
            .checked_sub(1)
            .and_then(|index| self.constants.get(index))
    }
}

impl ConstantPool for VecConstantPool {
    fn utf8(&self, index: u16) -> Result<&str, Error> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(Error::InvalidArgument(format!(
                "constant {} is not a Utf8",
                index
            ))),
        }
    }

    fn class(&self, index: u16) -> Result<TypeReference, Error> {
        match self.get(index) {
            Some(Constant::Class(name_index)) => parse_class_constant(self.utf8(*name_index)?),
            _ => Err(Error::InvalidArgument(format!(
                "constant {} is not a Class",
                index
            ))),
        }
    }
}

/// Exception table entry as it appears in the class file
pub struct Handler {
    pub start: u16,
    pub end: u16,
    pub handler: u16,
    pub catch_type: u16,
}

/// Attribute header plus contents
pub fn attribute(pool: &mut VecConstantPool, name: &str, info: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.write_u16::<BigEndian>(pool.add_utf8(name)).unwrap();
    bytes.write_u32::<BigEndian>(info.len() as u32).unwrap();
    bytes.extend_from_slice(info);
    bytes
}

/// `u2` count followed by the already encoded attributes
pub fn attribute_list(attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.write_u16::<BigEndian>(attributes.len() as u16).unwrap();
    for attribute in attributes {
        bytes.extend_from_slice(attribute);
    }
    bytes
}

pub fn code_attribute(
    pool: &mut VecConstantPool,
    max_stack: u16,
    max_locals: u16,
    code: &[u8],
    handlers: &[Handler],
    nested: &[Vec<u8>],
) -> Vec<u8> {
    let mut info = vec![];
    info.write_u16::<BigEndian>(max_stack).unwrap();
    info.write_u16::<BigEndian>(max_locals).unwrap();
    info.write_u32::<BigEndian>(code.len() as u32).unwrap();
    info.extend_from_slice(code);
    info.write_u16::<BigEndian>(handlers.len() as u16).unwrap();
    for handler in handlers {
        info.write_u16::<BigEndian>(handler.start).unwrap();
        info.write_u16::<BigEndian>(handler.end).unwrap();
        info.write_u16::<BigEndian>(handler.handler).unwrap();
        info.write_u16::<BigEndian>(handler.catch_type).unwrap();
    }
    info.extend(attribute_list(nested));
    attribute(pool, "Code", &info)
}

pub fn exceptions_attribute(pool: &mut VecConstantPool, class_indices: &[u16]) -> Vec<u8> {
    let mut info = vec![];
    info.write_u16::<BigEndian>(class_indices.len() as u16).unwrap();
    for index in class_indices {
        info.write_u16::<BigEndian>(*index).unwrap();
    }
    attribute(pool, "Exceptions", &info)
}

pub fn line_number_table(pool: &mut VecConstantPool, lines: &[(u16, u16)]) -> Vec<u8> {
    let mut info = vec![];
    info.write_u16::<BigEndian>(lines.len() as u16).unwrap();
    for (offset, line) in lines {
        info.write_u16::<BigEndian>(*offset).unwrap();
        info.write_u16::<BigEndian>(*line).unwrap();
    }
    attribute(pool, "LineNumberTable", &info)
}
