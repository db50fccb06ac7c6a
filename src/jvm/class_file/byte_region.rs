use crate::jvm::Error;
use std::fmt::{Debug, Error as FmtError, Formatter};
use std::io::Cursor;

/// Owned, fixed-length copy of some bytes out of a larger buffer
///
/// Once built, the contents never change. Decoders read from it through [`ByteRegion::reader`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteRegion(Box<[u8]>);

/// Check that `length` bytes starting at `offset` fit in `available` bytes, returning the end
pub fn check_bounds(offset: usize, length: usize, available: usize) -> Result<usize, Error> {
    match offset.checked_add(length) {
        Some(end) if end <= available => Ok(end),
        _ => Err(Error::OutOfBounds {
            offset,
            length,
            available,
        }),
    }
}

impl ByteRegion {
    /// Copy exactly `length` bytes starting at `offset` out of `buffer`
    pub fn copy_from(buffer: &[u8], offset: usize, length: usize) -> Result<ByteRegion, Error> {
        let end = check_bounds(offset, length, buffer.len())?;
        Ok(ByteRegion(buffer[offset..end].into()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Cursor positioned at the start of the region
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.0[..])
    }

    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.0.get(offset).copied()
    }
}

impl From<Vec<u8>> for ByteRegion {
    fn from(bytes: Vec<u8>) -> ByteRegion {
        ByteRegion(bytes.into_boxed_slice())
    }
}

impl AsRef<[u8]> for ByteRegion {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for ByteRegion {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "ByteRegion({} bytes:", self.0.len())?;
        for byte in self.0.iter().take(16) {
            write!(f, " {:02x}", byte)?;
        }
        if self.0.len() > 16 {
            f.write_str(" ..")?;
        }
        f.write_str(")")
    }
}
