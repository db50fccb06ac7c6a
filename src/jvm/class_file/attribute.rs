use super::{check_bounds, ByteRegion};
use crate::jvm::{Error, RenderSignature, TypeReference};
use crate::util::{self, Range};

/// Attributes attached to methods (and, for `Code`, nested inside other attributes)
///
/// Only the attributes that matter for reconstructing control flow are decoded. Everything else
/// is kept around as raw bytes so that it can still be passed along to visitors.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Code(Box<CodeAttribute>),
    Exceptions(ExceptionsAttribute),
    Raw(RawAttribute),
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Code(_) => CodeAttribute::NAME,
            Attribute::Exceptions(_) => ExceptionsAttribute::NAME,
            Attribute::Raw(raw) => &raw.name,
        }
    }

    /// Size in bytes of the attribute's contents (excluding the 6 byte name and length header)
    pub fn size(&self) -> u32 {
        match self {
            Attribute::Code(code) => code.size(),
            Attribute::Exceptions(exceptions) => exceptions.size(),
            Attribute::Raw(raw) => raw.info.len() as u32,
        }
    }
}

/// Attribute whose contents are not decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub name: String,
    pub info: ByteRegion,
}

/// Entry in the exception table of a `Code` attribute
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExceptionTableEntry {
    /// Start of exception handler range (inclusive)
    pub start_offset: u32,

    /// End of exception handler range (exclusive)
    pub end_offset: u32,

    /// Start of the exception handler
    pub handler_offset: u32,

    /// Caught exception type, or `None` for a `finally` handler (which catches everything)
    pub catch_type: Option<TypeReference>,
}

impl ExceptionTableEntry {
    pub fn new(
        start_offset: u32,
        end_offset: u32,
        handler_offset: u32,
        catch_type: Option<TypeReference>,
    ) -> ExceptionTableEntry {
        ExceptionTableEntry {
            start_offset,
            end_offset,
            handler_offset,
            catch_type,
        }
    }

    pub fn is_finally(&self) -> bool {
        self.catch_type.is_none()
    }

    /// Protected range, in the form the range algebra works on
    pub fn protected_range(&self) -> Result<Range, Error> {
        Ok(Range::new(to_offset(self.start_offset)?, to_offset(self.end_offset)?))
    }

    pub fn protects(&self, offset: u32) -> bool {
        self.start_offset <= offset && offset < self.end_offset
    }

    /// Check `start <= end <= code_length` and that the handler is inside the code
    pub fn check_within(&self, code_length: usize) -> Result<(), Error> {
        let fits = self.start_offset <= self.end_offset
            && self.end_offset as usize <= code_length
            && (self.handler_offset as usize) < code_length;
        if fits {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "exception handler {}..{} -> {} does not fit in {} bytes of code",
                self.start_offset, self.end_offset, self.handler_offset, code_length
            )))
        }
    }
}

fn to_offset(offset: u32) -> Result<i32, Error> {
    i32::try_from(offset)
        .map_err(|_| Error::InvalidArgument(format!("code offset {} is too large", offset)))
}

/// Bytecode along with the handlers protecting it
///
/// Keeping the exception table next to the bytes means a method without code cannot have any
/// protected ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MethodBody {
    code: ByteRegion,
    exception_table: Vec<ExceptionTableEntry>,
}

/// Piece of a method body, either covered by some handler or not
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CodeRegion {
    pub range: Range,
    pub protected: bool,
}

/// The `Code` attribute of a method
///
/// There are exactly two ways to make one: with bytecode copied out of a class file buffer
/// ([`CodeAttribute::new`]), or as a shell with no bytecode ([`CodeAttribute::without_code`]),
/// which is what abstract and native methods get. Nothing can be changed after construction.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    size: u32,
    max_stack: u32,
    max_locals: u32,
    body: Option<MethodBody>,
    attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub const NAME: &'static str = "Code";

    /// Make a code attribute whose bytecode is the `code_length` bytes at `code_offset` in
    /// `buffer`
    ///
    /// The bytes are copied, so the buffer can be dropped or reused afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        size: u32,
        max_stack: u32,
        max_locals: u32,
        code_offset: usize,
        code_length: usize,
        buffer: &[u8],
        exception_table: Vec<ExceptionTableEntry>,
        attributes: Vec<Attribute>,
    ) -> Result<CodeAttribute, Error> {
        let code = ByteRegion::copy_from(buffer, code_offset, code_length)?;
        Ok(CodeAttribute {
            size,
            max_stack,
            max_locals,
            body: Some(MethodBody {
                code,
                exception_table,
            }),
            attributes,
        })
    }

    /// Make a code attribute without any bytecode (and so without an exception table)
    pub fn without_code(
        size: u32,
        max_stack: u32,
        max_locals: u32,
        attributes: Vec<Attribute>,
    ) -> CodeAttribute {
        CodeAttribute {
            size,
            max_stack,
            max_locals,
            body: None,
            attributes,
        }
    }

    /// Declared size of the attribute in the class file
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn max_stack(&self) -> u32 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u32 {
        self.max_locals
    }

    pub fn has_code(&self) -> bool {
        self.body.is_some()
    }

    pub fn code(&self) -> Option<&ByteRegion> {
        self.body.as_ref().map(|body| &body.code)
    }

    /// Length of the bytecode (0 when there is none)
    pub fn code_length(&self) -> usize {
        self.code().map_or(0, ByteRegion::len)
    }

    pub fn exception_table(&self) -> &[ExceptionTableEntry] {
        match &self.body {
            Some(body) => &body.exception_table,
            None => &[],
        }
    }

    /// Nested attributes (`LineNumberTable`, `StackMapTable`, ...)
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Check every exception table entry against the length of the code
    pub fn validate_exception_table(&self) -> Result<(), Error> {
        let code_length = self.code_length();
        self.exception_table()
            .iter()
            .try_for_each(|entry| entry.check_within(code_length))
    }

    /// Every offset covered by at least one handler, as sorted disjoint ranges
    ///
    /// Handler ranges overlap whenever `try` blocks are nested, so they are merged first. Handlers
    /// over an empty range protect nothing and are left out.
    pub fn protected_ranges(&self) -> Result<Vec<Range>, Error> {
        let mut ranges = vec![];
        for entry in self.exception_table() {
            let range = entry.protected_range()?;
            if range.start != range.end {
                ranges.push(range);
            }
        }
        Ok(util::normalize(ranges))
    }

    /// Every offset not covered by any handler, as sorted disjoint ranges
    pub fn unprotected_ranges(&self) -> Result<Vec<Range>, Error> {
        let protected = self.protected_ranges()?;
        let code_length = match self.code_length() {
            0 => {
                return match protected.last() {
                    None => Ok(vec![]),
                    Some(last) => {
                        log::error!("Range {:?} protects code that does not exist", last);
                        Err(Error::InvariantViolation(format!(
                            "range {}..{} exceeds empty code",
                            last.start, last.end
                        )))
                    }
                }
            }
            len => i32::try_from(len)
                .map_err(|_| Error::InvalidArgument(format!("code length {} is too large", len)))?,
        };
        util::invert(protected, code_length)
    }

    /// Split the whole code into alternating protected and unprotected regions, in order
    pub fn regions(&self) -> Result<Vec<CodeRegion>, Error> {
        let protected = self.protected_ranges()?;
        let unprotected = self.unprotected_ranges()?;

        let mut regions: Vec<CodeRegion> = protected
            .into_iter()
            .map(|range| CodeRegion {
                range,
                protected: true,
            })
            .chain(unprotected.into_iter().map(|range| CodeRegion {
                range,
                protected: false,
            }))
            .collect();
        regions.sort_by_key(|region| region.range.start);
        Ok(regions)
    }

    /// Handlers protecting an offset, in exception table order (the order the JVM tries them)
    pub fn handlers_covering(&self, offset: u32) -> impl Iterator<Item = &ExceptionTableEntry> {
        self.exception_table()
            .iter()
            .filter(move |entry| entry.protects(offset))
    }
}

/// Checked exceptions a method declares it may throw
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.5
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExceptionsAttribute {
    exception_types: Vec<TypeReference>,
}

impl ExceptionsAttribute {
    pub const NAME: &'static str = "Exceptions";

    pub fn new(exception_types: Vec<TypeReference>) -> ExceptionsAttribute {
        ExceptionsAttribute { exception_types }
    }

    /// Build from possibly-absent types, failing if any is missing
    pub fn from_optional<I>(exception_types: I) -> Result<ExceptionsAttribute, Error>
    where
        I: IntoIterator<Item = Option<TypeReference>>,
    {
        let exception_types = exception_types
            .into_iter()
            .enumerate()
            .map(|(idx, typ)| {
                typ.ok_or_else(|| {
                    Error::InvalidArgument(format!("exception type {} is missing", idx))
                })
            })
            .collect::<Result<Vec<TypeReference>, Error>>()?;
        Ok(ExceptionsAttribute { exception_types })
    }

    pub fn exception_types(&self) -> &[TypeReference] {
        &self.exception_types
    }

    /// Serialized size: a `u2` count followed by one `u2` class index per type
    pub fn size(&self) -> u32 {
        2 * (1 + self.exception_types.len() as u32)
    }

    /// Binary names of the exceptions, for error messages and logs
    pub fn describe(&self) -> String {
        let names: Vec<String> = self
            .exception_types
            .iter()
            .map(|typ| match typ {
                TypeReference::Class(class) => class.name.to_string(),
                other => other.erased_signature(),
            })
            .collect();
        names.join(", ")
    }
}

/// Bounds check for callers about to slice a `Code` attribute out of a larger buffer
pub fn check_code_bounds(
    code_offset: usize,
    code_length: usize,
    buffer: &[u8],
) -> Result<(), Error> {
    check_bounds(code_offset, code_length, buffer.len()).map(|_| ())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::BinaryName;

    fn entry(start: u32, end: u32, handler: u32) -> ExceptionTableEntry {
        ExceptionTableEntry::new(start, end, handler, None)
    }

    fn code_with(table: Vec<ExceptionTableEntry>, len: usize) -> CodeAttribute {
        let buffer = vec![0u8; len];
        CodeAttribute::new(0, 2, 2, 0, len, &buffer, table, vec![]).unwrap()
    }

    #[test]
    fn materialized_copies_exact_bytes() {
        let buffer: Vec<u8> = (0..500).map(|i| (i % 251) as u8).collect();
        let code = CodeAttribute::new(40, 3, 4, 100, 20, &buffer, vec![], vec![]).unwrap();
        assert!(code.has_code());
        assert_eq!(code.code().unwrap().as_slice(), &buffer[100..120]);
        assert_eq!(code.code_length(), 20);
        assert_eq!(code.max_stack(), 3);
        assert_eq!(code.max_locals(), 4);
        assert_eq!(code.size(), 40);
    }

    #[test]
    fn materialized_out_of_bounds() {
        let buffer = vec![0u8; 50];
        let result = CodeAttribute::new(0, 1, 1, 40, 20, &buffer, vec![], vec![]);
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));
        assert!(check_code_bounds(40, 20, &buffer).is_err());
        assert!(check_code_bounds(30, 20, &buffer).is_ok());
    }

    #[test]
    fn shell_has_no_code() {
        let code = CodeAttribute::without_code(12, 1, 1, vec![]);
        assert!(!code.has_code());
        assert!(code.code().is_none());
        assert!(code.exception_table().is_empty());
        assert!(code.unprotected_ranges().unwrap().is_empty());
        assert!(code.regions().unwrap().is_empty());
    }

    #[test]
    fn protected_and_unprotected() {
        let code = code_with(vec![entry(5, 10, 20), entry(1, 3, 20), entry(8, 12, 24)], 30);
        assert_eq!(
            code.protected_ranges().unwrap(),
            vec![Range::new(1, 3), Range::new(5, 12)]
        );
        assert_eq!(
            code.unprotected_ranges().unwrap(),
            vec![Range::new(0, 1), Range::new(3, 5), Range::new(12, 30)]
        );

        let regions = code.regions().unwrap();
        let flags: Vec<bool> = regions.iter().map(|r| r.protected).collect();
        assert_eq!(flags, vec![false, true, false, true, false]);
        assert_eq!(regions.iter().map(|r| r.range.len()).sum::<usize>(), 30);
    }

    #[test]
    fn handlers_on_empty_code() {
        let code = code_with(vec![entry(0, 5, 0)], 0);
        assert!(matches!(
            code.unprotected_ranges(),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(code.regions(), Err(Error::InvariantViolation(_))));

        let empty = code_with(vec![], 0);
        assert!(empty.unprotected_ranges().unwrap().is_empty());
        assert!(empty.regions().unwrap().is_empty());
    }

    #[test]
    fn empty_handler_ranges_are_skipped() {
        let code = code_with(vec![entry(0, 2, 10), entry(4, 4, 10), entry(6, 8, 10)], 12);
        assert_eq!(
            code.protected_ranges().unwrap(),
            vec![Range::new(0, 2), Range::new(6, 8)]
        );

        let regions = code.regions().unwrap();
        let flags: Vec<bool> = regions.iter().map(|r| r.protected).collect();
        assert_eq!(flags, vec![true, false, true, false]);
        assert!(regions.iter().all(|r| !r.range.is_empty()));
        assert_eq!(regions[1].range, Range::new(2, 6));
    }

    #[test]
    fn handlers_in_table_order() {
        let code = code_with(vec![entry(0, 10, 12), entry(4, 6, 10), entry(6, 8, 11)], 16);
        let handlers: Vec<u32> = code.handlers_covering(5).map(|e| e.handler_offset).collect();
        assert_eq!(handlers, vec![12, 10]);
        assert_eq!(code.handlers_covering(10).count(), 0);
    }

    #[test]
    fn validation_is_opt_in() {
        let code = code_with(vec![entry(2, 40, 3)], 16);
        assert!(matches!(
            code.validate_exception_table(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            code.unprotected_ranges(),
            Err(Error::InvariantViolation(_))
        ));
        assert!(code_with(vec![entry(2, 16, 3)], 16)
            .validate_exception_table()
            .is_ok());
        assert!(code_with(vec![entry(2, 8, 16)], 16)
            .validate_exception_table()
            .is_err());
    }

    #[test]
    fn exceptions_attribute() {
        let exceptions = ExceptionsAttribute::new(vec![
            TypeReference::object(BinaryName::IOEXCEPTION),
            TypeReference::object(BinaryName::EXCEPTION),
        ]);
        assert_eq!(exceptions.size(), 6);
        assert_eq!(
            exceptions.exception_types()[0],
            TypeReference::object(BinaryName::IOEXCEPTION)
        );
        assert_eq!(
            exceptions.describe(),
            "java/io/IOException, java/lang/Exception"
        );
        assert_eq!(ExceptionsAttribute::default().size(), 2);
    }

    #[test]
    fn exceptions_reject_missing() {
        let result = ExceptionsAttribute::from_optional(vec![
            Some(TypeReference::object(BinaryName::EXCEPTION)),
            None,
        ]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
