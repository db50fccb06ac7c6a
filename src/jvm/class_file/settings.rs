/// Knobs for how forgiving the attribute reader is
///
/// The defaults accept what the JVM itself would load and leave exception table checks to
/// whoever later runs range computations over the table.
#[derive(Clone, Debug)]
pub struct ReaderSettings {
    /// Fail when an attribute's contents do not end exactly at its declared length
    ///
    /// When this is off, contents that stop short are logged and reading resumes at the declared
    /// end. Contents running past the declared end are always an error.
    pub strict_attribute_lengths: bool,

    /// Reject exception table entries that do not fit inside the code they protect
    pub validate_exception_table: bool,

    /// Largest accepted `code_length`
    ///
    /// The JVM caps method bodies at 65535 bytes (offsets in the exception table are `u16`).
    pub max_code_length: u32,
}

impl ReaderSettings {
    pub const JVM_MAX_CODE_LENGTH: u32 = 65535;

    /// Settings that reject anything suspicious
    pub fn strict() -> ReaderSettings {
        ReaderSettings {
            strict_attribute_lengths: true,
            validate_exception_table: true,
            ..ReaderSettings::default()
        }
    }
}

impl Default for ReaderSettings {
    fn default() -> ReaderSettings {
        ReaderSettings {
            strict_attribute_lengths: false,
            validate_exception_table: false,
            max_code_length: Self::JVM_MAX_CODE_LENGTH,
        }
    }
}
