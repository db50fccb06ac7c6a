use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A required input is absent or a precondition on an argument does not hold
    InvalidArgument(String),

    /// Copying `length` bytes from `offset` would read past the `available` bytes of the source
    OutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// The reference has no declaring type to resolve it against
    ///
    /// This is a misuse of the API, not a lookup failure, so retrying will not help.
    NotResolvable(String),

    /// The resolver has never heard of this class
    MissingClass(String),

    /// The class exists, but neither it nor its supertypes declare the member
    MissingMember(String),

    /// An internal invariant was broken (indicates a bug in the caller's inputs)
    InvariantViolation(String),

    /// A field descriptor, method descriptor, or generic signature could not be parsed
    MalformedSignature(String),

    /// An attribute's contents disagree with its declared length
    MalformedAttribute(String),

    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::OutOfBounds {
                offset,
                length,
                available,
            } => write!(
                f,
                "range {}..{} is out of bounds for {} bytes",
                offset,
                offset.saturating_add(*length),
                available
            ),
            Error::NotResolvable(msg) => write!(f, "cannot resolve {}", msg),
            Error::MissingClass(name) => write!(f, "missing class {}", name),
            Error::MissingMember(name) => write!(f, "missing member {}", name),
            Error::InvariantViolation(msg) => write!(f, "invariant violated: {}", msg),
            Error::MalformedSignature(msg) => write!(f, "malformed signature: {}", msg),
            Error::MalformedAttribute(msg) => write!(f, "malformed attribute: {}", msg),
            Error::IoError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
