
use crate::wire_type::WireType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: WireType, found: WireType },
    #[error("signature mismatch: expected {expected:?}, found {found:?}")]
    SignatureMismatch { expected: String, found: String },
    #[error("out of memory reserving {0} bytes of message buffer")]
    OutOfMemory(usize),
    #[error("unsupported variant content '{0}'")]
    UnsupportedVariantContent(char),
    #[error("unrepresentable dynamic value: {0}")]
    UnrepresentableDynamicValue(&'static str),
    #[error("malformed container: {0}")]
    MalformedContainer(&'static str),
    #[error("unsupported wire type '{0}'")]
    UnsupportedWireType(char),
    #[error("unrecognized signature character {0:#04x}")]
    UnrecognizedSignatureCharacter(u8),
    #[error("mismatched signature bracketing at {0}")]
    MismatchedSignatureBracketing(usize),
    #[error("signature of {0} bytes is longer than 255")]
    SignatureTooLong(usize),
    #[error("containers nested deeper than {0}")]
    NestingTooDeep(usize),
    #[error("array of {0} bytes exceeds the maximum of {1}")]
    ArrayTooLong(usize, usize),
    #[error("index {0} out of bounds")]
    IndexOutOfBounds(usize),
    #[error("invalid boolean value {0}")]
    InvalidBoolValue(u32),
    #[error("string contains an interior nul byte")]
    InteriorNul,
    #[error("string ending at {0} is missing its nul terminator")]
    MissingNulTerminator(usize),
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("arguments left over after decoding")]
    LeftoverArguments,
}

impl Error {
    pub(crate) fn type_mismatch(expected: WireType, found: WireType) -> Self {
        Error::TypeMismatch { expected, found }
    }

    pub(crate) fn signature_mismatch(expected: &[u8], found: &[u8]) -> Self {
        Error::SignatureMismatch {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
        }
    }
}
