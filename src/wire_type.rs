use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type tag of the value at a cursor position.
///
/// `Invalid` is what a cursor reports once it has run off the end of its
/// argument list or container. UNIX_FD (`h`) is part of the protocol but is
/// not carried by this crate, and is rejected rather than skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    Invalid,
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    Array,
    Struct,
    DictEntry,
    Variant,
}

impl WireType {
    /// Maps the leading character of a complete type to its tag.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            b'y' => Ok(WireType::Byte),
            b'b' => Ok(WireType::Boolean),
            b'n' => Ok(WireType::Int16),
            b'q' => Ok(WireType::UInt16),
            b'i' => Ok(WireType::Int32),
            b'u' => Ok(WireType::UInt32),
            b'x' => Ok(WireType::Int64),
            b't' => Ok(WireType::UInt64),
            b'd' => Ok(WireType::Double),
            b's' => Ok(WireType::String),
            b'o' => Ok(WireType::ObjectPath),
            b'g' => Ok(WireType::Signature),
            b'a' => Ok(WireType::Array),
            b'(' => Ok(WireType::Struct),
            b'{' => Ok(WireType::DictEntry),
            b'v' => Ok(WireType::Variant),
            b'h' => Err(Error::UnsupportedWireType('h')), // UNIX_FD
            _ => Err(Error::UnrecognizedSignatureCharacter(code)),
        }
    }

    /// The opening signature character, `None` for `Invalid`.
    pub fn code(self) -> Option<u8> {
        match self {
            WireType::Invalid => None,
            WireType::Byte => Some(b'y'),
            WireType::Boolean => Some(b'b'),
            WireType::Int16 => Some(b'n'),
            WireType::UInt16 => Some(b'q'),
            WireType::Int32 => Some(b'i'),
            WireType::UInt32 => Some(b'u'),
            WireType::Int64 => Some(b'x'),
            WireType::UInt64 => Some(b't'),
            WireType::Double => Some(b'd'),
            WireType::String => Some(b's'),
            WireType::ObjectPath => Some(b'o'),
            WireType::Signature => Some(b'g'),
            WireType::Array => Some(b'a'),
            WireType::Struct => Some(b'('),
            WireType::DictEntry => Some(b'{'),
            WireType::Variant => Some(b'v'),
        }
    }

    pub fn alignment(self) -> usize {
        match self {
            WireType::Invalid | WireType::Byte | WireType::Signature | WireType::Variant => 1,
            WireType::Int16 | WireType::UInt16 => 2,
            WireType::Boolean
            | WireType::Int32
            | WireType::UInt32
            | WireType::String
            | WireType::ObjectPath
            | WireType::Array => 4,
            WireType::Int64
            | WireType::UInt64
            | WireType::Double
            | WireType::Struct
            | WireType::DictEntry => 8,
        }
    }

    /// Wire size of the fixed-width basic types.
    pub(crate) fn fixed_size(self) -> Option<usize> {
        match self {
            WireType::Byte => Some(1),
            WireType::Int16 | WireType::UInt16 => Some(2),
            WireType::Boolean | WireType::Int32 | WireType::UInt32 => Some(4),
            WireType::Int64 | WireType::UInt64 | WireType::Double => Some(8),
            _ => None,
        }
    }

    /// Basic types are the only ones allowed as dict entry keys.
    pub fn is_basic(self) -> bool {
        !matches!(
            self,
            WireType::Invalid
                | WireType::Array
                | WireType::Struct
                | WireType::DictEntry
                | WireType::Variant
        )
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            WireType::Array | WireType::Struct | WireType::DictEntry | WireType::Variant
        )
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{:?} '{}'", self, code as char),
            None => write!(f, "{:?}", self),
        }
    }
}
