use crate::error::{Error, Result};
use crate::signature::{self, Signature};
use crate::wire_type::WireType;

use byteorder::ByteOrder;
use log::error;
use serde::{Deserialize, Serialize};
use std::mem::size_of;
use std::str::from_utf8;

/// A basic (non-container) DBus type, read and written in one piece.
///
/// `serialize` is handed a slice of exactly `size()` bytes, already aligned.
/// `deserialize` is handed the readable data and the aligned start offset,
/// and returns the value along with the offset just past it.
pub trait DbusPrimitive: Sized {
    const WIRE_TYPE: WireType;
    const SIGNATURE: u8;

    fn alignment() -> usize {
        Self::WIRE_TYPE.alignment()
    }

    fn size(&self) -> usize;
    fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()>;
    fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)>;
}

pub(crate) fn slice(data: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    let end = pos
        .checked_add(len)
        .ok_or(Error::IndexOutOfBounds(usize::MAX))?;
    data.get(pos..end).ok_or_else(|| {
        error!("Index out of bounds: {}..{} of {}", pos, end, data.len());
        Error::IndexOutOfBounds(end)
    })
}

macro_rules! basic_primitive {
    ($type:ident, $wire:ident, $sig:expr, $read:ident, $write:ident) => {
        impl DbusPrimitive for $type {
            const WIRE_TYPE: WireType = WireType::$wire;
            const SIGNATURE: u8 = $sig;

            fn size(&self) -> usize {
                size_of::<$type>()
            }

            fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()> {
                B::$write(out, *self);
                Ok(())
            }

            fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)> {
                let bytes = slice(data, pos, size_of::<$type>())?;
                Ok((B::$read(bytes), pos + size_of::<$type>()))
            }
        }
    };
}

basic_primitive!(i16, Int16, b'n', read_i16, write_i16);
basic_primitive!(u16, UInt16, b'q', read_u16, write_u16);
basic_primitive!(i32, Int32, b'i', read_i32, write_i32);
basic_primitive!(u32, UInt32, b'u', read_u32, write_u32);
basic_primitive!(i64, Int64, b'x', read_i64, write_i64);
basic_primitive!(u64, UInt64, b't', read_u64, write_u64);
basic_primitive!(f64, Double, b'd', read_f64, write_f64);

impl DbusPrimitive for u8 {
    const WIRE_TYPE: WireType = WireType::Byte;
    const SIGNATURE: u8 = b'y';

    fn size(&self) -> usize {
        1
    }

    fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()> {
        out[0] = *self;
        Ok(())
    }

    fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)> {
        Ok((slice(data, pos, 1)?[0], pos + 1))
    }
}

impl DbusPrimitive for bool {
    const WIRE_TYPE: WireType = WireType::Boolean;
    const SIGNATURE: u8 = b'b';

    fn size(&self) -> usize {
        4
    }

    fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()> {
        B::write_u32(out, *self as u32);
        Ok(())
    }

    fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)> {
        match B::read_u32(slice(data, pos, 4)?) {
            0 => Ok((false, pos + 4)),
            1 => Ok((true, pos + 4)),
            i => Err(Error::InvalidBoolValue(i)),
        }
    }
}

// Strings and object paths: u32 length, bytes, nul. Signatures use a u8 length.
fn serialize_text<B: ByteOrder>(bytes: &[u8], length_size: usize, out: &mut [u8]) -> Result<()> {
    if bytes.contains(&0) {
        return Err(Error::InteriorNul);
    }
    if length_size == 4 {
        B::write_u32(&mut out[0..4], bytes.len() as u32);
    } else {
        out[0] = bytes.len() as u8;
    }
    out[length_size..length_size + bytes.len()].copy_from_slice(bytes);
    out[length_size + bytes.len()] = 0u8;
    Ok(())
}

fn deserialize_text<B: ByteOrder>(
    data: &[u8],
    pos: usize,
    length_size: usize,
) -> Result<(&str, usize)> {
    let len = if length_size == 4 {
        B::read_u32(slice(data, pos, 4)?) as usize
    } else {
        slice(data, pos, 1)?[0] as usize
    };
    let start = pos + length_size;
    let bytes = slice(data, start, len)?;
    if slice(data, start + len, 1)?[0] != 0 {
        return Err(Error::MissingNulTerminator(start + len));
    }
    if bytes.contains(&0) {
        return Err(Error::InteriorNul);
    }
    Ok((from_utf8(bytes)?, start + len + 1))
}

impl DbusPrimitive for String {
    const WIRE_TYPE: WireType = WireType::String;
    const SIGNATURE: u8 = b's';

    fn size(&self) -> usize {
        self.len() + 5 // size and terminating null
    }

    fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()> {
        serialize_text::<B>(self.as_bytes(), 4, out)
    }

    fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)> {
        let (text, end) = deserialize_text::<B>(data, pos, 4)?;
        Ok((text.to_owned(), end))
    }
}

/// An object path. Path syntax is checked by the envelope layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectPath(pub String);

impl DbusPrimitive for ObjectPath {
    const WIRE_TYPE: WireType = WireType::ObjectPath;
    const SIGNATURE: u8 = b'o';

    fn size(&self) -> usize {
        self.0.len() + 5 // size and terminating null
    }

    fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()> {
        serialize_text::<B>(self.0.as_bytes(), 4, out)
    }

    fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)> {
        let (text, end) = deserialize_text::<B>(data, pos, 4)?;
        Ok((ObjectPath(text.to_owned()), end))
    }
}

impl DbusPrimitive for Signature {
    const WIRE_TYPE: WireType = WireType::Signature;
    const SIGNATURE: u8 = b'g';

    fn size(&self) -> usize {
        self.len() + 2 // size and terminating null
    }

    fn serialize<B: ByteOrder>(&self, out: &mut [u8]) -> Result<()> {
        serialize_text::<B>(self.as_bytes(), 1, out)
    }

    fn deserialize<B: ByteOrder>(data: &[u8], pos: usize) -> Result<(Self, usize)> {
        let (text, end) = deserialize_text::<B>(data, pos, 1)?;
        signature::validate(text.as_bytes(), signature::MAX_DEPTH)?;
        Ok((Signature::from_trusted(text.to_owned()), end))
    }
}

#[cfg(test)]
mod tests {
    use super::DbusPrimitive;
    use crate::error::{Error, Result};
    use crate::signature::Signature;
    use byteorder::{BE, LE};

    #[test]
    fn string_layout() -> Result<()> {
        let s = "Hi".to_owned();
        let mut out = vec![0u8; s.size()];
        s.serialize::<LE>(&mut out)?;
        assert_eq!(out, vec![2, 0, 0, 0, 72, 105, 0]);
        assert_eq!(String::deserialize::<LE>(&out, 0)?, (s, 7));
        Ok(())
    }

    #[test]
    fn big_endian_int() -> Result<()> {
        let mut out = vec![0u8; 4];
        0x01020304u32.serialize::<BE>(&mut out)?;
        assert_eq!(out, vec![1, 2, 3, 4]);
        assert_eq!(u32::deserialize::<BE>(&out, 0)?, (0x01020304, 4));
        Ok(())
    }

    #[test]
    fn signature_layout() -> Result<()> {
        let sig = Signature::new("a{sv}")?;
        let mut out = vec![0u8; sig.size()];
        sig.serialize::<LE>(&mut out)?;
        assert_eq!(out, b"\x05a{sv}\x00".to_vec());
        Ok(())
    }

    #[test]
    fn bad_text() {
        let s = "a\0b".to_owned();
        let mut out = vec![0u8; s.size()];
        assert_eq!(s.serialize::<LE>(&mut out), Err(Error::InteriorNul));
        assert_eq!(
            String::deserialize::<LE>(&[1, 0, 0, 0, 97, 1], 0),
            Err(Error::MissingNulTerminator(5))
        );
        assert_eq!(
            String::deserialize::<LE>(&[9, 0, 0, 0, 97, 0], 0),
            Err(Error::IndexOutOfBounds(13))
        );
        assert!(matches!(
            String::deserialize::<LE>(&[1, 0, 0, 0, 0xff, 0], 0),
            Err(Error::Utf8(_))
        ));
    }

    #[test]
    fn bool_values() {
        assert_eq!(bool::deserialize::<LE>(&[1, 0, 0, 0], 0), Ok((true, 4)));
        assert_eq!(
            bool::deserialize::<LE>(&[2, 0, 0, 0], 0),
            Err(Error::InvalidBoolValue(2))
        );
    }
}
