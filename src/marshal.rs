//! Statically typed marshalling.
//!
//! [`Marshal`] is implemented once per shape: the basic types here, arrays,
//! structs (tuples), dict entries and maps in the `container` module, and
//! [`Variant`] for type-erased values. Which implementation runs is decided
//! at compile time; the dynamic [`Value`] path in [`dynamic`] is the only one
//! that dispatches on the wire tag.
//!
//! The entry points [`to_message`] and [`from_message`] marshal a single
//! value into, or out of, a message body.
//!
//! [`Variant`]: crate::variant::Variant
//! [`Value`]: crate::value::Value
//! [`dynamic`]: crate::dynamic

use crate::cursor::{AppendCursor, ReadCursor};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::policy::CursorPolicy;
use crate::primitives::{DbusPrimitive, ObjectPath};
use crate::signature::Signature;
use crate::wire_type::WireType;

use byteorder::{ByteOrder, LE};

mod container;

pub use container::DictEntry;

/// A type with a fixed DBus signature that can be written to and read from
/// a cursor.
///
/// `decode` reads the value at the cursor without moving it; advancing is
/// up to whoever owns the cursor. `encode` must write exactly what
/// `signature` describes.
pub trait Marshal: Sized {
    fn signature() -> Signature;
    fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()>;
    fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self>;
}

macro_rules! marshal_primitive {
    ($($type:ty),+) => {
        $(
            impl Marshal for $type {
                fn signature() -> Signature {
                    Signature::from_trusted(
                        (<$type as DbusPrimitive>::SIGNATURE as char).to_string(),
                    )
                }

                fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
                    cursor.put_basic(self)
                }

                fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
                    cursor.get_basic()
                }
            }
        )+
    };
}

marshal_primitive!(u8, bool, i16, u16, i32, u32, i64, u64, f64, String, ObjectPath, Signature);

/// The empty argument list.
impl Marshal for () {
    fn signature() -> Signature {
        Signature::default()
    }

    fn encode<B: ByteOrder>(&self, _: &mut AppendCursor<'_, B>) -> Result<()> {
        Ok(())
    }

    fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
        match cursor.arg_type()? {
            WireType::Invalid => Ok(()),
            _ => Err(Error::LeftoverArguments),
        }
    }
}

/// Marshals `value` as the single argument of a fresh message body, with the
/// default policy.
pub fn to_message<T: Marshal>(value: &T) -> Result<Message> {
    to_message_with_policy(value, CursorPolicy::default())
}

pub fn to_message_with_policy<T: Marshal>(value: &T, policy: CursorPolicy) -> Result<Message> {
    let mut mesg = Message::new();
    value.encode(&mut mesg.append_cursor_with_policy::<LE>(policy))?;
    Ok(mesg)
}

/// Reads the single argument of `mesg`. Anything after it is an error.
pub fn from_message<T: Marshal>(mesg: &Message) -> Result<T> {
    from_message_with_policy(mesg, CursorPolicy::default())
}

pub fn from_message_with_policy<T: Marshal>(mesg: &Message, policy: CursorPolicy) -> Result<T> {
    let mut cursor = mesg.read_cursor_with_policy::<LE>(policy)?;
    let t = T::decode(&cursor)?;
    if cursor.next()? {
        return Err(Error::LeftoverArguments);
    }
    Ok(t)
}
