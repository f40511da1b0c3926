//! The variant codec: one value behind the `v` type, carrying its own
//! signature so that the reader needs no prior knowledge of what is inside.

use crate::cursor::{AppendCursor, ReadCursor};
use crate::dynamic::{check_representable, decode_value, write_value};
use crate::error::{Error, Result};
use crate::marshal::Marshal;
use crate::signature::Signature;
use crate::value::Value;
use crate::wire_type::WireType;

use byteorder::ByteOrder;
use log::trace;
use serde::{Deserialize, Serialize};

/// A variant as a statically typed argument, e.g. the values of an `a{sv}`.
/// The contents are dynamic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variant(pub Value);

impl Variant {
    pub fn new(inner: impl Into<Value>) -> Self {
        Variant(inner.into())
    }
}

impl Marshal for Variant {
    fn signature() -> Signature {
        Signature::from_trusted("v".to_owned())
    }

    fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
        encode_value_variant(&self.0, cursor)
    }

    fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
        decode_variant(cursor).map(Variant)
    }
}

/// Boxes a statically typed value in a variant, using its static signature.
pub fn encode_variant<T: Marshal, B: ByteOrder>(
    value: &T,
    cursor: &mut AppendCursor<'_, B>,
) -> Result<()> {
    let sig = T::signature();
    cursor.open_container(WireType::Variant, Some(&sig), |inner| value.encode(inner))
}

/// Boxes a dynamic value in a variant, using the signature generated from it.
pub fn encode_value_variant<B: ByteOrder>(
    value: &Value,
    cursor: &mut AppendCursor<'_, B>,
) -> Result<()> {
    if let Value::Unit = value {
        return Err(Error::UnrepresentableDynamicValue("a variant cannot hold unit"));
    }
    check_representable(value)?;
    write_value_variant(value, cursor)
}

pub(crate) fn write_value_variant<B: ByteOrder>(
    value: &Value,
    cursor: &mut AppendCursor<'_, B>,
) -> Result<()> {
    let sig = value.signature();
    cursor.open_container(WireType::Variant, Some(&sig), |inner| write_value(value, inner))
}

/// Decodes the variant at the cursor into the value it holds.
pub fn decode_variant<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Value> {
    cursor.expect(WireType::Variant)?;
    let element_type = cursor.element_type().map_err(unsupported_content)?;
    let inner = cursor.recurse().map_err(unsupported_content)?;
    trace!("Variant holds {}", element_type);
    match element_type {
        WireType::Invalid => Err(Error::MalformedContainer("variant holds no value")),
        _ => decode_value(&inner),
    }
}

fn unsupported_content(err: Error) -> Error {
    match err {
        Error::UnsupportedWireType(code) => Error::UnsupportedVariantContent(code),
        Error::UnrecognizedSignatureCharacter(code) => {
            Error::UnsupportedVariantContent(code as char)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_variant, Variant};
    use crate::error::{Error, Result};
    use crate::marshal::{from_message, to_message, DictEntry};
    use crate::message::Message;
    use crate::value::{Array, Value};
    use test_log::test;

    #[test]
    fn variant_keeps_its_type() -> Result<()> {
        let message = to_message(&Variant::new(42i32))?;
        assert_eq!(message.data, vec![1, 105, 0, 0, 42, 0, 0, 0]);
        let Variant(inner) = from_message::<Variant>(&message)?;
        assert_eq!(inner, Value::Int32(42));

        let message = to_message(&Variant::new(42u32))?;
        let Variant(inner) = from_message::<Variant>(&message)?;
        assert_eq!(inner, Value::UInt32(42));
        Ok(())
    }

    #[test]
    fn static_variant() -> Result<()> {
        let mut message = Message::new();
        encode_variant(&vec![1.0f64, 2.0, 3.0, 4.0], &mut message.append_cursor())?;
        assert_eq!(
            message.data,
            vec![
                2, 97, 100, 0, 32, 0, 0, 0, 0, 0, 0, 0, 0, 0, 240, 63, 0, 0, 0, 0, 0, 0, 0, 64, 0,
                0, 0, 0, 0, 0, 8, 64, 0, 0, 0, 0, 0, 0, 16, 64,
            ]
        );
        let Variant(inner) = from_message::<Variant>(&message)?;
        assert_eq!(
            inner,
            Value::Array(Array::from_items(vec![
                Value::Double(1.0),
                Value::Double(2.0),
                Value::Double(3.0),
                Value::Double(4.0),
            ])?)
        );
        Ok(())
    }

    #[test]
    fn serialize_dict() -> Result<()> {
        let data = vec![
            DictEntry::new("a".to_owned(), Variant::new("Hi")),
            DictEntry::new("b".to_owned(), Variant::new(0.2f64)),
            DictEntry::new(
                "c".to_owned(),
                Variant(Value::Struct(vec![Value::from("Hello"), Value::Double(8.3)])),
            ),
        ];

        let message = to_message(&data)?;
        let correct_message = Message {
            data: vec![
                88u8, 0u8, 0u8, 0u8, // 88 bytes of array
                0u8, 0u8, 0u8, 0u8, // padding(8)
                1u8, 0u8, 0u8, 0u8, // 1 byte string
                97u8, 0u8, // "a"
                1u8, // 1 byte signature
                115u8, 0u8, // 's'
                0u8, 0u8, 0u8, // padding(4)
                2u8, 0u8, 0u8, 0u8, // 2 byte string
                72u8, 105u8, 0u8, // "Hi"
                0u8, 0u8, 0u8, 0u8, 0u8, // padding(8)
                1u8, 0u8, 0u8, 0u8, // 1 byte string
                98u8, 0u8, // "b"
                1u8, // 1 byte signature
                100u8, 0u8, // "d"
                0u8, 0u8, 0u8, 0u8, 0u8, 0u8, 0u8, // padding(8)
                154u8, 153u8, 153u8, 153u8, 153u8, 153u8, 201u8, 63u8, // double 0.2
                1u8, 0u8, 0u8, 0u8, // 1 byte string
                99u8, 0u8, // "c"
                4u8, // 4 byte signature
                40u8, 115u8, 100u8, 41u8, 0u8, // "(sd)"
                0u8, 0u8, 0u8, 0u8, // padding(8)
                5u8, 0u8, 0u8, 0u8, // 5 byte string
                72u8, 101u8, 108u8, 108u8, 111u8, 0u8, // "Hello"
                0u8, 0u8, 0u8, 0u8, 0u8, 0u8, // padding(8)
                154u8, 153u8, 153u8, 153u8, 153u8, 153u8, 32u8, 64u8, // double 8.3
            ],
            signature: "a{sv}".as_bytes().to_vec(),
        };
        assert_eq!(
            correct_message, message,
            "dict message serialized incorrectly"
        );

        let decoded: Vec<DictEntry<String, Variant>> = from_message(&message)?;
        assert_eq!(decoded, data);
        Ok(())
    }

    #[test]
    fn unsupported_content() {
        let message = Message {
            data: vec![1, b'h', 0, 0, 0, 0, 0, 0],
            signature: b"v".to_vec(),
        };
        assert_eq!(
            from_message::<Variant>(&message),
            Err(Error::UnsupportedVariantContent('h'))
        );
        let message = Message {
            data: vec![2, b'a', b'h', 0, 0, 0, 0, 0],
            signature: b"v".to_vec(),
        };
        assert_eq!(
            from_message::<Variant>(&message),
            Err(Error::UnsupportedVariantContent('h'))
        );
    }

    #[test]
    fn unit_variant() {
        assert_eq!(
            to_message(&Variant(Value::Unit)),
            Err(Error::UnrepresentableDynamicValue("a variant cannot hold unit"))
        );
    }
}
