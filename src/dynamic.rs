//! The dynamic codec: [`Value`] trees in and out of a message, dispatching on
//! the wire tag at run time.
//!
//! Decoding walks the arguments left to right and depth first, in wire order,
//! and produces a tree that owns all of its data. Encoding accepts every
//! shape that decoding can produce; the few trees with no wire form are
//! refused with [`Error::UnrepresentableDynamicValue`] before anything is
//! written.

use crate::cursor::{AppendCursor, ReadCursor};
use crate::error::{Error, Result};
use crate::signature::Signature;
use crate::value::{Array, Value};
use crate::variant::{decode_variant, write_value_variant};
use crate::wire_type::WireType;

use byteorder::ByteOrder;
use log::trace;

/// Decodes every argument from the cursor onwards, leaving the cursor at the
/// end.
pub fn decode_values<B: ByteOrder>(cursor: &mut ReadCursor<'_, B>) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    while cursor.arg_type()? != WireType::Invalid {
        values.push(decode_value(cursor)?);
        if !cursor.next()? {
            break;
        }
    }
    Ok(values)
}

/// Decodes the value at the cursor without moving it.
pub fn decode_value<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Value> {
    let value = match cursor.arg_type()? {
        WireType::Invalid => {
            return Err(Error::MalformedContainer("no value at cursor position"));
        }
        WireType::Byte => Value::Byte(cursor.get_basic()?),
        WireType::Boolean => Value::Bool(cursor.get_basic()?),
        WireType::Int16 => Value::Int16(cursor.get_basic()?),
        WireType::UInt16 => Value::UInt16(cursor.get_basic()?),
        WireType::Int32 => Value::Int32(cursor.get_basic()?),
        WireType::UInt32 => Value::UInt32(cursor.get_basic()?),
        WireType::Int64 => Value::Int64(cursor.get_basic()?),
        WireType::UInt64 => Value::UInt64(cursor.get_basic()?),
        WireType::Double => Value::Double(cursor.get_basic()?),
        WireType::String => Value::Str(cursor.get_basic()?),
        WireType::ObjectPath => Value::ObjectPath(cursor.get_basic()?),
        WireType::Signature => Value::Signature(cursor.get_basic()?),
        WireType::Array => Value::Array(decode_array(cursor)?),
        WireType::Struct => Value::Struct(decode_fields(cursor)?),
        WireType::DictEntry => {
            let mut entry = cursor.recurse()?;
            let key = decode_value(&entry)?;
            if !entry.next()? {
                return Err(Error::MalformedContainer("dict entry has no value"));
            }
            Value::DictEntry(Box::new(key), Box::new(decode_value(&entry)?))
        }
        WireType::Variant => Value::Variant(Box::new(decode_variant(cursor)?)),
    };
    Ok(value)
}

fn decode_array<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Array> {
    let element_signature = Signature::from_trusted(cursor.signature()?[1..].to_owned());
    if cursor.array_length()? == 0 {
        trace!("Empty array of '{}'", element_signature);
        return Ok(Array::from_wire(element_signature, Vec::new()));
    }
    let mut items = Vec::new();
    let mut elements = cursor.recurse()?;
    loop {
        items.push(decode_value(&elements)?);
        if !elements.next()? {
            break;
        }
    }
    Ok(Array::from_wire(element_signature, items))
}

fn decode_fields<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Vec<Value>> {
    let mut fields = cursor.recurse()?;
    let mut values = Vec::new();
    loop {
        values.push(decode_value(&fields)?);
        if !fields.next()? {
            break;
        }
    }
    Ok(values)
}

/// Appends each value as an argument, in order.
pub fn encode_values<B: ByteOrder>(
    values: &[Value],
    cursor: &mut AppendCursor<'_, B>,
) -> Result<()> {
    for value in values {
        encode_value(value, cursor)?;
    }
    Ok(())
}

/// Appends one value. `Unit` appends nothing, and only at the top level.
pub fn encode_value<B: ByteOrder>(value: &Value, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
    if let Value::Unit = value {
        if cursor.is_top_level() {
            return Ok(());
        }
        return Err(Error::UnrepresentableDynamicValue(
            "unit inside a container",
        ));
    }
    check_representable(value)?;
    write_value(value, cursor)
}

/// Rejects trees that have no wire form: unit below the top level, arrays
/// whose items do not have the element signature, empty structs and dict
/// entries keyed by anything but a basic type.
pub(crate) fn check_representable(value: &Value) -> Result<()> {
    match value {
        Value::Unit => Err(Error::UnrepresentableDynamicValue(
            "unit inside a container",
        )),
        Value::Array(array) => {
            for item in array.items() {
                if &item.signature() != array.element_signature() {
                    return Err(Error::UnrepresentableDynamicValue(
                        "array items do not share one signature",
                    ));
                }
                check_representable(item)?;
            }
            Ok(())
        }
        Value::Struct(fields) => {
            if fields.is_empty() {
                return Err(Error::UnrepresentableDynamicValue("struct has no fields"));
            }
            fields.iter().try_for_each(check_representable)
        }
        Value::DictEntry(key, value) => {
            if !key.wire_type().is_basic() {
                return Err(Error::UnrepresentableDynamicValue(
                    "dict entry key must be a basic type",
                ));
            }
            check_representable(value)
        }
        Value::Variant(inner) => check_representable(inner),
        _ => Ok(()),
    }
}

// Assumes `check_representable` has passed for `value`.
pub(crate) fn write_value<B: ByteOrder>(
    value: &Value,
    cursor: &mut AppendCursor<'_, B>,
) -> Result<()> {
    match value {
        Value::Unit => Ok(()),
        Value::Byte(v) => cursor.put_basic(v),
        Value::Bool(v) => cursor.put_basic(v),
        Value::Int16(v) => cursor.put_basic(v),
        Value::UInt16(v) => cursor.put_basic(v),
        Value::Int32(v) => cursor.put_basic(v),
        Value::UInt32(v) => cursor.put_basic(v),
        Value::Int64(v) => cursor.put_basic(v),
        Value::UInt64(v) => cursor.put_basic(v),
        Value::Double(v) => cursor.put_basic(v),
        Value::Str(v) => cursor.put_basic(v),
        Value::ObjectPath(v) => cursor.put_basic(v),
        Value::Signature(v) => cursor.put_basic(v),
        Value::Array(array) => cursor.open_container(
            WireType::Array,
            Some(array.element_signature()),
            |elements| {
                array
                    .items()
                    .iter()
                    .try_for_each(|item| write_value(item, elements))
            },
        ),
        Value::Struct(fields) => cursor.open_container(WireType::Struct, None, |sub| {
            fields.iter().try_for_each(|field| write_value(field, sub))
        }),
        Value::DictEntry(key, value) => cursor.open_container(WireType::DictEntry, None, |sub| {
            write_value(key, sub)?;
            write_value(value, sub)
        }),
        Value::Variant(inner) => write_value_variant(inner, cursor),
    }
}
