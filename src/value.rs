//! The dynamic, runtime-typed value tree.

use crate::error::{Error, Result};
use crate::primitives::ObjectPath;
use crate::signature::{signature_of, Signature};
use crate::wire_type::WireType;

use serde::{Deserialize, Serialize};

/// Any value this crate can put on the wire, typed at runtime.
///
/// Decoding produces a fully owned tree; nothing in it refers back to the
/// message. `Unit` is the empty argument list and has no wire form of its
/// own, so it can only be encoded at the top level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Byte(u8),
    Bool(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Str(String),
    ObjectPath(ObjectPath),
    Signature(Signature),
    Array(Array),
    Struct(Vec<Value>),
    DictEntry(Box<Value>, Box<Value>),
    Variant(Box<Value>),
}

impl Value {
    pub fn wire_type(&self) -> WireType {
        match self {
            Value::Unit => WireType::Invalid,
            Value::Byte(_) => WireType::Byte,
            Value::Bool(_) => WireType::Boolean,
            Value::Int16(_) => WireType::Int16,
            Value::UInt16(_) => WireType::UInt16,
            Value::Int32(_) => WireType::Int32,
            Value::UInt32(_) => WireType::UInt32,
            Value::Int64(_) => WireType::Int64,
            Value::UInt64(_) => WireType::UInt64,
            Value::Double(_) => WireType::Double,
            Value::Str(_) => WireType::String,
            Value::ObjectPath(_) => WireType::ObjectPath,
            Value::Signature(_) => WireType::Signature,
            Value::Array(_) => WireType::Array,
            Value::Struct(_) => WireType::Struct,
            Value::DictEntry(_, _) => WireType::DictEntry,
            Value::Variant(_) => WireType::Variant,
        }
    }

    pub fn signature(&self) -> Signature {
        signature_of(self)
    }

    pub fn dict_entry(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Value::DictEntry(Box::new(key.into()), Box::new(value.into()))
    }

    pub fn variant(inner: impl Into<Value>) -> Self {
        Value::Variant(Box::new(inner.into()))
    }
}

/// A homogeneous array. The element signature is kept alongside the items
/// so that an empty array still knows what it is an array of.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Array {
    element_signature: Signature,
    items: Vec<Value>,
}

impl Array {
    /// Checks that every item has exactly `element_signature`.
    pub fn new(element_signature: Signature, items: Vec<Value>) -> Result<Self> {
        if !element_signature.is_single_complete_type() {
            return Err(Error::UnrepresentableDynamicValue(
                "array element signature must be a single complete type",
            ));
        }
        if items.iter().any(|item| item.signature() != element_signature) {
            return Err(Error::UnrepresentableDynamicValue(
                "array items do not share one signature",
            ));
        }
        Ok(Array {
            element_signature,
            items,
        })
    }

    /// Takes the element signature from the first item, so `items` must not
    /// be empty; use [`Array::empty`] for that.
    pub fn from_items(items: Vec<Value>) -> Result<Self> {
        let element_signature = items
            .first()
            .map(Value::signature)
            .ok_or(Error::UnrepresentableDynamicValue(
                "cannot infer the element signature of an empty array",
            ))?;
        Array::new(element_signature, items)
    }

    pub fn empty(element_signature: Signature) -> Result<Self> {
        Array::new(element_signature, Vec::new())
    }

    // Items decoded from the wire already share the wire's element signature.
    pub(crate) fn from_wire(element_signature: Signature, items: Vec<Value>) -> Self {
        Array {
            element_signature,
            items,
        }
    }

    pub fn element_signature(&self) -> &Signature {
        &self.element_signature
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

macro_rules! value_from {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Value::$variant(v)
            }
        }
    };
}

value_from!(u8, Byte);
value_from!(bool, Bool);
value_from!(i16, Int16);
value_from!(u16, UInt16);
value_from!(i32, Int32);
value_from!(u32, UInt32);
value_from!(i64, Int64);
value_from!(u64, UInt64);
value_from!(f64, Double);
value_from!(String, Str);
value_from!(ObjectPath, ObjectPath);
value_from!(Signature, Signature);
value_from!(Array, Array);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{Array, Value};
    use crate::error::{Error, Result};
    use crate::signature::Signature;

    #[test]
    fn array_must_be_homogeneous() -> Result<()> {
        assert_eq!(
            Array::from_items(vec![Value::Int32(1), Value::UInt32(2)]),
            Err(Error::UnrepresentableDynamicValue(
                "array items do not share one signature"
            ))
        );
        assert!(Array::from_items(vec![]).is_err());
        let empty = Array::empty(Signature::new("s")?)?;
        assert_eq!(Value::Array(empty).signature().as_str(), "as");
        assert!(Array::empty(Signature::new("ss")?).is_err());
        Ok(())
    }

    #[test]
    fn constructors() {
        assert_eq!(
            Value::dict_entry("k", 3u32),
            Value::DictEntry(
                Box::new(Value::Str("k".to_owned())),
                Box::new(Value::UInt32(3))
            )
        );
        assert_eq!(Value::variant(42i32).signature().as_str(), "v");
    }

    #[test]
    fn serializes_as_tagged_tree() -> Result<()> {
        let value = Value::Struct(vec![
            Value::Int32(1),
            Value::Array(Array::from_items(vec![Value::from("a")])?),
        ]);
        let json = serde_json::to_string(&value).expect("serializes");
        assert_eq!(
            json,
            r#"{"Struct":[{"Int32":1},{"Array":{"element_signature":"s","items":[{"Str":"a"}]}}]}"#
        );
        let back: Value = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, value);
        Ok(())
    }
}
