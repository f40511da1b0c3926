use super::Marshal;
use crate::cursor::{AppendCursor, ReadCursor};
use crate::error::{Error, Result};
use crate::policy::TrailingFields;
use crate::signature::Signature;
use crate::wire_type::WireType;

use byteorder::ByteOrder;
use std::collections::BTreeMap;

/// One key/value pair, `{KV}` on the wire. A dict is a `Vec` of these; keys
/// are not deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DictEntry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> DictEntry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        DictEntry { key, value }
    }
}

impl<K, V> From<(K, V)> for DictEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        DictEntry { key, value }
    }
}

fn array_signature(element: &Signature) -> Signature {
    Signature::from_trusted(format!("a{}", element))
}

fn dict_entry_signature<K: Marshal, V: Marshal>() -> Signature {
    Signature::from_trusted(format!("{{{}{}}}", K::signature(), V::signature()))
}

/// Decodes every element of the array at the cursor, in order.
///
/// An empty array is answered from its length alone; there is nothing to
/// recurse into.
fn decode_array_items<T, B, F>(cursor: &ReadCursor<'_, B>, mut each: F) -> Result<()>
where
    T: Marshal,
    B: ByteOrder,
    F: FnMut(T),
{
    cursor.expect(WireType::Array)?;
    let expected = array_signature(&T::signature());
    let found = cursor.signature()?;
    if found != expected.as_str() {
        return Err(Error::signature_mismatch(expected.as_bytes(), found.as_bytes()));
    }
    if cursor.array_length()? == 0 {
        return Ok(());
    }
    let mut items = cursor.recurse()?;
    loop {
        each(T::decode(&items)?);
        if !items.next()? {
            break;
        }
    }
    Ok(())
}

/// Field-by-field reader for structs and dict entries.
pub(crate) struct StructReader<'a, B: ByteOrder> {
    fields: ReadCursor<'a, B>,
    read: usize,
}

impl<'a, B: ByteOrder> StructReader<'a, B> {
    pub(crate) fn new(cursor: &ReadCursor<'a, B>, wire_type: WireType) -> Result<Self> {
        cursor.expect(wire_type)?;
        Ok(StructReader {
            fields: cursor.recurse()?,
            read: 0,
        })
    }

    pub(crate) fn field<T: Marshal>(&mut self) -> Result<T> {
        if self.read > 0 && !self.fields.next()? {
            return Err(Error::MalformedContainer(
                "struct has fewer fields than expected",
            ));
        }
        self.read += 1;
        T::decode(&self.fields)
    }

    pub(crate) fn finish(mut self) -> Result<()> {
        if self.fields.next()? && self.fields.policy().trailing_fields == TrailingFields::Reject {
            return Err(Error::MalformedContainer(
                "struct has more fields than expected",
            ));
        }
        Ok(())
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn signature() -> Signature {
        array_signature(&T::signature())
    }

    fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
        let element = T::signature();
        cursor.open_container(WireType::Array, Some(&element), |items| {
            for item in self {
                item.encode(items)?;
            }
            Ok(())
        })
    }

    fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
        let mut out = Vec::new();
        decode_array_items(cursor, |item| out.push(item))?;
        Ok(out)
    }
}

impl<K: Marshal, V: Marshal> Marshal for DictEntry<K, V> {
    fn signature() -> Signature {
        dict_entry_signature::<K, V>()
    }

    fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
        cursor.open_container(WireType::DictEntry, None, |entry| {
            self.key.encode(entry)?;
            self.value.encode(entry)
        })
    }

    fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
        let mut entry = StructReader::new(cursor, WireType::DictEntry)?;
        let key = entry.field()?;
        let value = entry.field()?;
        entry.finish()?;
        Ok(DictEntry { key, value })
    }
}

/// `a{KV}`. Later duplicates win when decoding; use `Vec<DictEntry<K, V>>`
/// to see every entry.
impl<K: Marshal + Ord, V: Marshal> Marshal for BTreeMap<K, V> {
    fn signature() -> Signature {
        array_signature(&dict_entry_signature::<K, V>())
    }

    fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
        let element = dict_entry_signature::<K, V>();
        cursor.open_container(WireType::Array, Some(&element), |entries| {
            for (key, value) in self {
                entries.open_container(WireType::DictEntry, None, |entry| {
                    key.encode(entry)?;
                    value.encode(entry)
                })?;
            }
            Ok(())
        })
    }

    fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
        let mut out = BTreeMap::new();
        decode_array_items(cursor, |entry: DictEntry<K, V>| {
            out.insert(entry.key, entry.value);
        })?;
        Ok(out)
    }
}

macro_rules! tuple_impls {
    ($($n:tt $name:ident)+) => {
        impl<$($name: Marshal),+> Marshal for ($($name,)+) {
            fn signature() -> Signature {
                let mut sig = String::from("(");
                $( sig.push_str(<$name as Marshal>::signature().as_str()); )+
                sig.push(')');
                Signature::from_trusted(sig)
            }

            fn encode<B: ByteOrder>(&self, cursor: &mut AppendCursor<'_, B>) -> Result<()> {
                cursor.open_container(WireType::Struct, None, |fields| {
                    $( self.$n.encode(fields)?; )+
                    Ok(())
                })
            }

            fn decode<B: ByteOrder>(cursor: &ReadCursor<'_, B>) -> Result<Self> {
                let mut fields = StructReader::new(cursor, WireType::Struct)?;
                let value = ($( fields.field::<$name>()?, )+);
                fields.finish()?;
                Ok(value)
            }
        }
    };
}

tuple_impls!(0 T0);
tuple_impls!(0 T0 1 T1);
tuple_impls!(0 T0 1 T1 2 T2);
tuple_impls!(0 T0 1 T1 2 T2 3 T3);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5 6 T6);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5 6 T6 7 T7);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5 6 T6 7 T7 8 T8);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5 6 T6 7 T7 8 T8 9 T9);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5 6 T6 7 T7 8 T8 9 T9 10 T10);
tuple_impls!(0 T0 1 T1 2 T2 3 T3 4 T4 5 T5 6 T6 7 T7 8 T8 9 T9 10 T10 11 T11);

#[cfg(test)]
mod tests {
    use super::DictEntry;
    use crate::error::{Error, Result};
    use crate::marshal::{from_message, from_message_with_policy, to_message, Marshal};
    use crate::message::Message;
    use crate::policy::CursorPolicy;
    use std::collections::BTreeMap;
    use std::fmt::Debug;
    use test_log::test;

    fn round_trip<T: Marshal + Debug + PartialEq>(val: T) -> Result<()> {
        let message = to_message(&val)?;
        assert_eq!(message.signature, T::signature().as_bytes());
        let val2: T = from_message(&message)?;
        assert_eq!(val, val2);
        Ok(())
    }

    #[test]
    fn round_trip_arrays() -> Result<()> {
        round_trip(vec![1i32, 3, 5, 6])?;
        round_trip(Vec::<i32>::new())?;
        round_trip(vec!["a".to_owned(), String::new(), "ccc".to_owned()])?;
        round_trip(vec![vec![1u64], vec![], vec![2, 3]])?;
        round_trip(vec![true, false])
    }

    #[test]
    fn serialize_intary() -> Result<()> {
        let message = to_message(&vec![1i32, 2, 3, 4])?;
        let correct_message = Message {
            data: vec![
                16u8, 0u8, 0u8, 0u8, 1u8, 0u8, 0u8, 0u8, 2u8, 0u8, 0u8, 0u8, 3u8, 0u8, 0u8, 0u8,
                4u8, 0u8, 0u8, 0u8,
            ],
            signature: "ai".as_bytes().to_vec(),
        };
        assert_eq!(
            correct_message, message,
            "array message serialized incorrectly"
        );
        Ok(())
    }

    #[test]
    fn empty_array_keeps_padding() -> Result<()> {
        let message = to_message(&Vec::<f64>::new())?;
        assert_eq!(message.data, vec![0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(from_message::<Vec<f64>>(&message)?, Vec::<f64>::new());
        Ok(())
    }

    #[test]
    fn empty_array_of_wrong_type() -> Result<()> {
        let message = to_message(&Vec::<u32>::new())?;
        assert_eq!(
            from_message::<Vec<i32>>(&message),
            Err(Error::SignatureMismatch {
                expected: "ai".to_owned(),
                found: "au".to_owned()
            })
        );
        Ok(())
    }

    #[test]
    fn round_trip_structs() -> Result<()> {
        round_trip((7u32, "seven".to_owned()))?;
        round_trip((
            1u8,
            true,
            -2i16,
            3u16,
            -4i32,
            5u32,
            "six".to_owned(),
            7.5f64,
        ))?;
        round_trip(("Hi".to_owned(), 0.2f64, ("Hello".to_owned(), 8.3f64)))
    }

    #[test]
    fn serialize_tuple() -> Result<()> {
        let data = ("Hi".to_owned(), 0.2f64, ("Hello".to_owned(), 8.3f64));
        let message = to_message(&data)?;
        let correct_message = Message {
            data: vec![
                2u8, 0u8, 0u8, 0u8, 72u8, 105u8, 0u8, 0u8, 154u8, 153u8, 153u8, 153u8, 153u8,
                153u8, 201u8, 63u8, 5u8, 0u8, 0u8, 0u8, 72u8, 101u8, 108u8, 108u8, 111u8, 0u8, 0u8,
                0u8, 0u8, 0u8, 0u8, 0u8, 154u8, 153u8, 153u8, 153u8, 153u8, 153u8, 32u8, 64u8,
            ],
            signature: "(sd(sd))".as_bytes().to_vec(),
        };
        assert_eq!(
            correct_message, message,
            "struct message serialized incorrectly"
        );
        Ok(())
    }

    #[test]
    fn struct_arity() -> Result<()> {
        let message = to_message(&(1i32, 2i32, 3i32))?;
        assert_eq!(
            from_message::<(i32, i32)>(&message),
            Err(Error::MalformedContainer(
                "struct has more fields than expected"
            ))
        );
        let lenient: (i32, i32) = from_message_with_policy(&message, CursorPolicy::lenient())?;
        assert_eq!(lenient, (1, 2));

        let short = to_message(&(1i32,))?;
        assert_eq!(
            from_message::<(i32, i32)>(&short),
            Err(Error::MalformedContainer(
                "struct has fewer fields than expected"
            ))
        );
        Ok(())
    }

    #[test]
    fn round_trip_dict_entries() -> Result<()> {
        let entries = vec![
            DictEntry::new("a".to_owned(), 1u32),
            DictEntry::new("b".to_owned(), 2u32),
            DictEntry::new("a".to_owned(), 3u32),
        ];
        let message = to_message(&entries)?;
        assert_eq!(message.signature, b"a{su}".to_vec());
        let decoded: Vec<DictEntry<String, u32>> = from_message(&message)?;
        assert_eq!(decoded, entries);

        let map: BTreeMap<String, u32> = from_message(&message)?;
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], 3);
        Ok(())
    }

    #[test]
    fn round_trip_map() -> Result<()> {
        let mut map = BTreeMap::new();
        map.insert(1u8, vec!["x".to_owned()]);
        map.insert(2u8, vec![]);
        round_trip(map)
    }

    #[test]
    fn lone_dict_entry_is_rejected() {
        assert_eq!(
            to_message(&DictEntry::new(1u32, 2u32)),
            Err(Error::MalformedContainer("dict entry outside of an array"))
        );
    }

    #[test]
    fn dict_entry_key_must_be_basic() {
        assert_eq!(
            to_message(&vec![DictEntry::new((1u32,), 2u32)]),
            Err(Error::MalformedContainer(
                "dict entry key must be a basic type"
            ))
        );
    }
}
