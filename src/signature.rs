//! Signature strings: validation against the DBus type grammar, and
//! generation from dynamic values.
//!
//! A signature is a sequence of complete types. Basic types are a single
//! character; `a` is followed by one complete type; structs are bracketed
//! by `(` and `)` and must hold at least one field; dict entries are
//! bracketed by `{` and `}`, may only appear as an array element, and hold
//! exactly one basic key and one value.

use crate::error::{Error, Result};
use crate::value::Value;
use crate::wire_type::WireType;

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

pub(crate) const MAX_SIGNATURE_LEN: usize = 255;

/// Combined nesting of arrays, structs, dict entries and variants. One
/// counter covers all of them; arrays and structs are not limited separately.
pub(crate) const MAX_DEPTH: usize = 64;

/// A validated signature string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature(String);

impl Signature {
    pub fn new(sig: impl Into<String>) -> Result<Self> {
        let sig = sig.into();
        validate(sig.as_bytes(), MAX_DEPTH)?;
        Ok(Signature(sig))
    }

    // Only for strings assembled from signatures that were already valid.
    pub(crate) fn from_trusted(sig: String) -> Self {
        Signature(sig)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for signatures that can sit behind a variant or be an array element.
    pub fn is_single_complete_type(&self) -> bool {
        match complete_type_len(self.as_bytes(), true) {
            Ok(len) => len == self.len(),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Signature::new(s)
    }
}

impl TryFrom<String> for Signature {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Signature::new(s)
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> String {
        sig.0
    }
}

/// Validates a full signature, i.e. zero or more complete types.
pub(crate) fn validate(sig: &[u8], max_depth: usize) -> Result<()> {
    if sig.len() > MAX_SIGNATURE_LEN {
        return Err(Error::SignatureTooLong(sig.len()));
    }
    let mut ix = 0;
    while ix < sig.len() {
        ix = parse_complete_type(sig, ix, 0, max_depth, false)?;
    }
    Ok(())
}

/// Validates that `sig` is exactly one complete type. `in_array` permits a
/// dict entry at the top.
pub(crate) fn validate_single(sig: &[u8], in_array: bool, max_depth: usize) -> Result<()> {
    if sig.is_empty() {
        return Err(Error::MalformedContainer("empty signature"));
    }
    if sig.len() > MAX_SIGNATURE_LEN {
        return Err(Error::SignatureTooLong(sig.len()));
    }
    let end = parse_complete_type(sig, 0, 0, max_depth, in_array)?;
    if end != sig.len() {
        return Err(Error::MalformedContainer(
            "signature must be a single complete type",
        ));
    }
    Ok(())
}

/// Length of the complete type at the start of `sig`.
pub(crate) fn complete_type_len(sig: &[u8], in_array: bool) -> Result<usize> {
    parse_complete_type(sig, 0, 0, MAX_DEPTH, in_array)
}

fn parse_complete_type(
    sig: &[u8],
    start: usize,
    depth: usize,
    max_depth: usize,
    in_array: bool,
) -> Result<usize> {
    if depth > max_depth {
        return Err(Error::NestingTooDeep(max_depth));
    }
    let code = *sig
        .get(start)
        .ok_or(Error::MismatchedSignatureBracketing(start))?;
    match code {
        b'a' => parse_complete_type(sig, start + 1, depth + 1, max_depth, true),
        b'(' => {
            if sig.get(start + 1) == Some(&b')') {
                return Err(Error::MalformedContainer("struct has no fields"));
            }
            let mut ix = start + 1;
            loop {
                match sig.get(ix) {
                    None => return Err(Error::MismatchedSignatureBracketing(start)),
                    Some(b')') => return Ok(ix + 1),
                    Some(_) => ix = parse_complete_type(sig, ix, depth + 1, max_depth, false)?,
                }
            }
        }
        b'{' => {
            if !in_array {
                return Err(Error::MalformedContainer("dict entry outside of an array"));
            }
            let key = *sig
                .get(start + 1)
                .ok_or(Error::MismatchedSignatureBracketing(start))?;
            if !WireType::from_code(key)?.is_basic() {
                return Err(Error::MalformedContainer(
                    "dict entry key must be a basic type",
                ));
            }
            let value_end = parse_complete_type(sig, start + 2, depth + 1, max_depth, false)?;
            if sig.get(value_end) != Some(&b'}') {
                return Err(Error::MismatchedSignatureBracketing(start));
            }
            Ok(value_end + 1)
        }
        b')' | b'}' => Err(Error::MismatchedSignatureBracketing(start)),
        other => {
            WireType::from_code(other)?;
            Ok(start + 1)
        }
    }
}

/// The signature of a dynamic value.
///
/// This is what the variant and container encoders advertise when opening a
/// container, so it has to agree exactly with what the dynamic encoder then
/// writes. `Unit` has the empty signature.
pub fn signature_of(value: &Value) -> Signature {
    let mut out = String::new();
    push_signature(value, &mut out);
    Signature(out)
}

fn push_signature(value: &Value, out: &mut String) {
    match value {
        Value::Unit => {}
        Value::Byte(_) => out.push('y'),
        Value::Bool(_) => out.push('b'),
        Value::Int16(_) => out.push('n'),
        Value::UInt16(_) => out.push('q'),
        Value::Int32(_) => out.push('i'),
        Value::UInt32(_) => out.push('u'),
        Value::Int64(_) => out.push('x'),
        Value::UInt64(_) => out.push('t'),
        Value::Double(_) => out.push('d'),
        Value::Str(_) => out.push('s'),
        Value::ObjectPath(_) => out.push('o'),
        Value::Signature(_) => out.push('g'),
        Value::Array(array) => {
            out.push('a');
            out.push_str(array.element_signature().as_str());
        }
        Value::Struct(fields) => {
            out.push('(');
            for field in fields {
                push_signature(field, out);
            }
            out.push(')');
        }
        Value::DictEntry(key, value) => {
            out.push('{');
            push_signature(key, out);
            push_signature(value, out);
            out.push('}');
        }
        Value::Variant(_) => out.push('v'),
    }
}
