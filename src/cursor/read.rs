use crate::align::align;
use crate::error::{Error, Result};
use crate::policy::CursorPolicy;
use crate::primitives::{slice, DbusPrimitive};
use crate::signature::{self, complete_type_len};
use crate::wire_type::WireType;

use super::ContainerKind;

use byteorder::{ByteOrder, LE};
use log::trace;
use std::marker::PhantomData;
use std::str::from_utf8;

/// A read position within a message's arguments or within one container.
///
/// Reading the current value never moves the cursor; [`next`] does. A
/// sub-cursor from [`recurse`] borrows only the message, so it can be
/// dropped at any point without leaving the parent in an odd state, and the
/// parent's [`next`] skips the whole container regardless of how far the
/// sub-cursor got.
///
/// [`next`]: ReadCursor::next
/// [`recurse`]: ReadCursor::recurse
#[derive(Clone, Debug)]
pub struct ReadCursor<'a, B: ByteOrder = LE> {
    data: &'a [u8],
    // Reads never look past this; for arrays it is the end of the payload.
    limit: usize,
    // For arrays this is the element signature, repeated until `limit`.
    sig: &'a [u8],
    sig_ix: usize,
    pos: usize,
    kind: ContainerKind,
    exhausted: bool,
    depth: usize,
    policy: CursorPolicy,
    phantom: PhantomData<B>,
}

impl<'a, B: ByteOrder> ReadCursor<'a, B> {
    pub(crate) fn top_level(data: &'a [u8], sig: &'a [u8], policy: CursorPolicy) -> Result<Self> {
        signature::validate(sig, policy.max_depth)?;
        Ok(Self {
            data,
            limit: data.len(),
            sig,
            sig_ix: 0,
            pos: 0,
            kind: ContainerKind::TopLevel,
            exhausted: sig.is_empty(),
            depth: 0,
            policy,
            phantom: PhantomData,
        })
    }

    pub fn policy(&self) -> &CursorPolicy {
        &self.policy
    }

    /// Byte offset of the current value, before alignment padding.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn current(&self) -> Result<Option<&'a [u8]>> {
        if self.exhausted || self.sig_ix >= self.sig.len() {
            return Ok(None);
        }
        if self.kind == ContainerKind::Array && self.pos >= self.limit {
            return Ok(None);
        }
        let rest = &self.sig[self.sig_ix..];
        let len = complete_type_len(rest, self.kind == ContainerKind::Array)?;
        Ok(Some(&rest[..len]))
    }

    fn expect_current(&self) -> Result<&'a [u8]> {
        self.current()?
            .ok_or(Error::MalformedContainer("no value at cursor position"))
    }

    /// Signature of the value at the cursor, empty at the end.
    pub fn signature(&self) -> Result<&'a str> {
        Ok(from_utf8(self.current()?.unwrap_or(&[]))?)
    }

    /// The type of the value at the cursor, `Invalid` once nothing is left.
    pub fn arg_type(&self) -> Result<WireType> {
        match self.current()? {
            None => Ok(WireType::Invalid),
            Some(sig) => WireType::from_code(sig[0]),
        }
    }

    /// The type held by the array or variant at the cursor.
    pub fn element_type(&self) -> Result<WireType> {
        let sig = self.expect_current()?;
        match WireType::from_code(sig[0])? {
            WireType::Array => WireType::from_code(sig[1]),
            WireType::Variant => {
                let (inner, _) = self.variant_header(self.pos, self.depth + 1)?;
                WireType::from_code(inner[0])
            }
            _ => Err(Error::MalformedContainer(
                "element type of a value that is not an array or variant",
            )),
        }
    }

    pub(crate) fn expect(&self, expected: WireType) -> Result<()> {
        let found = self.arg_type()?;
        if found != expected {
            return Err(Error::type_mismatch(expected, found));
        }
        Ok(())
    }

    fn bounded(&self) -> &'a [u8] {
        &self.data[..self.limit]
    }

    pub fn get_basic<T: DbusPrimitive>(&self) -> Result<T> {
        self.expect(T::WIRE_TYPE)?;
        let start = align(self.pos, T::alignment());
        trace!("Read {} at {}", T::WIRE_TYPE, start);
        let (value, _) = T::deserialize::<B>(self.bounded(), start)?;
        Ok(value)
    }

    /// Byte length of the payload of the array at the cursor. Padding before
    /// the first element is not counted, so an empty array is exactly 0.
    pub fn array_length(&self) -> Result<usize> {
        self.expect(WireType::Array)?;
        let sig = self.expect_current()?;
        let (_, len) = self.array_payload(self.pos, sig[1])?;
        Ok(len)
    }

    fn array_payload(&self, pos: usize, element_code: u8) -> Result<(usize, usize)> {
        let length_ix = align(pos, 4);
        let len = B::read_u32(slice(self.bounded(), length_ix, 4)?) as usize;
        if len > self.policy.max_array_len {
            return Err(Error::ArrayTooLong(len, self.policy.max_array_len));
        }
        let start = align(length_ix + 4, WireType::from_code(element_code)?.alignment());
        if start + len > self.limit {
            return Err(Error::IndexOutOfBounds(start + len));
        }
        Ok((start, len))
    }

    // Returns the embedded signature and the offset of the value after it.
    // `depth` is the nesting level of the variant itself.
    fn variant_header(&self, pos: usize, depth: usize) -> Result<(&'a [u8], usize)> {
        let data = self.bounded();
        let len = slice(data, pos, 1)?[0] as usize;
        let sig = slice(data, pos + 1, len)?;
        if slice(data, pos + 1 + len, 1)?[0] != 0 {
            return Err(Error::MissingNulTerminator(pos + 1 + len));
        }
        let remaining_depth = self.policy.max_depth.saturating_sub(depth);
        signature::validate_single(sig, false, remaining_depth)?;
        Ok((sig, pos + len + 2))
    }

    fn child(&self, kind: ContainerKind, sig: &'a [u8], pos: usize, limit: usize) -> Self {
        Self {
            data: self.data,
            limit,
            sig,
            sig_ix: 0,
            pos,
            kind,
            exhausted: sig.is_empty() || (kind == ContainerKind::Array && pos >= limit),
            depth: self.depth + 1,
            policy: self.policy,
            phantom: PhantomData,
        }
    }

    /// A sub-cursor at the first element of the container at the cursor.
    pub fn recurse(&self) -> Result<ReadCursor<'a, B>> {
        let sig = self.expect_current()?;
        if self.depth + 1 > self.policy.max_depth {
            return Err(Error::NestingTooDeep(self.policy.max_depth));
        }
        let wire_type = WireType::from_code(sig[0])?;
        trace!("Recurse into {} at {}", wire_type, self.pos);
        match wire_type {
            WireType::Array => {
                let (start, len) = self.array_payload(self.pos, sig[1])?;
                Ok(self.child(ContainerKind::Array, &sig[1..], start, start + len))
            }
            WireType::Struct => Ok(self.child(
                ContainerKind::Struct,
                &sig[1..sig.len() - 1],
                align(self.pos, 8),
                self.limit,
            )),
            WireType::DictEntry => Ok(self.child(
                ContainerKind::DictEntry,
                &sig[1..sig.len() - 1],
                align(self.pos, 8),
                self.limit,
            )),
            WireType::Variant => {
                let (inner, start) = self.variant_header(self.pos, self.depth + 1)?;
                Ok(self.child(ContainerKind::Variant, inner, start, self.limit))
            }
            _ => Err(Error::MalformedContainer("recurse into a basic value")),
        }
    }

    /// Moves to the next sibling. Returns false, and stays at the end, once
    /// there is none.
    pub fn next(&mut self) -> Result<bool> {
        let sig = match self.current()? {
            Some(sig) => sig,
            None => {
                self.exhausted = true;
                return Ok(false);
            }
        };
        let end = self.value_end(self.pos, sig, self.depth)?;
        self.pos = end;
        if self.kind == ContainerKind::Array {
            if end >= self.limit {
                self.exhausted = true;
                return Ok(false);
            }
            return Ok(true);
        }
        self.sig_ix += sig.len();
        if self.sig_ix >= self.sig.len() {
            self.exhausted = true;
            return Ok(false);
        }
        Ok(true)
    }

    // `depth` is the nesting level the value sits at; each container inside
    // it counts against the same limit as `recurse`.
    fn value_end(&self, pos: usize, sig: &[u8], depth: usize) -> Result<usize> {
        let wire_type = WireType::from_code(sig[0])?;
        if wire_type.is_container() && depth + 1 > self.policy.max_depth {
            return Err(Error::NestingTooDeep(self.policy.max_depth));
        }
        let start = align(pos, wire_type.alignment());
        let data = self.bounded();
        let end = match wire_type {
            WireType::String | WireType::ObjectPath => {
                start + 4 + B::read_u32(slice(data, start, 4)?) as usize + 1
            }
            WireType::Signature => start + 1 + slice(data, start, 1)?[0] as usize + 1,
            WireType::Array => {
                let (payload, len) = self.array_payload(start, sig[1])?;
                payload + len
            }
            WireType::Struct | WireType::DictEntry => {
                let inner = &sig[1..sig.len() - 1];
                let mut ix = 0;
                let mut field_pos = start;
                while ix < inner.len() {
                    let len = complete_type_len(&inner[ix..], false)?;
                    field_pos = self.value_end(field_pos, &inner[ix..ix + len], depth + 1)?;
                    ix += len;
                }
                field_pos
            }
            WireType::Variant => {
                let (inner, value_pos) = self.variant_header(start, depth + 1)?;
                self.value_end(value_pos, inner, depth + 1)?
            }
            WireType::Invalid => {
                return Err(Error::MalformedContainer("no value at cursor position"))
            }
            fixed => start + fixed.fixed_size().unwrap_or(0),
        };
        if end > self.limit {
            return Err(Error::IndexOutOfBounds(end));
        }
        Ok(end)
    }
}
