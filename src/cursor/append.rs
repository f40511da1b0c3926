use crate::align::padding;
use crate::error::{Error, Result};
use crate::policy::CursorPolicy;
use crate::primitives::DbusPrimitive;
use crate::signature::{self, complete_type_len, Signature, MAX_SIGNATURE_LEN};
use crate::wire_type::WireType;

use super::ContainerKind;

use byteorder::{ByteOrder, LE};
use log::{debug, trace};
use std::marker::PhantomData;

/// A write position at the end of a message's arguments, or inside a
/// container being written.
///
/// Every value appended also appends its signature to the enclosing level:
/// the message signature at the top, the container's own signature inside
/// structs, dict entries and variants. Inside an array each element's
/// signature is compared against the element signature instead.
pub struct AppendCursor<'a, B: ByteOrder = LE> {
    data: &'a mut Vec<u8>,
    signature: &'a mut Vec<u8>,
    element_signature: Option<&'a [u8]>,
    kind: ContainerKind,
    depth: usize,
    policy: CursorPolicy,
    phantom: PhantomData<B>,
}

impl<'a, B: ByteOrder> AppendCursor<'a, B> {
    pub(crate) fn top_level(
        data: &'a mut Vec<u8>,
        signature: &'a mut Vec<u8>,
        policy: CursorPolicy,
    ) -> Self {
        Self {
            data,
            signature,
            element_signature: None,
            kind: ContainerKind::TopLevel,
            depth: 0,
            policy,
            phantom: PhantomData,
        }
    }

    pub fn policy(&self) -> &CursorPolicy {
        &self.policy
    }

    pub fn is_top_level(&self) -> bool {
        self.kind == ContainerKind::TopLevel
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        self.data
            .try_reserve(additional)
            .map_err(|_| Error::OutOfMemory(additional))
    }

    fn align_writer(&mut self, alignment: usize) -> Result<()> {
        let pad = padding(self.data.len(), alignment);
        self.reserve(pad)?;
        let new_len = self.data.len() + pad;
        self.data.resize(new_len, 0);
        Ok(())
    }

    fn prepare_write(&mut self, size: usize) -> Result<&mut [u8]> {
        self.reserve(size)?;
        let old_len = self.data.len();
        self.data.resize(old_len + size, 0);
        Ok(&mut self.data[old_len..])
    }

    fn push_signature(&mut self, sig: &[u8]) -> Result<()> {
        if let Some(element) = self.element_signature {
            if sig != element {
                return Err(Error::signature_mismatch(element, sig));
            }
            return Ok(());
        }
        let new_len = self.signature.len() + sig.len();
        if new_len > MAX_SIGNATURE_LEN {
            return Err(Error::SignatureTooLong(new_len));
        }
        self.signature.extend_from_slice(sig);
        Ok(())
    }

    pub fn put_basic<T: DbusPrimitive>(&mut self, value: &T) -> Result<()> {
        let mark = self.data.len();
        let result = self.write_basic(value);
        if result.is_err() {
            self.data.truncate(mark);
        }
        result
    }

    fn write_basic<T: DbusPrimitive>(&mut self, value: &T) -> Result<()> {
        self.align_writer(T::alignment())?;
        trace!("Write {} at {}", T::WIRE_TYPE, self.data.len());
        value.serialize::<B>(self.prepare_write(value.size())?)?;
        self.push_signature(&[T::SIGNATURE])
    }

    /// Writes one container. `body` appends the contents through the
    /// sub-cursor it is given; the container is closed when `body` returns.
    ///
    /// Arrays take the element signature and variants the signature of the
    /// value they hold. Structs and dict entries describe themselves, so any
    /// signature passed for them is ignored.
    ///
    /// If `body` fails, or what it wrote does not match the container's
    /// signature, everything written since the container was opened is
    /// truncated away before the error is returned.
    pub fn open_container<T, F>(
        &mut self,
        wire_type: WireType,
        signature: Option<&Signature>,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut AppendCursor<'_, B>) -> Result<T>,
    {
        if self.depth + 1 > self.policy.max_depth {
            return Err(Error::NestingTooDeep(self.policy.max_depth));
        }
        let mark = self.data.len();
        let result = self.write_container(wire_type, signature, body);
        if result.is_err() {
            debug!("Rolling back {} opened at {}", wire_type, mark);
            self.data.truncate(mark);
        }
        result
    }

    fn write_container<T, F>(
        &mut self,
        wire_type: WireType,
        signature: Option<&Signature>,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut AppendCursor<'_, B>) -> Result<T>,
    {
        let remaining_depth = self.policy.max_depth - self.depth - 1;
        match wire_type {
            WireType::Array => {
                let element = signature
                    .ok_or(Error::MalformedContainer("array without an element signature"))?
                    .as_bytes();
                signature::validate_single(element, true, remaining_depth)?;
                self.align_writer(4)?;
                let length_ix = self.data.len();
                self.prepare_write(4)?;
                self.align_writer(WireType::from_code(element[0])?.alignment())?;
                let start = self.data.len();
                trace!("Open array of '{}' at {}", String::from_utf8_lossy(element), start);

                let mut unused = Vec::new();
                let value = body(&mut self.child(ContainerKind::Array, &mut unused, Some(element)))?;

                let len = self.data.len() - start;
                if len > self.policy.max_array_len {
                    return Err(Error::ArrayTooLong(len, self.policy.max_array_len));
                }
                B::write_u32(&mut self.data[length_ix..length_ix + 4], len as u32);
                let mut sig = Vec::with_capacity(element.len() + 1);
                sig.push(b'a');
                sig.extend_from_slice(element);
                self.push_signature(&sig)?;
                Ok(value)
            }
            WireType::Struct | WireType::DictEntry => {
                let (kind, open, close) = if wire_type == WireType::Struct {
                    (ContainerKind::Struct, b'(', b')')
                } else {
                    (ContainerKind::DictEntry, b'{', b'}')
                };
                if kind == ContainerKind::DictEntry && self.kind != ContainerKind::Array {
                    return Err(Error::MalformedContainer("dict entry outside of an array"));
                }
                self.align_writer(8)?;
                trace!("Open {} at {}", wire_type, self.data.len());

                let mut written = Vec::new();
                let value = body(&mut self.child(kind, &mut written, None))?;

                if kind == ContainerKind::Struct {
                    if written.is_empty() {
                        return Err(Error::MalformedContainer("struct has no fields"));
                    }
                } else {
                    check_dict_entry(&written)?;
                }
                let mut sig = Vec::with_capacity(written.len() + 2);
                sig.push(open);
                sig.extend_from_slice(&written);
                sig.push(close);
                self.push_signature(&sig)?;
                Ok(value)
            }
            WireType::Variant => {
                let inner = signature
                    .ok_or(Error::MalformedContainer("variant without a signature"))?
                    .as_bytes();
                signature::validate_single(inner, false, remaining_depth)?;
                trace!(
                    "Open variant of '{}' at {}",
                    String::from_utf8_lossy(inner),
                    self.data.len()
                );
                let header = self.prepare_write(inner.len() + 2)?;
                header[0] = inner.len() as u8;
                header[1..=inner.len()].copy_from_slice(inner);
                header[inner.len() + 1] = 0u8;

                let mut written = Vec::new();
                let value = body(&mut self.child(ContainerKind::Variant, &mut written, None))?;

                if written != inner {
                    return Err(Error::signature_mismatch(inner, &written));
                }
                self.push_signature(b"v")?;
                Ok(value)
            }
            _ => Err(Error::MalformedContainer("open container on a basic type")),
        }
    }

    fn child<'b>(
        &'b mut self,
        kind: ContainerKind,
        signature: &'b mut Vec<u8>,
        element_signature: Option<&'b [u8]>,
    ) -> AppendCursor<'b, B> {
        AppendCursor {
            data: &mut *self.data,
            signature,
            element_signature,
            kind,
            depth: self.depth + 1,
            policy: self.policy,
            phantom: PhantomData,
        }
    }
}

fn check_dict_entry(written: &[u8]) -> Result<()> {
    if written.is_empty() {
        return Err(Error::MalformedContainer("dict entry has no key"));
    }
    if !WireType::from_code(written[0])?.is_basic() {
        return Err(Error::MalformedContainer(
            "dict entry key must be a basic type",
        ));
    }
    if written.len() < 2 || 1 + complete_type_len(&written[1..], false)? != written.len() {
        return Err(Error::MalformedContainer(
            "dict entry must hold exactly one key and one value",
        ));
    }
    Ok(())
}
