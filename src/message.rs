use crate::cursor::{AppendCursor, ReadCursor};
use crate::error::Result;
use crate::policy::CursorPolicy;
use crate::signature::Signature;

use byteorder::{ByteOrder, LE};
use std::str::from_utf8;

/// The argument body of a DBus message: the marshalled arguments and their
/// signature. Header fields and framing belong to the envelope layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature(&self) -> Result<Signature> {
        Signature::new(from_utf8(&self.signature)?)
    }

    /// A cursor at the first argument. It reports `Invalid` straight away
    /// for a message without arguments.
    pub fn read_cursor(&self) -> Result<ReadCursor<'_, LE>> {
        self.read_cursor_with_policy(CursorPolicy::default())
    }

    pub fn read_cursor_with_policy<B: ByteOrder>(
        &self,
        policy: CursorPolicy,
    ) -> Result<ReadCursor<'_, B>> {
        ReadCursor::top_level(&self.data, &self.signature, policy)
    }

    /// A cursor appending after the last argument.
    pub fn append_cursor(&mut self) -> AppendCursor<'_, LE> {
        self.append_cursor_with_policy(CursorPolicy::default())
    }

    pub fn append_cursor_with_policy<B: ByteOrder>(
        &mut self,
        policy: CursorPolicy,
    ) -> AppendCursor<'_, B> {
        AppendCursor::top_level(&mut self.data, &mut self.signature, policy)
    }
}
