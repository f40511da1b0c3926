use crate::signature::MAX_DEPTH;

/// DBus caps a single array at 64 MiB.
pub const MAX_ARRAY_LEN: usize = 1 << 26;

/// What a struct decode does when the wire holds more fields than the
/// target type declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrailingFields {
    Reject,
    Ignore,
}

/// Limits and strictness carried by every cursor, and inherited by the
/// sub-cursors it creates.
///
/// The default rejects trailing struct fields. [`CursorPolicy::lenient`]
/// ignores them, which is what a decoder reading newer peers that grew extra
/// fields may want.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorPolicy {
    pub trailing_fields: TrailingFields,
    pub max_depth: usize,
    pub max_array_len: usize,
}

impl Default for CursorPolicy {
    fn default() -> Self {
        CursorPolicy {
            trailing_fields: TrailingFields::Reject,
            max_depth: MAX_DEPTH,
            max_array_len: MAX_ARRAY_LEN,
        }
    }
}

impl CursorPolicy {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        CursorPolicy {
            trailing_fields: TrailingFields::Ignore,
            ..Self::default()
        }
    }
}
