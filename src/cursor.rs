//! Positions within a message's argument stream.
//!
//! A [`ReadCursor`] walks the arguments of an inbound message and the
//! contents of its containers. An [`AppendCursor`] writes arguments into an
//! outbound message; containers are written through
//! [`AppendCursor::open_container`], which hands a sub-cursor to a closure and
//! closes the container when the closure returns, whether it succeeded or not.
//!
//! Both cursors are generic over the byte order, little endian by default.
//! Padding and alignment are handled here; the codecs above only ever see
//! whole values.

mod append;
mod read;

pub use append::AppendCursor;
pub use read::ReadCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    TopLevel,
    Array,
    Struct,
    DictEntry,
    Variant,
}
