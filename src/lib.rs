//! Marshalling of DBus message arguments.
//!
//! This crate turns typed values into the DBus wire format and back. It
//! covers the argument body only: the bytes and their signature. Headers,
//! framing and the transport belong to whatever sends the message.
//!
//! Values go on and off the wire through cursors. A [`ReadCursor`] walks the
//! arguments of a [`Message`] without consuming them; an [`AppendCursor`]
//! writes new arguments to its end, and writes containers through closures
//! so that a container is always closed, or rolled back, when its closure
//! returns.
//!
//! On top of the cursors there are two codecs:
//!
//! - The static codec in [`marshal`], for types whose shape is known at
//!   compile time. Scalars, `Vec`, tuples, [`DictEntry`], `BTreeMap` and
//!   [`Variant`] implement [`Marshal`], and [`to_message`] and
//!   [`from_message`] marshal one of them as a whole message body.
//! - The dynamic codec in [`dynamic`], for [`Value`] trees whose shape is
//!   only known at run time.
//!
//! How strictly a cursor treats its input is configured with a
//! [`CursorPolicy`].
//!
//! [`ReadCursor`]: crate::cursor::ReadCursor
//! [`AppendCursor`]: crate::cursor::AppendCursor
//! [`Message`]: crate::message::Message
//! [`marshal`]: crate::marshal
//! [`dynamic`]: crate::dynamic
//! [`Marshal`]: crate::marshal::Marshal
//! [`DictEntry`]: crate::marshal::DictEntry
//! [`Variant`]: crate::variant::Variant
//! [`Value`]: crate::value::Value
//! [`to_message`]: crate::marshal::to_message()
//! [`from_message`]: crate::marshal::from_message()
//! [`CursorPolicy`]: crate::policy::CursorPolicy

mod align;
pub mod cursor;
pub mod dynamic;
pub mod error;
pub mod marshal;
pub mod message;
pub mod policy;
mod primitives;
pub mod signature;
pub mod value;
pub mod variant;
pub mod wire_type;

pub use cursor::{AppendCursor, ReadCursor};
pub use error::{Error, Result};
pub use marshal::{from_message, to_message, DictEntry, Marshal};
pub use message::Message;
pub use policy::{CursorPolicy, TrailingFields};
pub use primitives::{DbusPrimitive, ObjectPath};
pub use signature::Signature;
pub use value::{Array, Value};
pub use variant::Variant;
pub use wire_type::WireType;
