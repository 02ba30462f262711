//! Built-in filters.
//!
//! | Filter | Passes when | Stashes |
//! |--------|-------------|---------|
//! | [`KindFilter`] | the update is of one of the given kinds | |
//! | [`ChatTypeFilter`] | the update happened in a chat of one of the given types | |
//! | [`Command`] | a message starts with one of the given commands | [`CommandObject`] |
//! | [`CommandStart`] | a message is a `/start` command, with an optionally base64-encoded payload | [`CommandObject`], [`Deeplink`] |
//! | [`DeeplinkFilter`] | a `bot_started` update carries a payload | [`Deeplink`] |
//! | [`ExceptionTypeFilter`] | the routed error has the given type | |
//! | [`ExceptionMessageFilter`] | the routed error's message contains a substring | |
//!
//! Stashed values can be taken as handler parameters.

mod command;
mod deeplink;
mod exception;
mod kind;

pub use command::{Command, CommandError, CommandObject, CommandStart};
pub use deeplink::{Deeplink, DeeplinkError, DeeplinkFilter, decode_payload, encode_payload};
pub use exception::{ExceptionMessageFilter, ExceptionTypeFilter};
pub use kind::{ChatTypeFilter, KindFilter};
