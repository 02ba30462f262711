//! # Switchyard Framework
//!
//! Update routing for bots: a tree of [`Router`]s, one [`Observer`] per
//! update kind on every router, filters that pick a handler, and outer/inner
//! middleware chains wrapped around the whole thing.
//!
//! This layer provides:
//! - [`Filter`] predicates with `and`/`or`/`not` combinators and built-ins
//! - [`Middleware`] chains with explicit [`Next`] continuation
//! - [`Router`] trees with cycle-checked [`Router::include`]
//! - [`Dispatcher`], the root router with error routing and the
//!   [`UpdateContextMiddleware`] preinstalled
//! - Axum-style [`Handler`]s with [`FromContext`] parameter injection
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_framework::prelude::*;
//!
//! async fn start(event: Event<MessageCreated>) -> String {
//!     format!("hello, {}", event.message.sender.as_ref().map_or("stranger", |u| &u.first_name))
//! }
//!
//! let dp = Dispatcher::new();
//! dp.message_created().with(CommandStart::new()).handler(start);
//!
//! let outcome = dp.feed_update(update, Some(bot)).await?;
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod filters;
pub mod handler;
pub mod middleware;
pub mod middlewares;
pub mod observer;
pub mod outcome;
pub mod router;

pub use context::{Context, EnrichUpdateContext, EventChat, EventFromUser};
pub use dispatcher::{Dispatcher, ErrorEvent};
pub use error::{
    BoxError, DispatchError, ExtractError, ExtractResult, RoutingError, SharedError,
};
pub use extractor::{Event, Extension, FromContext};
pub use filter::{
    AsyncFilterFn, BoxedFilter, Filter, FilterExt, FilterFn, all, any, async_filter_fn,
    filter_fn,
};
pub use filters::{
    ChatTypeFilter, Command, CommandError, CommandObject, CommandStart, Deeplink, DeeplinkError,
    DeeplinkFilter, ExceptionMessageFilter, ExceptionTypeFilter, KindFilter, decode_payload,
    encode_payload,
};
pub use handler::{BoxFuture, BoxedHandler, Handler, into_handler};
pub use middleware::{BoxedMiddleware, Middleware, MiddlewareFn, Next, middleware_fn};
pub use middlewares::{UpdateContext, UpdateContextMiddleware};
pub use observer::{Observer, Registration, UpdateObserver};
pub use outcome::{HandlerResult, IntoOutcome, Json, Outcome};
pub use router::Router;

/// Everything a bot author usually needs.
pub mod prelude {
    pub use crate::{
        ChatTypeFilter, Command, CommandObject, CommandStart, Context, Deeplink, DeeplinkFilter,
        Dispatcher, ErrorEvent, Event, EventChat, EventFromUser, ExceptionMessageFilter,
        ExceptionTypeFilter, Extension, Filter, FilterExt, HandlerResult, Json, KindFilter,
        Middleware, Next, Outcome, Router, UpdateContext, UpdateContextMiddleware, filter_fn,
        middleware_fn,
    };
    pub use switchyard_core::{
        BotAdded, BotRemoved, BotStarted, BotStopped, BoxedBot, Chat, ChatTitleChanged,
        ChatType, DialogCleared, DialogMuted, DialogRemoved, DialogUnmuted, MessageCallback,
        MessageChatCreated, MessageCreated, MessageEdited, MessageRemoved, Update, UpdateKind, User, UserAdded,
        UserRemoved,
    };
}
