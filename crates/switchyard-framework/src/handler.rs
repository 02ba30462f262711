//! Handler system for the Switchyard framework.
//!
//! Handlers are plain async functions. Every parameter is extracted from the
//! [`Context`] through [`FromContext`], and the return value is converted
//! through [`IntoOutcome`], similar to Axum's handler system.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_framework::prelude::*;
//!
//! // No parameters, handled with no value
//! async fn ping() {}
//!
//! // Typed payload plus the bot
//! async fn greet(event: Event<BotStarted>, bot: BoxedBot) -> Result<String, ApiError> {
//!     let chat = bot.get_chat(event.chat_id).await?;
//!     Ok(format!("welcome to {:?}", chat.title))
//! }
//!
//! // Declining lets sibling routers try
//! async fn only_admins(user: EventFromUser) -> Outcome {
//!     if user.user_id == ADMIN { Outcome::handled() } else { Outcome::Unhandled }
//! }
//! ```
//!
//! A parameter that cannot be extracted fails the handler with an
//! [`ExtractError`](crate::ExtractError), which is routed to the error
//! observers. Wrap it in `Option<T>` to make it optional.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::extractor::FromContext;
use crate::outcome::{HandlerResult, IntoOutcome};

pub use futures::future::BoxFuture;

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for update handlers.
///
/// Implemented automatically for async functions and closures that take up
/// to 16 [`FromContext`] parameters and return an [`IntoOutcome`] value.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler with the given context.
    async fn call(self, ctx: Context) -> HandlerResult;
}

// ============================================================================
// BoxedHandler - Type-erased handler stored in observers
// ============================================================================

/// A type-erased handler.
///
/// Internally a closure that captures the original handler and calls a
/// clone of it on each invocation.
pub type BoxedHandler = Arc<dyn Fn(Context) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoOutcome + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Context) -> HandlerResult {
                $(
                    let $ty = $ty::from_context(&ctx)?;
                )*

                (self)($($ty,)*).await.into_outcome()
            }
        }
    };
}

// Generate implementations for 0-16 parameters
impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15
);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16
);
