use std::error::Error as StdError;
use std::marker::PhantomData;

use async_trait::async_trait;

use switchyard_core::Update;

use crate::context::Context;
use crate::dispatcher::ErrorEvent;
use crate::error::BoxError;
use crate::filter::Filter;

/// Matches errors of type `E` on error observers.
///
/// Never passes outside error routing, where no [`ErrorEvent`] exists.
///
/// ```rust,ignore
/// dp.error()
///     .with(ExceptionTypeFilter::<ApiError>::new())
///     .handler(on_api_error);
/// ```
pub struct ExceptionTypeFilter<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: StdError + 'static> ExceptionTypeFilter<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E: StdError + 'static> Default for ExceptionTypeFilter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ExceptionTypeFilter<E> {
    fn clone(&self) -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for ExceptionTypeFilter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionTypeFilter")
            .field("type", &std::any::type_name::<E>())
            .finish()
    }
}

#[async_trait]
impl<E: StdError + 'static> Filter for ExceptionTypeFilter<E> {
    async fn check(&self, _update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        Ok(ctx
            .get::<ErrorEvent>()
            .is_some_and(|event| event.error.is::<E>()))
    }
}

/// Matches errors whose message contains a substring.
#[derive(Debug, Clone)]
pub struct ExceptionMessageFilter {
    needle: String,
}

impl ExceptionMessageFilter {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

#[async_trait]
impl Filter for ExceptionMessageFilter {
    async fn check(&self, _update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        Ok(ctx
            .get::<ErrorEvent>()
            .is_some_and(|event| event.error.to_string().contains(&self.needle)))
    }
}
