//! Handler outcomes.
//!
//! Every routing layer returns a [`HandlerResult`]. `Ok(Outcome::Unhandled)`
//! means no handler accepted the update, which is different from a handler
//! that ran and produced nothing (`Ok(Outcome::Handled(Value::Null))`).

use serde::Serialize;
use serde_json::Value;

use crate::error::BoxError;

/// The result of routing an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A handler accepted the update and returned this value.
    Handled(Value),
    /// No handler accepted the update.
    Unhandled,
}

impl Outcome {
    /// A handled outcome with no value.
    pub fn handled() -> Self {
        Self::Handled(Value::Null)
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }

    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unhandled)
    }

    /// Returns the handler's value, if handled.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Handled(value) => Some(value),
            Self::Unhandled => None,
        }
    }

    /// Consumes the outcome, returning the handler's value, if handled.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Handled(value) => Some(value),
            Self::Unhandled => None,
        }
    }
}

/// Result of a handler, middleware or routing layer.
pub type HandlerResult = Result<Outcome, BoxError>;

/// Conversion from handler return values into a [`HandlerResult`].
///
/// # Implementations
///
/// - `()` → handled with no value
/// - [`Outcome`] → passed through, so a handler can decline with
///   [`Outcome::Unhandled`]
/// - `String`, `&'static str`, `bool`, integers, [`Value`] → handled with
///   that value
/// - [`Json<T>`] → handled with `T` serialized
/// - `Option<T>` → `None` is handled with no value
/// - `Result<T, E>` → `Err` becomes a routing error
pub trait IntoOutcome: Send {
    fn into_outcome(self) -> HandlerResult;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> HandlerResult {
        Ok(Outcome::handled())
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoOutcome for Value {
    fn into_outcome(self) -> HandlerResult {
        Ok(Outcome::Handled(self))
    }
}

macro_rules! impl_into_outcome_via_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOutcome for $ty {
                fn into_outcome(self) -> HandlerResult {
                    Ok(Outcome::Handled(Value::from(self)))
                }
            }
        )*
    };
}

impl_into_outcome_via_value!(String, &'static str, bool, i32, i64, u32, u64, usize);

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> HandlerResult {
        match self {
            Some(value) => value.into_outcome(),
            None => Ok(Outcome::handled()),
        }
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError> + Send,
{
    fn into_outcome(self) -> HandlerResult {
        match self {
            Ok(value) => value.into_outcome(),
            Err(err) => Err(err.into()),
        }
    }
}

/// Wraps any serializable value as a handler return.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize + Send> IntoOutcome for Json<T> {
    fn into_outcome(self) -> HandlerResult {
        Ok(Outcome::Handled(serde_json::to_value(self.0)?))
    }
}
