use async_trait::async_trait;

use switchyard_core::{ChatType, Update, UpdateKind};

use crate::context::Context;
use crate::error::BoxError;
use crate::filter::Filter;
use crate::middlewares::UpdateContext;

/// Passes updates of the given kinds.
///
/// Mostly useful on the update-level observer or inside combinators, since
/// kind observers only ever see their own kind.
#[derive(Debug, Clone)]
pub struct KindFilter {
    kinds: Vec<UpdateKind>,
}

impl KindFilter {
    pub fn new(kind: UpdateKind) -> Self {
        Self { kinds: vec![kind] }
    }

    pub fn any_of(kinds: impl IntoIterator<Item = UpdateKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Filter for KindFilter {
    async fn check(&self, update: &Update, _ctx: &Context) -> Result<bool, BoxError> {
        Ok(self.kinds.contains(&update.kind()))
    }
}

/// Passes updates that happened in a chat of one of the given types.
///
/// Reads the [`UpdateContext`] published by the resolver. Without one, the
/// type is resolved from the update itself, which may leave it unknown; an
/// unknown type never passes.
#[derive(Debug, Clone)]
pub struct ChatTypeFilter {
    types: Vec<ChatType>,
}

impl ChatTypeFilter {
    pub fn new(types: impl IntoIterator<Item = ChatType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Filter for ChatTypeFilter {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        let resolved = ctx
            .update_context()
            .unwrap_or_else(|| UpdateContext::resolve(update));
        Ok(resolved.r#type.is_some_and(|t| self.types.contains(&t)))
    }
}
