//! Create-or-resolve of nested entities, and per-id batch deletion.
//!
//! Resolution attempts an insert first. Only when the insert conflicts does
//! it fall back, once each, to a lookup by id and then to a lookup by natural
//! key. There are no retries and no surrounding transaction.

use std::future::Future;

use async_trait::async_trait;
use books_http::{Code, Outcome, Status};

use super::models::IdList;
use crate::utils::format_ids;

/// An entity that can be created, fetched by id and found by natural key.
#[async_trait]
pub trait Resolve: Send + Sync {
    type Entity: Send + Sync;

    async fn try_insert(&self, entity: &Self::Entity) -> Outcome<Self::Entity>;

    async fn try_get_by_id(&self, id: i32) -> Outcome<Self::Entity>;

    async fn try_find(&self, entity: &Self::Entity) -> Outcome<Self::Entity>;

    fn id_of(entity: &Self::Entity) -> i32;
}

/// Resolve `entity` to the id of a stored row, creating it when possible.
///
/// A non-conflict insert failure is returned as is. When neither lookup
/// succeeds the natural-key lookup's status is returned.
pub async fn resolve<R>(resolver: &R, entity: &R::Entity) -> Result<i32, Status>
where
    R: Resolve + ?Sized,
{
    let conflict = match resolver.try_insert(entity).await.into_result() {
        Ok(Some(created)) => return Ok(R::id_of(&created)),
        Ok(None) => return Err(Status::internal("insert returned no row")),
        Err(status) if status.code() != Code::Conflict => return Err(status),
        Err(status) => status,
    };

    tracing::debug!(conflict = %conflict, "insert conflicted, resolving existing row");

    if let Ok(Some(existing)) = resolver.try_get_by_id(R::id_of(entity)).await.into_result() {
        return Ok(R::id_of(&existing));
    }

    match resolver.try_find(entity).await.into_result()? {
        Some(found) => Ok(R::id_of(&found)),
        None => Err(conflict),
    }
}

/// Delete every id in turn, collecting the ones that were not removed.
///
/// Deletion is not atomic: one miss never stops the rest. All removed gives
/// `204` with no value; otherwise `200` with a message and the misses, in
/// input order.
pub async fn delete_each<F, Fut>(ids: &[i32], plural: &str, mut delete: F) -> Outcome<IdList>
where
    F: FnMut(i32) -> Fut,
    Fut: Future<Output = Status>,
{
    let mut not_found = Vec::new();
    for &id in ids {
        if delete(id).await.code() != Code::NoContent {
            not_found.push(id);
        }
    }

    if not_found.is_empty() {
        return Status::no_content().into();
    }

    let message = format!(
        "The following {plural} could not be found: {}",
        format_ids(&not_found)
    );
    tracing::info!(missing = not_found.len(), "{message}");
    Outcome::new(Status::ok(message), Some(IdList { ids: not_found }))
}
