//! JSON resource endpoints shared by every routed catalog entity.
//!
//! | Method | Path    | Action       |
//! |--------|---------|--------------|
//! | GET    | `/`     | list         |
//! | POST   | `/`     | create       |
//! | DELETE | `/`     | batch delete |
//! | GET    | `/{id}` | get          |
//! | PATCH  | `/{id}` | update       |
//! | DELETE | `/{id}` | delete       |

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use books_http::{Outcome, Status};
use serde::{de::DeserializeOwned, Serialize};

use super::author::AuthorResolver;
use super::models::{Author, AuthorPatch, IdList, Publication, PublicationPatch, Work, WorkPatch};
use super::publication::PublicationManager;
use super::work::WorkResolver;

/// A catalog entity served over HTTP.
#[async_trait]
pub trait Resource: Clone + Send + Sync + 'static {
    type Entity: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Patch: DeserializeOwned + Send + 'static;

    async fn list(&self) -> Outcome<Vec<Self::Entity>>;
    async fn get(&self, id: i32) -> Outcome<Self::Entity>;
    async fn create(&self, entity: &Self::Entity) -> Outcome<Self::Entity>;
    async fn update(&self, id: i32, patch: Self::Patch) -> Outcome<Self::Entity>;
    async fn delete(&self, id: i32) -> Status;
    async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList>;
}

pub fn router<R: Resource>(resource: R) -> Router {
    Router::new()
        .route(
            "/",
            get(list::<R>).post(create::<R>).delete(batch_delete::<R>),
        )
        .route(
            "/{id}",
            get(get_one::<R>).patch(update::<R>).delete(delete_one::<R>),
        )
        .with_state(resource)
}

async fn list<R: Resource>(State(resource): State<R>) -> Outcome<Vec<R::Entity>> {
    resource.list().await
}

async fn create<R: Resource>(
    State(resource): State<R>,
    Json(entity): Json<R::Entity>,
) -> Outcome<R::Entity> {
    resource.create(&entity).await
}

/// `200` with the ids that were not found, `204` when all were removed.
async fn batch_delete<R: Resource>(
    State(resource): State<R>,
    Json(body): Json<IdList>,
) -> Outcome<IdList> {
    resource.batch_delete(&body.ids).await
}

async fn get_one<R: Resource>(
    State(resource): State<R>,
    Path(id): Path<i32>,
) -> Outcome<R::Entity> {
    resource.get(id).await
}

async fn update<R: Resource>(
    State(resource): State<R>,
    Path(id): Path<i32>,
    Json(patch): Json<R::Patch>,
) -> Outcome<R::Entity> {
    resource.update(id, patch).await
}

async fn delete_one<R: Resource>(State(resource): State<R>, Path(id): Path<i32>) -> Status {
    resource.delete(id).await
}

#[async_trait]
impl Resource for AuthorResolver {
    type Entity = Author;
    type Patch = AuthorPatch;

    async fn list(&self) -> Outcome<Vec<Author>> {
        self.get_all().await
    }

    async fn get(&self, id: i32) -> Outcome<Author> {
        self.get_by_id(id).await
    }

    async fn create(&self, author: &Author) -> Outcome<Author> {
        AuthorResolver::create(self, author).await
    }

    async fn update(&self, id: i32, patch: AuthorPatch) -> Outcome<Author> {
        AuthorResolver::update(self, id, patch).await
    }

    async fn delete(&self, id: i32) -> Status {
        AuthorResolver::delete(self, id).await
    }

    async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList> {
        AuthorResolver::batch_delete(self, ids).await
    }
}

#[async_trait]
impl Resource for WorkResolver {
    type Entity = Work;
    type Patch = WorkPatch;

    async fn list(&self) -> Outcome<Vec<Work>> {
        self.get_all().await
    }

    async fn get(&self, id: i32) -> Outcome<Work> {
        self.get_by_id(id).await
    }

    async fn create(&self, work: &Work) -> Outcome<Work> {
        WorkResolver::create(self, work).await
    }

    async fn update(&self, id: i32, patch: WorkPatch) -> Outcome<Work> {
        WorkResolver::update(self, id, patch).await
    }

    async fn delete(&self, id: i32) -> Status {
        WorkResolver::delete(self, id).await
    }

    async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList> {
        WorkResolver::batch_delete(self, ids).await
    }
}

#[async_trait]
impl Resource for PublicationManager {
    type Entity = Publication;
    type Patch = PublicationPatch;

    async fn list(&self) -> Outcome<Vec<Publication>> {
        self.get_all().await
    }

    async fn get(&self, id: i32) -> Outcome<Publication> {
        self.get_by_id(id).await
    }

    async fn create(&self, publication: &Publication) -> Outcome<Publication> {
        PublicationManager::create(self, publication).await
    }

    async fn update(&self, id: i32, patch: PublicationPatch) -> Outcome<Publication> {
        PublicationManager::update(self, id, patch).await
    }

    async fn delete(&self, id: i32) -> Status {
        PublicationManager::delete(self, id).await
    }

    async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList> {
        PublicationManager::batch_delete(self, ids).await
    }
}
