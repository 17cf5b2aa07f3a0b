use std::sync::Arc;

use async_trait::async_trait;
use books_http::{Outcome, Status};

use super::author::AuthorResolver;
use super::cascade::{self, Resolve};
use super::errors::{deleted, read_failed, write_failed};
use super::models::{Author, IdList, Work, WorkPatch};
use super::store::{CatalogStore, WorkChanges};
use crate::utils::supplied;

/// Create-or-find of works by `(author id, title)`.
#[derive(Clone)]
pub struct WorkResolver {
    store: Arc<dyn CatalogStore>,
    authors: AuthorResolver,
}

impl WorkResolver {
    pub fn new(store: Arc<dyn CatalogStore>, authors: AuthorResolver) -> Self {
        Self { store, authors }
    }

    pub async fn create(&self, work: &Work) -> Outcome<Work> {
        if work.id != 0 {
            if let Ok(Some(existing)) = self.get_by_id(work.id).await.into_result() {
                let message = format!("Work with id = {} already exists", work.id);
                tracing::info!(target: "books::work", "{message}");
                return Outcome::new(Status::conflict(message), Some(existing));
            }
        }

        let mut work = work.clone();
        if !work.author.is_empty() {
            match self.resolve_author(&work.author).await {
                Ok(id) => work.author = Author::reference(id),
                Err(status) => return status.into(),
            }
        }

        match self.store.insert_work(&work).await {
            Ok(created) => Outcome::created(created),
            Err(err) => {
                tracing::warn!(target: "books::work", error = %err, "insert failed");
                write_failed(err).into()
            }
        }
    }

    pub async fn find(&self, title: &str, author_id: i32) -> Outcome<Work> {
        match self.store.find_work(title, author_id).await {
            Ok(Some(work)) => Outcome::ok(work),
            Ok(None) => {
                Status::not_found(format!("Work ('{title}', {author_id}) does not exist")).into()
            }
            Err(err) => read_failed(err).into(),
        }
    }

    /// The work with its author, and the author's birthplace, filled in.
    pub async fn get_by_id(&self, id: i32) -> Outcome<Work> {
        match self.store.work(id).await {
            Ok(Some(work)) => Outcome::ok(work),
            Ok(None) => Status::not_found(format!("Work with id = {id} does not exist")).into(),
            Err(err) => read_failed(err).into(),
        }
    }

    pub async fn get_all(&self) -> Outcome<Vec<Work>> {
        match self.store.works().await {
            Ok(works) => Outcome::ok(works),
            Err(err) => read_failed(err).into(),
        }
    }

    /// Apply the supplied fields and return the re-fetched work.
    pub async fn update(&self, id: i32, patch: WorkPatch) -> Outcome<Work> {
        let mut changes = WorkChanges {
            description: supplied(patch.description),
            initial_pub_date: patch.initial_pub_date,
            original_language: supplied(patch.original_language),
            title: supplied(patch.title),
            author_id: None,
        };

        if let Some(author) = patch.author.filter(|a| !a.is_empty()) {
            match self.resolve_author(&author).await {
                Ok(author_id) => changes.author_id = Some(author_id),
                Err(status) => return status.into(),
            }
        }

        if changes.is_empty() {
            return Status::ok("No fields in work to update").into();
        }

        match self.store.update_work(id, &changes).await {
            Ok(Some(_)) => self.get_by_id(id).await,
            Ok(None) => Status::not_found(format!("Work with id = {id} does not exist")).into(),
            Err(err) => {
                tracing::warn!(target: "books::work", id, error = %err, "update failed");
                write_failed(err).into()
            }
        }
    }

    pub async fn delete(&self, id: i32) -> Status {
        deleted("Work", id, self.store.delete_work(id).await)
    }

    pub async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList> {
        cascade::delete_each(ids, "works", |id| self.delete(id)).await
    }

    /// A known author id is taken as is; otherwise the author is resolved.
    async fn resolve_author(&self, author: &Author) -> Result<i32, Status> {
        if author.id != 0 {
            return Ok(author.id);
        }
        cascade::resolve(&self.authors, author)
            .await
            .inspect_err(|status| {
                tracing::warn!(target: "books::work", error = %status, "author unresolved");
            })
    }
}

#[async_trait]
impl Resolve for WorkResolver {
    type Entity = Work;

    async fn try_insert(&self, work: &Work) -> Outcome<Work> {
        self.create(work).await
    }

    async fn try_get_by_id(&self, id: i32) -> Outcome<Work> {
        self.get_by_id(id).await
    }

    /// The natural key needs the author id, which the payload may only
    /// describe; it is resolved again, hitting the existing author.
    async fn try_find(&self, work: &Work) -> Outcome<Work> {
        if work.author.is_empty() {
            return self.find(&work.title, 0).await;
        }
        match self.resolve_author(&work.author).await {
            Ok(author_id) => self.find(&work.title, author_id).await,
            Err(status) => status.into(),
        }
    }

    fn id_of(work: &Work) -> i32 {
        work.id
    }
}
