use std::sync::Arc;

use books_http::{Outcome, Status};

use super::cascade;
use super::errors::{deleted, read_failed, write_failed};
use super::models::{IdList, Publication, PublicationPatch, Work, WorkPatch};
use super::store::{CatalogStore, PublicationChanges};
use super::work::WorkResolver;
use crate::utils::supplied;

/// CRUD for publications. Image URL, ISBN and ISBN-13 are each unique on
/// their own; a publication has no compound natural key.
#[derive(Clone)]
pub struct PublicationManager {
    store: Arc<dyn CatalogStore>,
    works: WorkResolver,
}

impl PublicationManager {
    pub fn new(store: Arc<dyn CatalogStore>, works: WorkResolver) -> Self {
        Self { store, works }
    }

    pub async fn create(&self, publication: &Publication) -> Outcome<Publication> {
        if publication.id != 0 {
            if let Ok(Some(existing)) = self.get_by_id(publication.id).await.into_result() {
                let message = format!("Publication with id = {} already exists", publication.id);
                tracing::info!(target: "books::publication", "{message}");
                return Outcome::new(Status::conflict(message), Some(existing));
            }
        }

        let mut publication = publication.clone();
        if !publication.work.is_empty() {
            match self.resolve_work(&publication.work).await {
                Ok(id) => publication.work = Work::reference(id),
                Err(status) => return status.into(),
            }
        }

        match self.store.insert_publication(&publication).await {
            Ok(created) => Outcome::created(created),
            Err(err) => {
                tracing::warn!(target: "books::publication", error = %err, "insert failed");
                write_failed(err).into()
            }
        }
    }

    /// The publication with its work, author and birthplace filled in.
    pub async fn get_by_id(&self, id: i32) -> Outcome<Publication> {
        match self.store.publication(id).await {
            Ok(Some(publication)) => Outcome::ok(publication),
            Ok(None) => {
                Status::not_found(format!("Publication with id = {id} does not exist")).into()
            }
            Err(err) => read_failed(err).into(),
        }
    }

    pub async fn get_all(&self) -> Outcome<Vec<Publication>> {
        match self.store.publications().await {
            Ok(publications) => Outcome::ok(publications),
            Err(err) => read_failed(err).into(),
        }
    }

    /// Apply the supplied fields and return the re-fetched publication.
    ///
    /// A nested work is handled first: with an id and other fields it is
    /// updated in place, with an id alone the publication is re-pointed, and
    /// without an id it is resolved like on create.
    pub async fn update(&self, id: i32, patch: PublicationPatch) -> Outcome<Publication> {
        let mut changes = PublicationChanges {
            edition_pub_date: patch.edition_pub_date,
            num_pages: patch.num_pages(),
            format: supplied(patch.format),
            image_url: supplied(patch.image_url),
            isbn: supplied(patch.isbn),
            isbn13: supplied(patch.isbn13),
            language: supplied(patch.language),
            publisher: supplied(patch.publisher),
            work_id: None,
        };

        if let Some(work) = patch.work.filter(|w| !w.is_empty()) {
            match self.apply_work(work).await {
                Ok(work_id) => changes.work_id = Some(work_id),
                Err(status) => return status.into(),
            }
        }

        if changes.is_empty() {
            return Status::ok("No fields in publication to update").into();
        }

        match self.store.update_publication(id, &changes).await {
            Ok(Some(_)) => self.get_by_id(id).await,
            Ok(None) => {
                Status::not_found(format!("Publication with id = {id} does not exist")).into()
            }
            Err(err) => {
                tracing::warn!(target: "books::publication", id, error = %err, "update failed");
                write_failed(err).into()
            }
        }
    }

    pub async fn delete(&self, id: i32) -> Status {
        deleted("Publication", id, self.store.delete_publication(id).await)
    }

    pub async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList> {
        cascade::delete_each(ids, "publications", |id| self.delete(id)).await
    }

    /// A known work id is taken as is; otherwise the work is resolved.
    async fn resolve_work(&self, work: &Work) -> Result<i32, Status> {
        if work.id != 0 {
            return Ok(work.id);
        }
        cascade::resolve(&self.works, work)
            .await
            .inspect_err(|status| {
                tracing::warn!(target: "books::publication", error = %status, "work unresolved");
            })
    }

    async fn apply_work(&self, work: Work) -> Result<i32, Status> {
        if work.id == 0 || !work.has_fields() {
            return self.resolve_work(&work).await;
        }

        let work_id = work.id;
        self.works
            .update(work_id, WorkPatch::from(work))
            .await
            .into_result()?;
        Ok(work_id)
    }
}
