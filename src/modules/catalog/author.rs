use std::sync::Arc;

use async_trait::async_trait;
use books_http::{Outcome, Status};
use chrono::{DateTime, SecondsFormat, Utc};

use super::cascade::{self, Resolve};
use super::errors::{deleted, read_failed, write_failed};
use super::location::LocationResolver;
use super::models::{Author, AuthorPatch, IdList, Location};
use super::store::{AuthorChanges, CatalogStore};
use crate::utils::supplied;

/// Create-or-find of authors by `(first name, last name, date of birth)`.
///
/// A supplied birthplace is always resolved through [`LocationResolver`],
/// even when it carries an id.
#[derive(Clone)]
pub struct AuthorResolver {
    store: Arc<dyn CatalogStore>,
    locations: LocationResolver,
}

impl AuthorResolver {
    pub fn new(store: Arc<dyn CatalogStore>, locations: LocationResolver) -> Self {
        Self { store, locations }
    }

    pub async fn create(&self, author: &Author) -> Outcome<Author> {
        if author.id != 0 {
            if let Ok(Some(existing)) = self.get_by_id(author.id).await.into_result() {
                let message = format!("Author with id = {} already exists", author.id);
                tracing::info!(target: "books::author", "{message}");
                return Outcome::new(Status::conflict(message), Some(existing));
            }
        }

        let mut author = author.clone();
        author.date_of_birth = Some(author.date_of_birth_or_default());

        if !author.place_of_birth.is_empty() {
            match self.resolve_place_of_birth(&author.place_of_birth).await {
                Ok(id) => author.place_of_birth = Location::reference(id),
                Err(status) => return status.into(),
            }
        }

        match self.store.insert_author(&author).await {
            Ok(created) => Outcome::created(created),
            Err(err) => {
                tracing::warn!(target: "books::author", error = %err, "insert failed");
                write_failed(err).into()
            }
        }
    }

    pub async fn find(
        &self,
        first_name: &str,
        last_name: &str,
        date_of_birth: DateTime<Utc>,
    ) -> Outcome<Author> {
        match self
            .store
            .find_author(first_name, last_name, date_of_birth)
            .await
        {
            Ok(Some(author)) => Outcome::ok(author),
            Ok(None) => Status::not_found(format!(
                "Author ('{first_name}', '{last_name}', '{}') does not exist",
                date_of_birth.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ))
            .into(),
            Err(err) => read_failed(err).into(),
        }
    }

    /// The author with its birthplace filled in.
    pub async fn get_by_id(&self, id: i32) -> Outcome<Author> {
        match self.store.author(id).await {
            Ok(Some(author)) => Outcome::ok(author),
            Ok(None) => Status::not_found(format!("Author with id = {id} does not exist")).into(),
            Err(err) => read_failed(err).into(),
        }
    }

    pub async fn get_all(&self) -> Outcome<Vec<Author>> {
        match self.store.authors().await {
            Ok(authors) => Outcome::ok(authors),
            Err(err) => read_failed(err).into(),
        }
    }

    /// Apply the supplied fields and return the re-fetched author.
    pub async fn update(&self, id: i32, patch: AuthorPatch) -> Outcome<Author> {
        let mut changes = AuthorChanges {
            first_name: supplied(patch.first_name),
            last_name: supplied(patch.last_name),
            gender: supplied(patch.gender),
            date_of_birth: patch.date_of_birth,
            place_of_birth: None,
        };

        if let Some(place_of_birth) = patch.place_of_birth.filter(|l| !l.is_empty()) {
            match self.resolve_place_of_birth(&place_of_birth).await {
                Ok(location_id) => changes.place_of_birth = Some(location_id),
                Err(status) => return status.into(),
            }
        }

        if changes.is_empty() {
            return Status::ok("No fields in author to update").into();
        }

        match self.store.update_author(id, &changes).await {
            Ok(Some(_)) => self.get_by_id(id).await,
            Ok(None) => Status::not_found(format!("Author with id = {id} does not exist")).into(),
            Err(err) => {
                tracing::warn!(target: "books::author", id, error = %err, "update failed");
                write_failed(err).into()
            }
        }
    }

    pub async fn delete(&self, id: i32) -> Status {
        deleted("Author", id, self.store.delete_author(id).await)
    }

    pub async fn batch_delete(&self, ids: &[i32]) -> Outcome<IdList> {
        cascade::delete_each(ids, "authors", |id| self.delete(id)).await
    }

    async fn resolve_place_of_birth(&self, location: &Location) -> Result<i32, Status> {
        cascade::resolve(&self.locations, location)
            .await
            .inspect_err(|status| {
                tracing::warn!(target: "books::author", error = %status, "birthplace unresolved");
            })
    }
}

#[async_trait]
impl Resolve for AuthorResolver {
    type Entity = Author;

    async fn try_insert(&self, author: &Author) -> Outcome<Author> {
        self.create(author).await
    }

    async fn try_get_by_id(&self, id: i32) -> Outcome<Author> {
        self.get_by_id(id).await
    }

    async fn try_find(&self, author: &Author) -> Outcome<Author> {
        self.find(
            &author.first_name,
            &author.last_name,
            author.date_of_birth_or_default(),
        )
        .await
    }

    fn id_of(author: &Author) -> i32 {
        author.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::models::UNKNOWN_DATE_OF_BIRTH;
    use crate::modules::catalog::store::MemoryStore;
    use books_http::Code;

    fn resolver() -> AuthorResolver {
        let store: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        AuthorResolver::new(store.clone(), LocationResolver::new(store))
    }

    fn orwell() -> Author {
        Author {
            first_name: "George".to_string(),
            last_name: "Orwell".to_string(),
            gender: "M".to_string(),
            date_of_birth: "1903-06-25T00:00:00Z".parse().ok(),
            place_of_birth: Location {
                city: "Motihari".to_string(),
                country: "India".to_string(),
                ..Location::default()
            },
            ..Author::default()
        }
    }

    #[tokio::test]
    async fn create_resolves_birthplace_to_an_id() {
        let authors = resolver();
        let (status, created) = authors.create(&orwell()).await.into_parts();
        let created = created.unwrap();

        assert_eq!(status.code(), Code::Created);
        assert_ne!(created.place_of_birth.id, 0);
        assert_eq!(created.place_of_birth.city, "");

        let fetched = authors.get_by_id(created.id).await.into_value().unwrap();
        assert_eq!(fetched.place_of_birth.city, "Motihari");
        assert_eq!(fetched.first_name, "George");
    }

    #[tokio::test]
    async fn repeated_create_conflicts_on_natural_key() {
        let authors = resolver();
        authors.create(&orwell()).await.into_value().unwrap();

        let outcome = authors.create(&orwell()).await;
        assert_eq!(outcome.status().code(), Code::Conflict);
        assert!(outcome
            .status()
            .message()
            .contains("author_first_name_last_name_date_of_birth_key"));
    }

    #[tokio::test]
    async fn missing_date_of_birth_is_stored_as_epoch() {
        let authors = resolver();
        let author = Author {
            date_of_birth: None,
            ..orwell()
        };
        let created = authors.create(&author).await.into_value().unwrap();
        assert_eq!(created.date_of_birth, Some(UNKNOWN_DATE_OF_BIRTH));
    }

    #[tokio::test]
    async fn shared_birthplace_is_reused() {
        let authors = resolver();
        let first = authors.create(&orwell()).await.into_value().unwrap();
        let sibling = Author {
            first_name: "Marjorie".to_string(),
            ..orwell()
        };
        let second = authors.create(&sibling).await.into_value().unwrap();
        assert_eq!(first.place_of_birth.id, second.place_of_birth.id);
    }

    #[tokio::test]
    async fn empty_patch_is_ok_with_message() {
        let authors = resolver();
        let created = authors.create(&orwell()).await.into_value().unwrap();

        let patch = AuthorPatch {
            first_name: Some(String::new()),
            ..AuthorPatch::default()
        };
        let (status, value) = authors.update(created.id, patch).await.into_parts();
        assert_eq!(status.code(), Code::Ok);
        assert_eq!(status.message(), "No fields in author to update");
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn patch_changes_only_supplied_fields() {
        let authors = resolver();
        let created = authors.create(&orwell()).await.into_value().unwrap();

        let patch = AuthorPatch {
            gender: Some("Male".to_string()),
            place_of_birth: Some(Location {
                city: "London".to_string(),
                country: "United Kingdom".to_string(),
                ..Location::default()
            }),
            ..AuthorPatch::default()
        };
        let updated = authors.update(created.id, patch).await.into_value().unwrap();
        assert_eq!(updated.gender, "Male");
        assert_eq!(updated.first_name, "George");
        assert_eq!(updated.place_of_birth.city, "London");
    }

    #[tokio::test]
    async fn patch_onto_existing_natural_key_conflicts() {
        let authors = resolver();
        authors.create(&orwell()).await.into_value().unwrap();
        let sibling = authors
            .create(&Author {
                first_name: "Marjorie".to_string(),
                ..orwell()
            })
            .await
            .into_value()
            .unwrap();

        let patch = AuthorPatch {
            first_name: Some("George".to_string()),
            ..AuthorPatch::default()
        };
        let outcome = authors.update(sibling.id, patch).await;
        assert_eq!(outcome.status().code(), Code::Conflict);
        assert!(outcome
            .status()
            .message()
            .contains("author_first_name_last_name_date_of_birth_key"));
    }

    #[tokio::test]
    async fn patch_of_missing_author_is_not_found() {
        let patch = AuthorPatch {
            last_name: Some("Blair".to_string()),
            ..AuthorPatch::default()
        };
        let outcome = resolver().update(40, patch).await;
        assert_eq!(outcome.status().code(), Code::NotFound);
    }

    #[tokio::test]
    async fn find_message_names_the_natural_key() {
        let outcome = resolver()
            .find("Eric", "Blair", UNKNOWN_DATE_OF_BIRTH)
            .await;
        assert_eq!(
            outcome.status().message(),
            "Author ('Eric', 'Blair', '1970-01-01T00:00:00Z') does not exist"
        );
    }

    #[tokio::test]
    async fn batch_delete_lists_missing_ids() {
        let authors = resolver();
        let created = authors.create(&orwell()).await.into_value().unwrap();

        let (status, missing) = authors
            .batch_delete(&[created.id, 77])
            .await
            .into_parts();
        assert_eq!(status.code(), Code::Ok);
        assert_eq!(status.message(), "The following authors could not be found: [77]");
        assert_eq!(missing, Some(IdList { ids: vec![77] }));
    }
}
