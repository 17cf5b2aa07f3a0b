//! Persistence port for the catalog.
//!
//! Reads by id and listings return hydrated rows (each nested child filled
//! in from its own table). Inserts, natural-key lookups and updates return
//! the stored row, whose nested child carries only its id.

mod memory;
mod postgres;
mod queries;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use books_db::DbError;
use chrono::{DateTime, Utc};

use super::models::{Author, Location, Publication, Work};

pub type StoreResult<T> = Result<T, DbError>;

/// Columns to set on an author. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub place_of_birth: Option<i32>,
}

impl AuthorChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Columns to set on a work. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkChanges {
    pub description: Option<String>,
    pub initial_pub_date: Option<DateTime<Utc>>,
    pub original_language: Option<String>,
    pub title: Option<String>,
    pub author_id: Option<i32>,
}

impl WorkChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Columns to set on a publication. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationChanges {
    pub edition_pub_date: Option<DateTime<Utc>>,
    pub format: Option<String>,
    pub image_url: Option<String>,
    pub isbn: Option<String>,
    pub isbn13: Option<String>,
    pub language: Option<String>,
    pub num_pages: Option<i32>,
    pub publisher: Option<String>,
    pub work_id: Option<i32>,
}

impl PublicationChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_location(&self, location: &Location) -> StoreResult<Location>;
    async fn location(&self, id: i32) -> StoreResult<Option<Location>>;
    async fn find_location(&self, city: &str, country: &str) -> StoreResult<Option<Location>>;
    /// Returns the number of rows removed.
    async fn delete_location(&self, id: i32) -> StoreResult<u64>;

    /// `place_of_birth.id` of zero stores no birthplace.
    async fn insert_author(&self, author: &Author) -> StoreResult<Author>;
    async fn author(&self, id: i32) -> StoreResult<Option<Author>>;
    async fn authors(&self) -> StoreResult<Vec<Author>>;
    async fn find_author(
        &self,
        first_name: &str,
        last_name: &str,
        date_of_birth: DateTime<Utc>,
    ) -> StoreResult<Option<Author>>;
    /// `Ok(None)` when no author has that id.
    async fn update_author(&self, id: i32, changes: &AuthorChanges) -> StoreResult<Option<Author>>;
    async fn delete_author(&self, id: i32) -> StoreResult<u64>;

    async fn insert_work(&self, work: &Work) -> StoreResult<Work>;
    async fn work(&self, id: i32) -> StoreResult<Option<Work>>;
    async fn works(&self) -> StoreResult<Vec<Work>>;
    async fn find_work(&self, title: &str, author_id: i32) -> StoreResult<Option<Work>>;
    async fn update_work(&self, id: i32, changes: &WorkChanges) -> StoreResult<Option<Work>>;
    async fn delete_work(&self, id: i32) -> StoreResult<u64>;

    async fn insert_publication(&self, publication: &Publication) -> StoreResult<Publication>;
    async fn publication(&self, id: i32) -> StoreResult<Option<Publication>>;
    /// Ordered by id.
    async fn publications(&self) -> StoreResult<Vec<Publication>>;
    async fn update_publication(
        &self,
        id: i32,
        changes: &PublicationChanges,
    ) -> StoreResult<Option<Publication>>;
    async fn delete_publication(&self, id: i32) -> StoreResult<u64>;
}
