//! In-process catalog store.
//!
//! Enforces the same unique and foreign-key constraints as the Postgres
//! schema and reports violations with the same constraint names, so callers
//! cannot tell the two backends apart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use books_db::DbError;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{AuthorChanges, CatalogStore, PublicationChanges, StoreResult, WorkChanges};
use crate::modules::catalog::models::{Author, Location, Publication, Work};

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation(format!(
        "duplicate key value violates unique constraint \"{constraint}\""
    ))
}

fn missing_parent(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation(format!(
        "insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""
    ))
}

fn referenced_row(table: &str, constraint: &str, child: &str) -> DbError {
    DbError::ForeignKeyViolation(format!(
        "update or delete on table \"{table}\" violates foreign key constraint \"{constraint}\" on table \"{child}\""
    ))
}

/// True when both values are set and equal. Empty identifiers behave like
/// NULL and never collide.
fn collides(a: &str, b: &str) -> bool {
    !a.is_empty() && a == b
}

#[derive(Debug, Default)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn others(&self, id: i32) -> impl Iterator<Item = &T> {
        self.rows.iter().filter(move |(key, _)| **key != id).map(|(_, row)| row)
    }
}

/// Rows are kept as stored: nested children carry only their id.
#[derive(Debug, Default)]
struct Tables {
    locations: Table<Location>,
    authors: Table<Author>,
    works: Table<Work>,
    publications: Table<Publication>,
}

impl Tables {
    fn check_author(&self, id: i32, author: &Author) -> StoreResult<()> {
        let date_of_birth = author.date_of_birth_or_default();
        if self.authors.others(id).any(|other| {
            other.first_name == author.first_name
                && other.last_name == author.last_name
                && other.date_of_birth_or_default() == date_of_birth
        }) {
            return Err(unique_violation(
                "author_first_name_last_name_date_of_birth_key",
            ));
        }
        let place_of_birth = author.place_of_birth.id;
        if place_of_birth != 0 && !self.locations.rows.contains_key(&place_of_birth) {
            return Err(missing_parent("author", "author_place_of_birth_fkey"));
        }
        Ok(())
    }

    fn check_work(&self, id: i32, work: &Work) -> StoreResult<()> {
        if self
            .works
            .others(id)
            .any(|other| other.author.id == work.author.id && other.title == work.title)
        {
            return Err(unique_violation("work_author_id_title_key"));
        }
        if !self.authors.rows.contains_key(&work.author.id) {
            return Err(missing_parent("work", "work_author_id_fkey"));
        }
        Ok(())
    }

    fn check_publication(&self, id: i32, publication: &Publication) -> StoreResult<()> {
        for other in self.publications.others(id) {
            if collides(&publication.image_url, &other.image_url) {
                return Err(unique_violation("publication_image_url_key"));
            }
            if collides(&publication.isbn, &other.isbn) {
                return Err(unique_violation("publication_isbn_key"));
            }
            if collides(&publication.isbn13, &other.isbn13) {
                return Err(unique_violation("publication_isbn13_key"));
            }
        }
        if !self.works.rows.contains_key(&publication.work.id) {
            return Err(missing_parent("publication", "publication_work_id_fkey"));
        }
        Ok(())
    }

    fn hydrate_author(&self, author: &Author) -> Author {
        let mut author = author.clone();
        if let Some(location) = self.locations.rows.get(&author.place_of_birth.id) {
            author.place_of_birth = location.clone();
        }
        author
    }

    fn hydrate_work(&self, work: &Work) -> Work {
        let mut work = work.clone();
        if let Some(author) = self.authors.rows.get(&work.author.id) {
            work.author = self.hydrate_author(author);
        }
        work
    }

    fn hydrate_publication(&self, publication: &Publication) -> Publication {
        let mut publication = publication.clone();
        if let Some(work) = self.works.rows.get(&publication.work.id) {
            publication.work = self.hydrate_work(work);
        }
        publication
    }
}

/// Catalog store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_location(&self, location: &Location) -> StoreResult<Location> {
        let mut tables = self.tables.write().await;
        if tables
            .locations
            .rows
            .values()
            .any(|other| other.city == location.city && other.country == location.country)
        {
            return Err(unique_violation("location_city_country_key"));
        }

        let stored = Location {
            id: tables.locations.next_id(),
            ..location.clone()
        };
        tables.locations.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn location(&self, id: i32) -> StoreResult<Option<Location>> {
        Ok(self.tables.read().await.locations.rows.get(&id).cloned())
    }

    async fn find_location(&self, city: &str, country: &str) -> StoreResult<Option<Location>> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .rows
            .values()
            .find(|location| location.city == city && location.country == country)
            .cloned())
    }

    async fn delete_location(&self, id: i32) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        if tables
            .authors
            .rows
            .values()
            .any(|author| author.place_of_birth.id == id)
        {
            return Err(referenced_row(
                "location",
                "author_place_of_birth_fkey",
                "author",
            ));
        }
        Ok(tables.locations.rows.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_author(&self, author: &Author) -> StoreResult<Author> {
        let mut tables = self.tables.write().await;
        tables.check_author(0, author)?;

        let stored = Author {
            id: tables.authors.next_id(),
            date_of_birth: Some(author.date_of_birth_or_default()),
            place_of_birth: Location::reference(author.place_of_birth.id),
            ..author.clone()
        };
        tables.authors.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn author(&self, id: i32) -> StoreResult<Option<Author>> {
        let tables = self.tables.read().await;
        Ok(tables
            .authors
            .rows
            .get(&id)
            .map(|author| tables.hydrate_author(author)))
    }

    async fn authors(&self) -> StoreResult<Vec<Author>> {
        let tables = self.tables.read().await;
        Ok(tables
            .authors
            .rows
            .values()
            .map(|author| tables.hydrate_author(author))
            .collect())
    }

    async fn find_author(
        &self,
        first_name: &str,
        last_name: &str,
        date_of_birth: DateTime<Utc>,
    ) -> StoreResult<Option<Author>> {
        let tables = self.tables.read().await;
        Ok(tables
            .authors
            .rows
            .values()
            .find(|author| {
                author.first_name == first_name
                    && author.last_name == last_name
                    && author.date_of_birth_or_default() == date_of_birth
            })
            .cloned())
    }

    async fn update_author(&self, id: i32, changes: &AuthorChanges) -> StoreResult<Option<Author>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.authors.rows.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        if let Some(first_name) = &changes.first_name {
            updated.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            updated.last_name = last_name.clone();
        }
        if let Some(gender) = &changes.gender {
            updated.gender = gender.clone();
        }
        if let Some(date_of_birth) = changes.date_of_birth {
            updated.date_of_birth = Some(date_of_birth);
        }
        if let Some(place_of_birth) = changes.place_of_birth {
            updated.place_of_birth = Location::reference(place_of_birth);
        }

        tables.check_author(id, &updated)?;
        tables.authors.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_author(&self, id: i32) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        if tables.works.rows.values().any(|work| work.author.id == id) {
            return Err(referenced_row("author", "work_author_id_fkey", "work"));
        }
        Ok(tables.authors.rows.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_work(&self, work: &Work) -> StoreResult<Work> {
        let mut tables = self.tables.write().await;
        tables.check_work(0, work)?;

        let stored = Work {
            id: tables.works.next_id(),
            author: Author::reference(work.author.id),
            ..work.clone()
        };
        tables.works.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn work(&self, id: i32) -> StoreResult<Option<Work>> {
        let tables = self.tables.read().await;
        Ok(tables.works.rows.get(&id).map(|work| tables.hydrate_work(work)))
    }

    async fn works(&self) -> StoreResult<Vec<Work>> {
        let tables = self.tables.read().await;
        Ok(tables
            .works
            .rows
            .values()
            .map(|work| tables.hydrate_work(work))
            .collect())
    }

    async fn find_work(&self, title: &str, author_id: i32) -> StoreResult<Option<Work>> {
        let tables = self.tables.read().await;
        Ok(tables
            .works
            .rows
            .values()
            .find(|work| work.title == title && work.author.id == author_id)
            .cloned())
    }

    async fn update_work(&self, id: i32, changes: &WorkChanges) -> StoreResult<Option<Work>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.works.rows.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        if let Some(description) = &changes.description {
            updated.description = description.clone();
        }
        if let Some(initial_pub_date) = changes.initial_pub_date {
            updated.initial_pub_date = Some(initial_pub_date);
        }
        if let Some(original_language) = &changes.original_language {
            updated.original_language = original_language.clone();
        }
        if let Some(title) = &changes.title {
            updated.title = title.clone();
        }
        if let Some(author_id) = changes.author_id {
            updated.author = Author::reference(author_id);
        }

        tables.check_work(id, &updated)?;
        tables.works.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_work(&self, id: i32) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        if tables
            .publications
            .rows
            .values()
            .any(|publication| publication.work.id == id)
        {
            return Err(referenced_row(
                "work",
                "publication_work_id_fkey",
                "publication",
            ));
        }
        Ok(tables.works.rows.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_publication(&self, publication: &Publication) -> StoreResult<Publication> {
        let mut tables = self.tables.write().await;
        tables.check_publication(0, publication)?;

        let stored = Publication {
            id: tables.publications.next_id(),
            work: Work::reference(publication.work.id),
            ..publication.clone()
        };
        tables.publications.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn publication(&self, id: i32) -> StoreResult<Option<Publication>> {
        let tables = self.tables.read().await;
        Ok(tables
            .publications
            .rows
            .get(&id)
            .map(|publication| tables.hydrate_publication(publication)))
    }

    async fn publications(&self) -> StoreResult<Vec<Publication>> {
        let tables = self.tables.read().await;
        Ok(tables
            .publications
            .rows
            .values()
            .map(|publication| tables.hydrate_publication(publication))
            .collect())
    }

    async fn update_publication(
        &self,
        id: i32,
        changes: &PublicationChanges,
    ) -> StoreResult<Option<Publication>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.publications.rows.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        if let Some(edition_pub_date) = changes.edition_pub_date {
            updated.edition_pub_date = Some(edition_pub_date);
        }
        if let Some(format) = &changes.format {
            updated.format = format.clone();
        }
        if let Some(image_url) = &changes.image_url {
            updated.image_url = image_url.clone();
        }
        if let Some(isbn) = &changes.isbn {
            updated.isbn = isbn.clone();
        }
        if let Some(isbn13) = &changes.isbn13 {
            updated.isbn13 = isbn13.clone();
        }
        if let Some(language) = &changes.language {
            updated.language = language.clone();
        }
        if let Some(num_pages) = changes.num_pages {
            updated.num_pages = num_pages;
        }
        if let Some(publisher) = &changes.publisher {
            updated.publisher = publisher.clone();
        }
        if let Some(work_id) = changes.work_id {
            updated.work = Work::reference(work_id);
        }

        tables.check_publication(id, &updated)?;
        tables.publications.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_publication(&self, id: i32) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(tables.publications.rows.remove(&id).map_or(0, |_| 1))
    }
}
