use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::queries::{Query, AUTHOR_RETURNING, PUBLICATION_RETURNING, WORK_RETURNING};
use super::{AuthorChanges, CatalogStore, PublicationChanges, StoreResult, WorkChanges};
use crate::modules::catalog::models::{Author, Location, Publication, Work};

/// Catalog store backed by a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Empty optional identifiers are stored as NULL so they never collide.
fn nullable(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn nullable_id(id: i32) -> Option<i32> {
    (id != 0).then_some(id)
}

#[derive(Debug, FromRow)]
struct LocationRow {
    id: i32,
    city: String,
    country: String,
    region: String,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            city: row.city,
            country: row.country,
            region: row.region,
        }
    }
}

/// Birthplace columns joined onto author rows. Absent from non-hydrating
/// statements, NULL when the author has no birthplace.
#[derive(Debug, Default, FromRow)]
struct LocationJoin {
    #[sqlx(default)]
    location_city: Option<String>,
    #[sqlx(default)]
    location_country: Option<String>,
    #[sqlx(default)]
    location_region: Option<String>,
}

impl LocationJoin {
    fn into_location(self, id: Option<i32>) -> Location {
        Location {
            id: id.unwrap_or_default(),
            city: self.location_city.unwrap_or_default(),
            country: self.location_country.unwrap_or_default(),
            region: self.location_region.unwrap_or_default(),
        }
    }
}

#[derive(Debug, FromRow)]
struct AuthorRow {
    id: i32,
    first_name: String,
    last_name: String,
    gender: String,
    date_of_birth: DateTime<Utc>,
    place_of_birth: Option<i32>,
    #[sqlx(flatten)]
    location: LocationJoin,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            gender: row.gender,
            date_of_birth: Some(row.date_of_birth),
            place_of_birth: row.location.into_location(row.place_of_birth),
        }
    }
}

/// Author columns joined onto work rows.
#[derive(Debug, Default, FromRow)]
struct AuthorJoin {
    #[sqlx(default)]
    author_first_name: Option<String>,
    #[sqlx(default)]
    author_last_name: Option<String>,
    #[sqlx(default)]
    author_gender: Option<String>,
    #[sqlx(default)]
    author_date_of_birth: Option<DateTime<Utc>>,
    #[sqlx(default)]
    author_place_of_birth: Option<i32>,
    #[sqlx(flatten)]
    location: LocationJoin,
}

impl AuthorJoin {
    fn into_author(self, id: i32) -> Author {
        let Some(first_name) = self.author_first_name else {
            return Author::reference(id);
        };
        Author {
            id,
            first_name,
            last_name: self.author_last_name.unwrap_or_default(),
            gender: self.author_gender.unwrap_or_default(),
            date_of_birth: self.author_date_of_birth,
            place_of_birth: self.location.into_location(self.author_place_of_birth),
        }
    }
}

#[derive(Debug, FromRow)]
struct WorkRow {
    id: i32,
    description: String,
    initial_pub_date: Option<DateTime<Utc>>,
    original_language: String,
    title: String,
    author_id: i32,
    #[sqlx(flatten)]
    author: AuthorJoin,
}

impl From<WorkRow> for Work {
    fn from(row: WorkRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            initial_pub_date: row.initial_pub_date,
            original_language: row.original_language,
            title: row.title,
            author: row.author.into_author(row.author_id),
        }
    }
}

/// Work columns joined onto publication rows.
#[derive(Debug, Default, FromRow)]
struct WorkJoin {
    #[sqlx(default)]
    work_description: Option<String>,
    #[sqlx(default)]
    work_initial_pub_date: Option<DateTime<Utc>>,
    #[sqlx(default)]
    work_original_language: Option<String>,
    #[sqlx(default)]
    work_title: Option<String>,
    #[sqlx(default)]
    work_author_id: Option<i32>,
    #[sqlx(flatten)]
    author: AuthorJoin,
}

impl WorkJoin {
    fn into_work(self, id: i32) -> Work {
        let (Some(title), Some(author_id)) = (self.work_title, self.work_author_id) else {
            return Work::reference(id);
        };
        Work {
            id,
            description: self.work_description.unwrap_or_default(),
            initial_pub_date: self.work_initial_pub_date,
            original_language: self.work_original_language.unwrap_or_default(),
            title,
            author: self.author.into_author(author_id),
        }
    }
}

#[derive(Debug, FromRow)]
struct PublicationRow {
    id: i32,
    edition_pub_date: Option<DateTime<Utc>>,
    format: String,
    image_url: Option<String>,
    isbn: Option<String>,
    isbn13: Option<String>,
    language: String,
    num_pages: i32,
    publisher: String,
    work_id: i32,
    #[sqlx(flatten)]
    work: WorkJoin,
}

impl From<PublicationRow> for Publication {
    fn from(row: PublicationRow) -> Self {
        Self {
            id: row.id,
            edition_pub_date: row.edition_pub_date,
            format: row.format,
            image_url: row.image_url.unwrap_or_default(),
            isbn: row.isbn.unwrap_or_default(),
            isbn13: row.isbn13.unwrap_or_default(),
            language: row.language,
            num_pages: row.num_pages,
            publisher: row.publisher,
            work: row.work.into_work(row.work_id),
        }
    }
}

impl PgStore {
    async fn delete(&self, query: Query, id: i32) -> StoreResult<u64> {
        let result = sqlx::query(query.sql()).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_location(&self, location: &Location) -> StoreResult<Location> {
        let row: LocationRow = sqlx::query_as(Query::InsertLocation.sql())
            .bind(&location.city)
            .bind(&location.country)
            .bind(&location.region)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn location(&self, id: i32) -> StoreResult<Option<Location>> {
        let row: Option<LocationRow> = sqlx::query_as(Query::GetLocation.sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Location::from))
    }

    async fn find_location(&self, city: &str, country: &str) -> StoreResult<Option<Location>> {
        let row: Option<LocationRow> = sqlx::query_as(Query::FindLocation.sql())
            .bind(city)
            .bind(country)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Location::from))
    }

    async fn delete_location(&self, id: i32) -> StoreResult<u64> {
        self.delete(Query::DeleteLocation, id).await
    }

    async fn insert_author(&self, author: &Author) -> StoreResult<Author> {
        let row: AuthorRow = sqlx::query_as(Query::InsertAuthor.sql())
            .bind(&author.first_name)
            .bind(&author.last_name)
            .bind(&author.gender)
            .bind(author.date_of_birth_or_default())
            .bind(nullable_id(author.place_of_birth.id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn author(&self, id: i32) -> StoreResult<Option<Author>> {
        let row: Option<AuthorRow> = sqlx::query_as(Query::GetAuthor.sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Author::from))
    }

    async fn authors(&self) -> StoreResult<Vec<Author>> {
        let rows: Vec<AuthorRow> = sqlx::query_as(Query::GetAuthors.sql())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn find_author(
        &self,
        first_name: &str,
        last_name: &str,
        date_of_birth: DateTime<Utc>,
    ) -> StoreResult<Option<Author>> {
        let row: Option<AuthorRow> = sqlx::query_as(Query::FindAuthor.sql())
            .bind(first_name)
            .bind(last_name)
            .bind(date_of_birth)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Author::from))
    }

    async fn update_author(&self, id: i32, changes: &AuthorChanges) -> StoreResult<Option<Author>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE author SET ");
        {
            let mut set = query.separated(", ");
            if let Some(first_name) = &changes.first_name {
                set.push("first_name = ").push_bind_unseparated(first_name.clone());
            }
            if let Some(last_name) = &changes.last_name {
                set.push("last_name = ").push_bind_unseparated(last_name.clone());
            }
            if let Some(gender) = &changes.gender {
                set.push("gender = ").push_bind_unseparated(gender.clone());
            }
            if let Some(date_of_birth) = changes.date_of_birth {
                set.push("date_of_birth = ").push_bind_unseparated(date_of_birth);
            }
            if let Some(place_of_birth) = changes.place_of_birth {
                set.push("place_of_birth = ").push_bind_unseparated(place_of_birth);
            }
        }
        query.push(" WHERE id = ").push_bind(id).push(AUTHOR_RETURNING);

        let row: Option<AuthorRow> = query.build_query_as().fetch_optional(&self.pool).await?;
        Ok(row.map(Author::from))
    }

    async fn delete_author(&self, id: i32) -> StoreResult<u64> {
        self.delete(Query::DeleteAuthor, id).await
    }

    async fn insert_work(&self, work: &Work) -> StoreResult<Work> {
        let row: WorkRow = sqlx::query_as(Query::InsertWork.sql())
            .bind(&work.description)
            .bind(work.initial_pub_date)
            .bind(&work.original_language)
            .bind(&work.title)
            .bind(work.author.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn work(&self, id: i32) -> StoreResult<Option<Work>> {
        let row: Option<WorkRow> = sqlx::query_as(Query::GetWork.sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Work::from))
    }

    async fn works(&self) -> StoreResult<Vec<Work>> {
        let rows: Vec<WorkRow> = sqlx::query_as(Query::GetWorks.sql())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Work::from).collect())
    }

    async fn find_work(&self, title: &str, author_id: i32) -> StoreResult<Option<Work>> {
        let row: Option<WorkRow> = sqlx::query_as(Query::FindWork.sql())
            .bind(title)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Work::from))
    }

    async fn update_work(&self, id: i32, changes: &WorkChanges) -> StoreResult<Option<Work>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE work SET ");
        {
            let mut set = query.separated(", ");
            if let Some(description) = &changes.description {
                set.push("description = ").push_bind_unseparated(description.clone());
            }
            if let Some(initial_pub_date) = changes.initial_pub_date {
                set.push("initial_pub_date = ").push_bind_unseparated(initial_pub_date);
            }
            if let Some(original_language) = &changes.original_language {
                set.push("original_language = ")
                    .push_bind_unseparated(original_language.clone());
            }
            if let Some(title) = &changes.title {
                set.push("title = ").push_bind_unseparated(title.clone());
            }
            if let Some(author_id) = changes.author_id {
                set.push("author_id = ").push_bind_unseparated(author_id);
            }
        }
        query.push(" WHERE id = ").push_bind(id).push(WORK_RETURNING);

        let row: Option<WorkRow> = query.build_query_as().fetch_optional(&self.pool).await?;
        Ok(row.map(Work::from))
    }

    async fn delete_work(&self, id: i32) -> StoreResult<u64> {
        self.delete(Query::DeleteWork, id).await
    }

    async fn insert_publication(&self, publication: &Publication) -> StoreResult<Publication> {
        let row: PublicationRow = sqlx::query_as(Query::InsertPublication.sql())
            .bind(publication.edition_pub_date)
            .bind(&publication.format)
            .bind(nullable(&publication.image_url))
            .bind(nullable(&publication.isbn))
            .bind(nullable(&publication.isbn13))
            .bind(&publication.language)
            .bind(publication.num_pages)
            .bind(&publication.publisher)
            .bind(publication.work.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn publication(&self, id: i32) -> StoreResult<Option<Publication>> {
        let row: Option<PublicationRow> = sqlx::query_as(Query::GetPublication.sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Publication::from))
    }

    async fn publications(&self) -> StoreResult<Vec<Publication>> {
        let rows: Vec<PublicationRow> = sqlx::query_as(Query::GetPublications.sql())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Publication::from).collect())
    }

    async fn update_publication(
        &self,
        id: i32,
        changes: &PublicationChanges,
    ) -> StoreResult<Option<Publication>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE publication SET ");
        {
            let mut set = query.separated(", ");
            if let Some(edition_pub_date) = changes.edition_pub_date {
                set.push("edition_pub_date = ").push_bind_unseparated(edition_pub_date);
            }
            if let Some(format) = &changes.format {
                set.push("format = ").push_bind_unseparated(format.clone());
            }
            if let Some(image_url) = &changes.image_url {
                set.push("image_url = ").push_bind_unseparated(image_url.clone());
            }
            if let Some(isbn) = &changes.isbn {
                set.push("isbn = ").push_bind_unseparated(isbn.clone());
            }
            if let Some(isbn13) = &changes.isbn13 {
                set.push("isbn13 = ").push_bind_unseparated(isbn13.clone());
            }
            if let Some(language) = &changes.language {
                set.push("language = ").push_bind_unseparated(language.clone());
            }
            if let Some(num_pages) = changes.num_pages {
                set.push("num_pages = ").push_bind_unseparated(num_pages);
            }
            if let Some(publisher) = &changes.publisher {
                set.push("publisher = ").push_bind_unseparated(publisher.clone());
            }
            if let Some(work_id) = changes.work_id {
                set.push("work_id = ").push_bind_unseparated(work_id);
            }
        }
        query.push(" WHERE id = ").push_bind(id).push(PUBLICATION_RETURNING);

        let row: Option<PublicationRow> = query.build_query_as().fetch_optional(&self.pool).await?;
        Ok(row.map(Publication::from))
    }

    async fn delete_publication(&self, id: i32) -> StoreResult<u64> {
        self.delete(Query::DeletePublication, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_bind_as_null() {
        assert_eq!(nullable(""), None);
        assert_eq!(nullable("0451524934"), Some("0451524934"));
        assert_eq!(nullable_id(0), None);
        assert_eq!(nullable_id(7), Some(7));
    }

    #[test]
    fn unjoined_work_row_keeps_only_the_author_id() {
        let work = Work::from(WorkRow {
            id: 3,
            description: String::new(),
            initial_pub_date: None,
            original_language: "English".to_string(),
            title: "1984".to_string(),
            author_id: 9,
            author: AuthorJoin::default(),
        });
        assert_eq!(work.author, Author::reference(9));
    }

    #[test]
    fn null_identifiers_read_back_as_empty_strings() {
        let publication = Publication::from(PublicationRow {
            id: 1,
            edition_pub_date: None,
            format: "Paperback".to_string(),
            image_url: None,
            isbn: Some("0451524934".to_string()),
            isbn13: None,
            language: "English".to_string(),
            num_pages: 328,
            publisher: "Signet".to_string(),
            work_id: 4,
            work: WorkJoin::default(),
        });
        assert_eq!(publication.image_url, "");
        assert_eq!(publication.isbn13, "");
        assert_eq!(publication.work, Work::reference(4));
    }

    #[tokio::test]
    #[ignore = "needs a Postgres instance at DATABASE_URL"]
    async fn unique_violation_names_the_constraint() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = PgPool::connect(&url).await.unwrap();
        let store = PgStore::new(pool.clone());
        let registry = crate::build_registry(std::sync::Arc::new(store.clone()));
        crate::migrate(&pool, &registry).await.unwrap();

        let location = Location {
            city: format!("Motihari {}", Utc::now().timestamp_micros()),
            country: "India".to_string(),
            ..Location::default()
        };
        let created = store.insert_location(&location).await.unwrap();
        let err = store.insert_location(&location).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("location_city_country_key"));

        let found = store
            .find_location(&location.city, &location.country)
            .await
            .unwrap();
        assert_eq!(found.map(|l| l.id), Some(created.id));
        assert_eq!(store.delete_location(created.id).await.unwrap(), 1);
    }
}
