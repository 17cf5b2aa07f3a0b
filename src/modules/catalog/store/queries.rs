//! SQL templates used by the Postgres store, one per query kind.
//!
//! Hydrating selects alias nested columns with a table prefix
//! (`location_city`, `author_first_name`, `work_title`, ...) so that each
//! row type can be decoded by name.

macro_rules! author_columns {
    () => {
        "a.id, a.first_name, a.last_name, a.gender, a.date_of_birth, a.place_of_birth"
    };
}

macro_rules! location_join_columns {
    () => {
        "l.city AS location_city, l.country AS location_country, l.region AS location_region"
    };
}

macro_rules! select_authors {
    () => {
        concat!(
            "SELECT ",
            author_columns!(),
            ", ",
            location_join_columns!(),
            " FROM author a LEFT JOIN location l ON l.id = a.place_of_birth"
        )
    };
}

macro_rules! work_columns {
    () => {
        "w.id, w.description, w.initial_pub_date, w.original_language, w.title, w.author_id"
    };
}

macro_rules! author_join_columns {
    () => {
        "a.first_name AS author_first_name, a.last_name AS author_last_name, \
         a.gender AS author_gender, a.date_of_birth AS author_date_of_birth, \
         a.place_of_birth AS author_place_of_birth"
    };
}

macro_rules! select_works {
    () => {
        concat!(
            "SELECT ",
            work_columns!(),
            ", ",
            author_join_columns!(),
            ", ",
            location_join_columns!(),
            " FROM work w",
            " JOIN author a ON a.id = w.author_id",
            " LEFT JOIN location l ON l.id = a.place_of_birth"
        )
    };
}

macro_rules! publication_columns {
    () => {
        "p.id, p.edition_pub_date, p.format, p.image_url, p.isbn, p.isbn13, \
         p.language, p.num_pages, p.publisher, p.work_id"
    };
}

macro_rules! select_publications {
    () => {
        concat!(
            "SELECT ",
            publication_columns!(),
            ", w.description AS work_description, w.initial_pub_date AS work_initial_pub_date, \
             w.original_language AS work_original_language, w.title AS work_title, \
             w.author_id AS work_author_id, ",
            author_join_columns!(),
            ", ",
            location_join_columns!(),
            " FROM publication p",
            " JOIN work w ON w.id = p.work_id",
            " JOIN author a ON a.id = w.author_id",
            " LEFT JOIN location l ON l.id = a.place_of_birth"
        )
    };
}

pub(super) const AUTHOR_RETURNING: &str =
    " RETURNING id, first_name, last_name, gender, date_of_birth, place_of_birth";
pub(super) const WORK_RETURNING: &str =
    " RETURNING id, description, initial_pub_date, original_language, title, author_id";
pub(super) const PUBLICATION_RETURNING: &str = " RETURNING id, edition_pub_date, format, \
     image_url, isbn, isbn13, language, num_pages, publisher, work_id";

/// Every fixed statement the store issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Query {
    InsertLocation,
    GetLocation,
    FindLocation,
    DeleteLocation,
    InsertAuthor,
    GetAuthor,
    GetAuthors,
    FindAuthor,
    DeleteAuthor,
    InsertWork,
    GetWork,
    GetWorks,
    FindWork,
    DeleteWork,
    InsertPublication,
    GetPublication,
    GetPublications,
    DeletePublication,
}

impl Query {
    pub(super) const fn sql(self) -> &'static str {
        match self {
            Query::InsertLocation => concat!(
                "INSERT INTO location (city, country, region) VALUES ($1, $2, $3)",
                " RETURNING id, city, country, region"
            ),
            Query::GetLocation => "SELECT id, city, country, region FROM location WHERE id = $1",
            Query::FindLocation => {
                "SELECT id, city, country, region FROM location WHERE city = $1 AND country = $2"
            }
            Query::DeleteLocation => "DELETE FROM location WHERE id = $1",
            Query::InsertAuthor => concat!(
                "INSERT INTO author (first_name, last_name, gender, date_of_birth, place_of_birth)",
                " VALUES ($1, $2, $3, $4, $5)",
                " RETURNING id, first_name, last_name, gender, date_of_birth, place_of_birth"
            ),
            Query::GetAuthor => concat!(select_authors!(), " WHERE a.id = $1"),
            Query::GetAuthors => concat!(select_authors!(), " ORDER BY a.id"),
            Query::FindAuthor => concat!(
                "SELECT ",
                author_columns!(),
                " FROM author a",
                " WHERE a.first_name = $1 AND a.last_name = $2 AND a.date_of_birth = $3"
            ),
            Query::DeleteAuthor => "DELETE FROM author WHERE id = $1",
            Query::InsertWork => concat!(
                "INSERT INTO work (description, initial_pub_date, original_language, title, author_id)",
                " VALUES ($1, $2, $3, $4, $5)",
                " RETURNING id, description, initial_pub_date, original_language, title, author_id"
            ),
            Query::GetWork => concat!(select_works!(), " WHERE w.id = $1"),
            Query::GetWorks => concat!(select_works!(), " ORDER BY w.id"),
            Query::FindWork => concat!(
                "SELECT ",
                work_columns!(),
                " FROM work w WHERE w.title = $1 AND w.author_id = $2"
            ),
            Query::DeleteWork => "DELETE FROM work WHERE id = $1",
            Query::InsertPublication => concat!(
                "INSERT INTO publication (edition_pub_date, format, image_url, isbn, isbn13,",
                " language, num_pages, publisher, work_id)",
                " VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                " RETURNING id, edition_pub_date, format, image_url, isbn, isbn13,",
                " language, num_pages, publisher, work_id"
            ),
            Query::GetPublication => concat!(select_publications!(), " WHERE p.id = $1"),
            Query::GetPublications => concat!(select_publications!(), " ORDER BY p.id"),
            Query::DeletePublication => "DELETE FROM publication WHERE id = $1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrating_selects_join_down_to_location() {
        assert!(Query::GetAuthor.sql().contains("LEFT JOIN location l"));
        assert!(Query::GetWork.sql().contains("JOIN author a ON a.id = w.author_id"));
        assert!(Query::GetPublications.sql().contains("JOIN work w ON w.id = p.work_id"));
        assert!(Query::GetPublications.sql().ends_with("ORDER BY p.id"));
    }

    #[test]
    fn natural_key_lookups_bind_every_key_column() {
        assert!(Query::FindLocation.sql().contains("city = $1 AND country = $2"));
        assert!(Query::FindAuthor.sql().contains("a.date_of_birth = $3"));
        assert!(Query::FindWork.sql().contains("w.author_id = $2"));
    }
}
