//! Catalog entities and the patch payloads accepted by partial updates.
//!
//! Entities double as create payloads: a nested child (`placeOfBirth`,
//! `author`, `work`) may arrive fully populated so it can be resolved, but
//! once persisted only its `id` is kept as the foreign key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{optional_date, supplied, supplied_number};

/// Date of birth recorded for authors created without one.
pub const UNKNOWN_DATE_OF_BIRTH: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// A geographic city location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    pub id: i32,
    pub city: String,
    pub country: String,
    pub region: String,
}

impl Location {
    /// A location known only by its id.
    pub fn reference(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// True when no field at all was supplied.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A writer of works.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    #[serde(deserialize_with = "optional_date")]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub place_of_birth: Location,
}

impl Author {
    pub fn reference(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Date of birth as stored: the epoch sentinel when absent.
    pub fn date_of_birth_or_default(&self) -> DateTime<Utc> {
        self.date_of_birth.unwrap_or(UNKNOWN_DATE_OF_BIRTH)
    }
}

/// A literary work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Work {
    pub id: i32,
    pub description: String,
    #[serde(deserialize_with = "optional_date")]
    pub initial_pub_date: Option<DateTime<Utc>>,
    pub original_language: String,
    pub title: String,
    pub author: Author,
}

impl Work {
    pub fn reference(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when anything besides the id was supplied.
    pub fn has_fields(&self) -> bool {
        *self != Self::reference(self.id)
    }
}

/// A specific edition of a work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Publication {
    pub id: i32,
    #[serde(deserialize_with = "optional_date")]
    pub edition_pub_date: Option<DateTime<Utc>>,
    pub format: String,
    pub image_url: String,
    pub isbn: String,
    pub isbn13: String,
    pub language: String,
    pub num_pages: i32,
    pub publisher: String,
    pub work: Work,
}

/// Partial update of an author. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    #[serde(deserialize_with = "optional_date")]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub place_of_birth: Option<Location>,
}

/// Partial update of a work. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkPatch {
    pub description: Option<String>,
    #[serde(deserialize_with = "optional_date")]
    pub initial_pub_date: Option<DateTime<Utc>>,
    pub original_language: Option<String>,
    pub title: Option<String>,
    pub author: Option<Author>,
}

impl From<Work> for WorkPatch {
    /// Reads a nested work payload as a patch; empty fields count as absent.
    fn from(work: Work) -> Self {
        Self {
            description: supplied(Some(work.description)),
            initial_pub_date: work.initial_pub_date,
            original_language: supplied(Some(work.original_language)),
            title: supplied(Some(work.title)),
            author: Some(work.author).filter(|author| !author.is_empty()),
        }
    }
}

/// Partial update of a publication. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicationPatch {
    #[serde(deserialize_with = "optional_date")]
    pub edition_pub_date: Option<DateTime<Utc>>,
    pub format: Option<String>,
    pub image_url: Option<String>,
    pub isbn: Option<String>,
    pub isbn13: Option<String>,
    pub language: Option<String>,
    pub num_pages: Option<i32>,
    pub publisher: Option<String>,
    pub work: Option<Work>,
}

impl PublicationPatch {
    pub(crate) fn num_pages(&self) -> Option<i32> {
        supplied_number(self.num_pages)
    }
}

/// Body of a batch delete request, and of its partial-miss reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdList {
    #[serde(default)]
    pub ids: Vec<i32>,
}
