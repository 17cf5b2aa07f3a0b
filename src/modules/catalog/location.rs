use std::sync::Arc;

use async_trait::async_trait;
use books_http::{Outcome, Status};

use super::cascade::Resolve;
use super::errors::{deleted, read_failed, write_failed};
use super::models::Location;
use super::store::CatalogStore;

/// Create-or-find of locations by `(city, country)`.
#[derive(Clone)]
pub struct LocationResolver {
    store: Arc<dyn CatalogStore>,
}

impl LocationResolver {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Insert a location.
    ///
    /// On a `(city, country)` conflict the existing row is looked up and
    /// returned alongside the conflict so callers need no second round trip.
    pub async fn create(&self, location: &Location) -> Outcome<Location> {
        if location.id != 0 {
            if let Ok(Some(existing)) = self.get_by_id(location.id).await.into_result() {
                let message = format!("Location with id = {} already exists", location.id);
                tracing::info!(target: "books::location", "{message}");
                return Outcome::new(Status::conflict(message), Some(existing));
            }
        }

        match self.store.insert_location(location).await {
            Ok(created) => Outcome::created(created),
            Err(err) if err.is_unique_violation() => {
                tracing::info!(target: "books::location", error = %err, "location already exists");
                let existing = self
                    .find(&location.city, &location.country)
                    .await
                    .into_value();
                Outcome::new(write_failed(err), existing)
            }
            Err(err) => {
                tracing::warn!(target: "books::location", error = %err, "insert failed");
                write_failed(err).into()
            }
        }
    }

    pub async fn find(&self, city: &str, country: &str) -> Outcome<Location> {
        match self.store.find_location(city, country).await {
            Ok(Some(location)) => Outcome::ok(location),
            Ok(None) => {
                Status::not_found(format!("Location ('{city}', '{country}') does not exist")).into()
            }
            Err(err) => read_failed(err).into(),
        }
    }

    pub async fn get_by_id(&self, id: i32) -> Outcome<Location> {
        match self.store.location(id).await {
            Ok(Some(location)) => Outcome::ok(location),
            Ok(None) => Status::not_found(format!("Location with id = {id} does not exist")).into(),
            Err(err) => read_failed(err).into(),
        }
    }

    pub async fn delete(&self, id: i32) -> Status {
        deleted("Location", id, self.store.delete_location(id).await)
    }
}

#[async_trait]
impl Resolve for LocationResolver {
    type Entity = Location;

    async fn try_insert(&self, location: &Location) -> Outcome<Location> {
        self.create(location).await
    }

    async fn try_get_by_id(&self, id: i32) -> Outcome<Location> {
        self.get_by_id(id).await
    }

    async fn try_find(&self, location: &Location) -> Outcome<Location> {
        self.find(&location.city, &location.country).await
    }

    fn id_of(location: &Location) -> i32 {
        location.id
    }
}
