//! The books catalog: locations, authors, works and publications.
//!
//! Each table is a registry module contributing its schema migration and,
//! except for locations, a JSON resource under `/api/{name}`. Creating or
//! updating an entity resolves its nested child first (publication to work,
//! work to author, author to birthplace), see [`cascade`].

pub mod author;
pub mod cascade;
mod errors;
pub mod location;
pub mod models;
pub mod openapi;
pub mod publication;
pub mod routes;
pub mod store;
pub mod work;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use books_kernel::{InitCtx, Migration, Module};

use crate::utils::log_prefix;
use author::AuthorResolver;
use location::LocationResolver;
use publication::PublicationManager;
use store::CatalogStore;
use work::WorkResolver;

/// Every resolver, wired leaf-first over one store.
#[derive(Clone)]
pub struct Catalog {
    pub locations: LocationResolver,
    pub authors: AuthorResolver,
    pub works: WorkResolver,
    pub publications: PublicationManager,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        let locations = LocationResolver::new(store.clone());
        let authors = AuthorResolver::new(store.clone(), locations.clone());
        let works = WorkResolver::new(store.clone(), authors.clone());
        let publications = PublicationManager::new(store, works.clone());

        Self {
            locations,
            authors,
            works,
            publications,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Location,
    Author,
    Work,
    Publication,
}

impl Entity {
    /// Foreign-key order: referenced tables come first.
    pub const ALL: [Entity; 4] = [
        Entity::Location,
        Entity::Author,
        Entity::Work,
        Entity::Publication,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Entity::Location => "location",
            Entity::Author => "author",
            Entity::Work => "work",
            Entity::Publication => "publication",
        }
    }

    const fn migration(self) -> Migration {
        match self {
            Entity::Location => Migration {
                id: "001_create_location",
                up: include_str!("sql/location.sql"),
            },
            Entity::Author => Migration {
                id: "001_create_author",
                up: include_str!("sql/author.sql"),
            },
            Entity::Work => Migration {
                id: "001_create_work",
                up: include_str!("sql/work.sql"),
            },
            Entity::Publication => Migration {
                id: "001_create_publication",
                up: include_str!("sql/publication.sql"),
            },
        }
    }
}

/// Registry module for one catalog table.
pub struct CatalogModule {
    entity: Entity,
    catalog: Catalog,
}

impl CatalogModule {
    pub fn new(entity: Entity, catalog: Catalog) -> Self {
        Self { entity, catalog }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        self.entity.name()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = %log_prefix(self.name()),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Option<Router> {
        match self.entity {
            Entity::Location => None,
            Entity::Author => Some(routes::router(self.catalog.authors.clone())),
            Entity::Work => Some(routes::router(self.catalog.works.clone())),
            Entity::Publication => Some(routes::router(self.catalog.publications.clone())),
        }
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(match self.entity {
            Entity::Location => openapi::schemas_only(),
            Entity::Author => openapi::resource("authors", "Author"),
            Entity::Work => openapi::resource("works", "Work"),
            Entity::Publication => openapi::resource("publications", "Publication"),
        })
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![self.entity.migration()]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = %log_prefix(self.name()), "catalog module stopped");
        Ok(())
    }
}

/// One module per table, in foreign-key order.
pub fn create_modules(catalog: &Catalog) -> Vec<Arc<dyn Module>> {
    Entity::ALL
        .into_iter()
        .map(|entity| Arc::new(CatalogModule::new(entity, catalog.clone())) as Arc<dyn Module>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryStore;

    fn modules() -> Vec<Arc<dyn Module>> {
        create_modules(&Catalog::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn modules_follow_foreign_key_order() {
        let names: Vec<&str> = modules().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["location", "author", "work", "publication"]);
    }

    #[test]
    fn location_is_not_routed() {
        let modules = modules();
        assert!(modules[0].routes().is_none());
        assert!(modules[1..].iter().all(|m| m.routes().is_some()));
    }

    #[test]
    fn migrations_create_their_own_table() {
        for module in modules() {
            let migrations = module.migrations();
            assert_eq!(migrations.len(), 1);
            assert!(migrations[0]
                .up
                .contains(&format!("CREATE TABLE IF NOT EXISTS {}", module.name())));
        }
    }
}
