//! Books catalog service.
//!
//! Wires the catalog modules into the kernel registry over the configured
//! store, runs the schema bootstrap and serves the HTTP API.

pub mod modules;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use books_kernel::{
    settings::{Backend, Settings},
    InitCtx, ModuleRegistry,
};
use sqlx::PgPool;

use modules::catalog::{
    store::{CatalogStore, MemoryStore, PgStore},
    Catalog,
};

/// The store selected by configuration, and the pool behind it if any.
pub struct Storage {
    pub store: Arc<dyn CatalogStore>,
    pub pool: Option<PgPool>,
}

pub async fn open_storage(settings: &Settings) -> anyhow::Result<Storage> {
    match settings.database.backend {
        Backend::Postgres => {
            let pool = books_db::connect(&settings.database).await?;
            Ok(Storage {
                store: Arc::new(PgStore::new(pool.clone())),
                pool: Some(pool),
            })
        }
        Backend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Ok(Storage {
                store: Arc::new(MemoryStore::new()),
                pool: None,
            })
        }
    }
}

/// A registry holding every catalog module over `store`.
pub fn build_registry(store: Arc<dyn CatalogStore>) -> ModuleRegistry {
    let catalog = Catalog::new(store);
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &catalog);
    registry
}

/// Apply pending schema migrations in registration order.
pub async fn migrate(pool: &PgPool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    books_db::migrate(pool, &registry.collect_migrations())
        .await
        .context("schema bootstrap failed")
}

/// Bootstrap the modules and serve until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let storage = open_storage(&settings).await?;
    let registry = build_registry(storage.store);

    if let Some(pool) = &storage.pool {
        migrate(pool, &registry).await?;
    }

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = books_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}
