//! Ordered schema bootstrap.
//!
//! The init script always runs first; module migrations then run in the order
//! given, each in its own transaction, and are recorded in `schema_migrations`
//! so that restarts skip what is already applied.

use std::collections::HashSet;

use anyhow::Context;
use books_kernel::Migration;
use sqlx::PgPool;

const INIT_SQL: &str = include_str!("../sql/init.sql");

/// Apply pending migrations. Returns the number applied.
pub async fn migrate(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(INIT_SQL)
        .execute(pool)
        .await
        .context("failed to run init script")?;

    let applied: Vec<(String, String)> = sqlx::query_as("SELECT module, id FROM schema_migrations")
        .fetch_all(pool)
        .await
        .context("failed to read schema_migrations")?;
    let applied: HashSet<(String, String)> = applied.into_iter().collect();

    let pending = pending(&applied, migrations);
    for (module, migration) in &pending {
        tracing::info!(
            target: "books-db",
            module = %module,
            migration = migration.id,
            "applying migration"
        );

        let mut tx = pool.begin().await.context("failed to open transaction")?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES ($1, $2)")
            .bind(module.as_str())
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration {}/{}", module, migration.id))?;
        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration {}/{}", module, migration.id))?;
    }

    tracing::info!(
        target: "books-db",
        applied = pending.len(),
        total = migrations.len(),
        "schema bootstrap complete"
    );
    Ok(pending.len())
}

/// Migrations not yet recorded, in their original order.
fn pending<'a>(
    applied: &HashSet<(String, String)>,
    migrations: &'a [(String, Migration)],
) -> Vec<&'a (String, Migration)> {
    migrations
        .iter()
        .filter(|(module, migration)| !applied.contains(&(module.clone(), migration.id.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(module: &str, id: &'static str) -> (String, Migration) {
        (module.to_string(), Migration { id, up: "SELECT 1;" })
    }

    #[test]
    fn pending_preserves_order_and_skips_applied() {
        let migrations = vec![
            migration("location", "001_location"),
            migration("author", "001_author"),
            migration("work", "001_work"),
            migration("publication", "001_publication"),
        ];
        let applied: HashSet<(String, String)> =
            [("location".to_string(), "001_location".to_string())].into();

        let names: Vec<&str> = pending(&applied, &migrations)
            .into_iter()
            .map(|(module, _)| module.as_str())
            .collect();

        assert_eq!(names, vec!["author", "work", "publication"]);
    }

    #[test]
    fn init_script_creates_bookkeeping_table() {
        assert!(INIT_SQL.contains("CREATE TABLE IF NOT EXISTS schema_migrations"));
    }
}
