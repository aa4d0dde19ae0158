// File: gibbot-core/src/db/migrations.rs

use sqlx::{Sqlite, Transaction};
use tracing::debug;

use gibbot_common::Error;

/// A versioned changeset: DDL and/or DML statements applied exactly once, in
/// the listed order, when the store's persisted version is below `version`.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub statements: Vec<String>,
}

/// Apply every changeset the store is missing, inside the supplied
/// transaction. Versions are contiguous starting at 1, so the persisted
/// version doubles as the start index into the sorted list.
///
/// Returns the version the store ends up at, or `None` when it was already
/// current (nothing executed, nothing to persist). Any statement failure
/// surfaces as a migration error; the caller must roll back and must not
/// proceed with a half-migrated store.
pub async fn run_migrations(
    tx: &mut Transaction<'_, Sqlite>,
    current_version: i64,
    migrations: &mut [Migration],
) -> Result<Option<i64>, Error> {
    // callers may hand us changesets in any order
    migrations.sort_by_key(|m| m.version);

    let Some(latest) = migrations.last().map(|m| m.version) else {
        return Ok(None);
    };

    let mut applied = 0;
    let start = usize::try_from(current_version).unwrap_or(0);
    for migration in migrations.iter().skip(start) {
        for stmt in &migration.statements {
            sqlx::query(stmt).execute(&mut **tx).await.map_err(|e| {
                Error::Migration(format!(
                    "failed to execute statement for version {}: {}",
                    migration.version, e
                ))
            })?;
        }
        applied += 1;
        debug!("applied schema changeset version {}", migration.version);

        // version 1 creates the whole schema from nothing; later changesets
        // are already reflected in it, so skip straight to the latest version
        if migration.version == 1 {
            break;
        }
    }

    if applied == 0 {
        return Ok(None);
    }

    Ok(Some(latest))
}
