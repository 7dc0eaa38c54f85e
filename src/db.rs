use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, Statement,
    TransactionTrait,
};
use tokio::fs;

pub const MIGRATIONS_DIR: &str = "migrations";

// Arbitrary key shared by every process that migrates this database.
const MIGRATION_LOCK_KEY: i64 = 0x6779_6d66_6f67;

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url)
        .await
        .context("connecting to the database")?;
    Ok(conn)
}

/// Applies every `*.sql` file of `migrations/` that has not been applied yet.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    run_migrations_from(conn, Path::new(MIGRATIONS_DIR)).await
}

/// Files run in name order, each inside its own transaction, and are
/// recorded in `schema_migrations`. Concurrent callers are serialized with
/// an advisory lock.
pub async fn run_migrations_from(conn: &DatabaseConnection, dir: &Path) -> Result<()> {
    let files = migration_files(dir).await?;

    for file in files {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("migration file name {}", file.display()))?;

        let txn = conn.begin().await?;
        execute(&txn, &format!("SELECT pg_advisory_xact_lock({MIGRATION_LOCK_KEY})")).await?;
        execute(
            &txn,
            "CREATE TABLE IF NOT EXISTS schema_migrations (\
                name TEXT PRIMARY KEY, \
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now())",
        )
        .await?;

        let applied = txn
            .query_one(Statement::from_sql_and_values(
                txn.get_database_backend(),
                "SELECT 1 FROM schema_migrations WHERE name = $1",
                [name.clone().into()],
            ))
            .await?
            .is_some();
        if applied {
            txn.commit().await?;
            continue;
        }

        let sql = fs::read_to_string(&file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        for stmt in statements(&sql) {
            execute(&txn, stmt)
                .await
                .with_context(|| format!("migration {name} failed"))?;
        }
        txn.execute(Statement::from_sql_and_values(
            txn.get_database_backend(),
            "INSERT INTO schema_migrations (name) VALUES ($1)",
            [name.clone().into()],
        ))
        .await?;
        txn.commit().await?;

        tracing::info!(migration = %name, "migration applied");
    }

    Ok(())
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading migrations from {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn execute(txn: &DatabaseTransaction, sql: &str) -> Result<()> {
    txn.execute(Statement::from_string(txn.get_database_backend(), sql.to_string()))
        .await?;
    Ok(())
}

/// Splits a migration file into single statements. Prepared statements
/// cannot carry more than one command.
fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
}

fn is_comment_only(stmt: &str) -> bool {
    stmt.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_statements_and_skips_comment_blocks() {
        let sql = "-- users\nCREATE TABLE a (id INT);\n\n  INSERT INTO a VALUES (1) ;\n-- trailing note\n";
        let parts: Vec<&str> = statements(sql).collect();
        assert_eq!(
            parts,
            vec!["-- users\nCREATE TABLE a (id INT)", "INSERT INTO a VALUES (1)"]
        );
    }

    #[tokio::test]
    async fn only_sql_files_are_picked_up_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002_b.sql", "0001_a.sql", "README.md"] {
            std::fs::write(dir.path().join(name), "SELECT 1;").unwrap();
        }
        let names: Vec<String> = migration_files(dir.path())
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0001_a.sql", "0002_b.sql"]);
    }
}
