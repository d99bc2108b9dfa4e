//! Schema synchronization for the catalog tables
//!
//! Creates missing tables and indexes on startup. Every statement is
//! idempotent, so running the sync against an existing database is a no-op.
//! Column renames or type changes are not handled.

use sqlx::SqlitePool;
use tracing::debug;

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
}

struct TableDef {
    name: &'static str,
    create_sql: &'static str,
    indexes: &'static [&'static str],
}

const TABLES: &[TableDef] = &[
    TableDef {
        name: "authors",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS authors (
              id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              born INTEGER,
              book_ids TEXT NOT NULL DEFAULT '[]',
              created_at TEXT NOT NULL
            )"#,
        indexes: &["CREATE UNIQUE INDEX IF NOT EXISTS idx_authors_name ON authors(name)"],
    },
    TableDef {
        name: "books",
        // The author row may be written after the book inside one transaction,
        // so the reference is only checked at commit.
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS books (
              id TEXT PRIMARY KEY,
              title TEXT NOT NULL,
              published INTEGER NOT NULL,
              genres TEXT NOT NULL DEFAULT '[]',
              author_id TEXT NOT NULL REFERENCES authors(id) DEFERRABLE INITIALLY DEFERRED,
              created_at TEXT NOT NULL
            )"#,
        indexes: &[
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_books_title ON books(title)",
            "CREATE INDEX IF NOT EXISTS idx_books_author_id ON books(author_id)",
        ],
    },
    TableDef {
        name: "users",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS users (
              id TEXT PRIMARY KEY,
              username TEXT NOT NULL,
              favorite_genre TEXT NOT NULL,
              created_at TEXT NOT NULL
            )"#,
        indexes: &["CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username)"],
    },
];

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Create every missing catalog table and index
pub async fn sync_schema(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    for table in TABLES {
        if !table_exists(pool, table.name).await? {
            debug!("Creating table {}", table.name);
            sqlx::query(table.create_sql).execute(pool).await?;
            result.tables_created.push(table.name.to_string());
        }
        for index in table.indexes {
            sqlx::query(index).execute(pool).await?;
        }
    }

    Ok(result)
}
