//! SQLite connection setup and startup migrations for the identity store.

use anyhow::{Context, Result};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Open the SQLite pool, creating the database file and its parent
/// directory when they do not exist yet.
pub async fn connect(db_url: &str) -> Result<Arc<SqlitePool>> {
    tracing::debug!("Connecting using raw URL => {}", db_url);

    // Extract the local file path SQLx will use
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");

    if !db_path.starts_with(":memory:") {
        let db_path_obj = Path::new(db_path);
        if let Some(parent) = db_path_obj.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {:?}", parent))?;
                tracing::info!("Created missing directory {:?}", parent);
            }
        }

        // SQLx refuses to open a missing file unless asked to create it.
        match fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(db_path_obj)
        {
            Ok(_) => tracing::debug!("Database file {} is ready.", db_path),
            Err(e) => tracing::warn!("Failed to open database file manually: {}", e),
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .with_context(|| format!("connecting to {}", db_url))?;

    Ok(Arc::new(pool))
}

/// Applies every `*.sql` file in the migrations directory, in file name
/// order. Statements must be idempotent: this runs on every startup.
pub struct DatabaseInitializer {
    db: Arc<SqlitePool>,
    migrations_dir: PathBuf,
}

impl DatabaseInitializer {
    pub fn new(db: Arc<SqlitePool>, migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            migrations_dir: migrations_dir.into(),
        }
    }

    pub async fn initialize_database(&self) -> Result<()> {
        tracing::info!("Applying database migrations...");
        if let Err(err) = self.run_migrations().await {
            tracing::error!("An error occurred while initializing the database: {:#}", err);
            return Err(err);
        }
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        let dir = &self.migrations_dir;
        if !dir.is_dir() {
            anyhow::bail!("Migrations directory not found: {}", dir.display());
        }

        let mut files = fs::read_dir(dir)
            .with_context(|| format!("reading {}", dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        files.retain(|p| p.extension().is_some_and(|ext| ext == "sql"));
        files.sort();

        for path in files {
            let sql = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let statements = split_statements(&sql);

            tracing::info!(
                "Running {} migration statements from {}...",
                statements.len(),
                path.display()
            );

            for stmt in statements {
                tracing::debug!("Executing migration SQL: {}", stmt);
                sqlx::query(&stmt)
                    .execute(&*self.db)
                    .await
                    .with_context(|| format!("executing migration {}", path.display()))?;
            }
        }

        Ok(())
    }
}

/// Split a migration file into statements. `--` comment lines are dropped
/// first so a `;` inside a comment never cuts a statement.
fn split_statements(sql: &str) -> Vec<String> {
    let without_comments = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) async fn memory_pool() -> Arc<SqlitePool> {
        Arc::new(
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
                .unwrap(),
        )
    }

    fn repo_migrations() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    }

    #[tokio::test]
    async fn applies_migrations_and_is_idempotent() {
        let db = memory_pool().await;
        let init = DatabaseInitializer::new(db.clone(), repo_migrations());

        init.initialize_database().await.unwrap();
        init.initialize_database().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&*db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn missing_migrations_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let init = DatabaseInitializer::new(memory_pool().await, tmp.path().join("nope"));

        let err = init.initialize_database().await.unwrap_err();
        assert!(err.to_string().contains("Migrations directory not found"));
    }

    #[tokio::test]
    async fn runs_files_in_name_order_and_ignores_other_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("0002_seed.sql"),
            "INSERT INTO notes (body) VALUES ('second');",
        )
        .unwrap();
        fs::write(
            tmp.path().join("0001_create.sql"),
            "CREATE TABLE notes (body TEXT NOT NULL);",
        )
        .unwrap();
        fs::write(tmp.path().join("README.md"), "not sql").unwrap();

        let db = memory_pool().await;
        DatabaseInitializer::new(db.clone(), tmp.path())
            .initialize_database()
            .await
            .unwrap();

        let body: String = sqlx::query_scalar("SELECT body FROM notes")
            .fetch_one(&*db)
            .await
            .unwrap();
        assert_eq!(body, "second");
    }

    #[test]
    fn comment_lines_do_not_split_statements() {
        let sql = "-- header; with a semicolon\nCREATE TABLE a (x TEXT);\n  -- trailing; note\nCREATE TABLE b (y TEXT);\n";
        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE a (x TEXT)", "CREATE TABLE b (y TEXT)"]
        );
    }

    #[tokio::test]
    async fn semicolon_in_comment_does_not_break_migration() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("0001_create.sql"),
            "-- notes live here; nowhere else\nCREATE TABLE notes (body TEXT NOT NULL);",
        )
        .unwrap();

        let db = memory_pool().await;
        DatabaseInitializer::new(db.clone(), tmp.path())
            .initialize_database()
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&*db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn connect_creates_database_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("identity.db");
        let url = format!("sqlite://{}", path.display());

        let db = connect(&url).await.unwrap();
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&*db).await.unwrap();

        assert_eq!(one, 1);
        assert!(path.exists());
    }
}
