//! Durable client-local preferences.
//!
//! The client persists exactly two values across restarts: the session
//! token and the theme preference. They live in a single key-value
//! table in a SQLite file next to the rest of the app data; everything
//! else the client shows is a cache of server state and is refetched.

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{fs, path::Path, path::PathBuf, str::FromStr};

pub const TOKEN_KEY: &str = "token";
pub const THEME_KEY: &str = "theme";

#[derive(Clone)]
pub struct Prefs {
    pool: Pool<Sqlite>,
}

impl Prefs {
    pub async fn new(database_url: &str) -> Result<Self> {
        let database_url = normalize_database_url(database_url);
        ensure_parent_dir_exists(&database_url)?;

        let connect_options =
            SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(connect_options)
            .await?;
        let prefs = Self { pool };
        prefs.ensure_prefs_table().await?;
        Ok(prefs)
    }

    async fn ensure_prefs_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prefs (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create prefs table")?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM prefs WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read pref '{key}'"))?;
        Ok(row.map(|row| row.get::<String, _>(0)))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO prefs (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT (key) DO UPDATE
            SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write pref '{key}'"))?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM prefs WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove pref '{key}'"))?;
        Ok(())
    }

    pub async fn token(&self) -> Result<Option<String>> {
        self.get(TOKEN_KEY).await
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        self.set(TOKEN_KEY, token).await
    }

    pub async fn clear_token(&self) -> Result<()> {
        self.remove(TOKEN_KEY).await
    }

    /// Raw theme string; the caller maps unknown values to the default.
    pub async fn theme(&self) -> Result<Option<String>> {
        self.get(THEME_KEY).await
    }

    pub async fn set_theme(&self, theme: &str) -> Result<()> {
        self.set(THEME_KEY, theme).await
    }
}

fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();

    if raw.is_empty() {
        return "sqlite::memory:".to_string();
    }

    if raw.starts_with("sqlite::memory:") || raw.contains("://") {
        return raw.to_string();
    }

    if let Some(path) = raw.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
