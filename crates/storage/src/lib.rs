use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{ContactMessage, ContactMessageId, NewContactMessage};

/// Append-only sink for contact form submissions.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn save(&self, record: &NewContactMessage) -> Result<ContactMessageId>;
    async fn health_check(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_contact_message(
        &self,
        record: &NewContactMessage,
    ) -> Result<ContactMessageId> {
        let rec = sqlx::query(
            "INSERT INTO contact_messages (name, email, subject, message)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.subject)
        .bind(&record.message)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert contact message")?;
        Ok(ContactMessageId(rec.get::<i64, _>(0)))
    }

    pub async fn contact_message(&self, id: ContactMessageId) -> Result<Option<ContactMessage>> {
        let row = sqlx::query(
            "SELECT id, name, email, subject, message, created_at
             FROM contact_messages
             WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(contact_message_from_row))
    }

    /// Newest first; `before` pages back from a previously seen id.
    pub async fn list_contact_messages(
        &self,
        limit: u32,
        before: Option<ContactMessageId>,
    ) -> Result<Vec<ContactMessage>> {
        let rows = if let Some(before_id) = before {
            sqlx::query(
                "SELECT id, name, email, subject, message, created_at
                 FROM contact_messages
                 WHERE id < ?
                 ORDER BY id DESC
                 LIMIT ?",
            )
            .bind(before_id.0)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, name, email, subject, message, created_at
                 FROM contact_messages
                 ORDER BY id DESC
                 LIMIT ?",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.into_iter().map(contact_message_from_row).collect())
    }

    pub async fn count_contact_messages(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ContactStore for Storage {
    async fn save(&self, record: &NewContactMessage) -> Result<ContactMessageId> {
        self.insert_contact_message(record).await
    }

    async fn health_check(&self) -> Result<()> {
        Storage::health_check(self).await
    }
}

fn contact_message_from_row(r: SqliteRow) -> ContactMessage {
    ContactMessage {
        id: ContactMessageId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        email: r.get::<String, _>(2),
        subject: r.get::<String, _>(3),
        message: r.get::<String, _>(4),
        created_at: r.get::<DateTime<Utc>, _>(5),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
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
