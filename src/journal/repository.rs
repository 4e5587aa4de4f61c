// Repository pattern - isolates the posts table and the image bucket
// behind one seam so the workflow and the routes never touch SQL.
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::params;
use std::sync::Arc;
use thiserror::Error;

use crate::journal::model::{Author, ImageChange, NewImage, Post};
use crate::state::DbPool;
use crate::storage::{ImageStore, StorageError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Already posted on {date} by {author}")]
    Conflict { date: NaiveDate, author: Author },

    #[error("Post not found: {0}")]
    NotFound(i64),
}

/// Repository trait - all post reads and writes
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Live posts with `start <= date <= end`, date ascending then
    /// father before mother
    async fn posts_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Post>, RepositoryError>;

    /// Live posts for one day, father before mother (at most one each)
    async fn posts_for_date(&self, date: NaiveDate) -> Result<Vec<Post>, RepositoryError>;

    /// Every live post, newest day first then father before mother
    async fn all_posts(&self) -> Result<Vec<Post>, RepositoryError>;

    /// Insert a new entry; uploads the image first when one is given.
    /// Fails with `Conflict` when the author already has a live entry
    /// on that date.
    async fn create_post(
        &self,
        date: NaiveDate,
        author: Author,
        comment: Option<String>,
        image: Option<NewImage>,
    ) -> Result<Post, RepositoryError>;

    /// Rewrite comment and image reference of an existing entry. Both
    /// columns receive their final value; `ImageChange::Keep` re-writes
    /// the current reference unchanged.
    async fn update_post(
        &self,
        id: i64,
        comment: Option<String>,
        image: ImageChange,
    ) -> Result<Post, RepositoryError>;

    /// Soft-delete an entry. The row is kept but leaves every read
    /// path, and the day becomes writable again for that author.
    async fn delete_post(&self, id: i64) -> Result<(), RepositoryError>;
}

/// SQLite implementation, with images written to the local bucket
pub struct SqlitePostRepository {
    pool: DbPool,
    images: Arc<dyn ImageStore>,
}

const POST_COLUMNS: &str = "id, created_at, date, author, comment, image_url, is_deleted";

impl SqlitePostRepository {
    pub fn new(pool: DbPool, images: Arc<dyn ImageStore>) -> Self {
        Self { pool, images }
    }

    fn get_post(&self, id: i64) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;

        let result = conn.query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1 AND is_deleted = 0"),
            params![id],
            row_to_post,
        );

        match result {
            Ok(post) => Ok(post),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RepositoryError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn posts_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE is_deleted = 0 AND date >= ?1 AND date <= ?2
             ORDER BY date ASC, author ASC"
        ))?;

        let posts = stmt
            .query_map(params![start, end], row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn posts_for_date(&self, date: NaiveDate) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE is_deleted = 0 AND date = ?1
             ORDER BY author ASC"
        ))?;

        let posts = stmt
            .query_map(params![date], row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn all_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE is_deleted = 0
             ORDER BY date DESC, author ASC"
        ))?;

        let posts = stmt
            .query_map([], row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn create_post(
        &self,
        date: NaiveDate,
        author: Author,
        comment: Option<String>,
        image: Option<NewImage>,
    ) -> Result<Post, RepositoryError> {
        // Upload before insert. A conflicting insert after a successful
        // upload leaves an orphaned object behind; that is accepted,
        // nothing references it.
        let image_url = match image {
            Some(ref img) => Some(self.images.store(author, img).await?),
            None => None,
        };

        let conn = self.pool.get()?;

        let inserted = conn.execute(
            "INSERT INTO posts (date, author, comment, image_url)
             VALUES (?1, ?2, ?3, ?4)",
            params![date, author.as_str(), comment, image_url],
        );

        match inserted {
            Ok(_) => self.get_post(conn.last_insert_rowid()),
            Err(ref e) if is_unique_violation(e) => Err(RepositoryError::Conflict { date, author }),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_post(
        &self,
        id: i64,
        comment: Option<String>,
        image: ImageChange,
    ) -> Result<Post, RepositoryError> {
        let current = self.get_post(id)?;

        let image_url = match image {
            ImageChange::Keep => current.image_url,
            ImageChange::Replace(ref img) => Some(self.images.store(current.author, img).await?),
            ImageChange::Remove => None,
        };

        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET comment = ?1, image_url = ?2 WHERE id = ?3",
            params![comment, image_url, id],
        )?;

        self.get_post(id)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        let changed = conn.execute(
            "UPDATE posts SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            params![id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let author: Author = row.get::<_, String>(3)?.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Post {
        id: row.get(0)?,
        created_at: row.get(1)?,
        date: row.get(2)?,
        author,
        comment: row.get(4)?,
        image_url: row.get(5)?,
        is_deleted: row.get(6)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _)
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynPostRepository = Arc<dyn PostRepository>;
