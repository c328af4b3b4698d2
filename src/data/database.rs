//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;
use crate::metrics::observe_db_query;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}

/// Build a `LIKE` pattern matching `needle` anywhere, escaping `%`, `_` and `\`.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

impl Database {
    /// Connect to SQLite database and run migrations
    ///
    /// Creates the database file (and its parent directory) if missing.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        observe_db_query("select", "users");
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        observe_db_query("select", "users");
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a new user
    ///
    /// # Errors
    /// `Conflict` if the email or username is taken. This covers the race
    /// between the service's existence checks and the insert.
    pub async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        observe_db_query("insert", "users");
        let now = Utc::now();
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(error) if is_unique_violation(&error) => Err(AppError::conflict(
                "Email or username already registered",
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Store a fresh reset code, replacing any previous code or authorization
    pub async fn set_reset_code(
        &self,
        user_id: i64,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        observe_db_query("update", "users");
        sqlx::query(
            r#"
            UPDATE users
            SET reset_code = ?, reset_code_expires_at = ?, reset_authorized_until = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(code)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Consume `code` and open a password reset window until `authorized_until`
    ///
    /// The update is guarded by the code and its expiry, so of two
    /// concurrent verifications only one succeeds.
    ///
    /// # Returns
    /// `true` if the code was still stored and is now consumed
    pub async fn consume_reset_code(
        &self,
        user_id: i64,
        code: &str,
        authorized_until: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        observe_db_query("update", "users");
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_code = NULL, reset_code_expires_at = NULL, reset_authorized_until = ?, updated_at = ?
            WHERE id = ? AND reset_code = ? AND reset_code_expires_at > ?
            "#,
        )
        .bind(authorized_until)
        .bind(now)
        .bind(user_id)
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Overwrite the password hash and close the reset window
    ///
    /// # Returns
    /// `false` if no unexpired reset window was open
    pub async fn reset_password(&self, user_id: i64, password_hash: &str) -> Result<bool, AppError> {
        observe_db_query("update", "users");
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_authorized_until = NULL, updated_at = ?
            WHERE id = ? AND reset_authorized_until > ?
            "#,
        )
        .bind(password_hash)
        .bind(now)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Blogs
    // =========================================================================

    /// Blogs owned by `user_id`, optionally restricted to titles containing `title`
    pub async fn get_user_blogs(
        &self,
        user_id: i64,
        title: Option<&str>,
    ) -> Result<Vec<Blog>, AppError> {
        observe_db_query("select", "blogs");
        let blogs = match title {
            Some(title) => {
                sqlx::query_as::<_, Blog>(
                    r#"
                    SELECT * FROM blogs
                    WHERE user_id = ? AND title LIKE ? ESCAPE '\'
                    ORDER BY id
                    "#,
                )
                .bind(user_id)
                .bind(contains_pattern(title))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE user_id = ? ORDER BY id")
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(blogs)
    }

    /// Blogs whose title or body contains `search`
    ///
    /// # Arguments
    /// * `owner` - Restrict to this user's blogs; `None` searches all users
    /// * `search` - Substring to look for; `None` matches everything
    pub async fn search_blogs(
        &self,
        owner: Option<i64>,
        search: Option<&str>,
    ) -> Result<Vec<Blog>, AppError> {
        observe_db_query("select", "blogs");
        let pattern = search.map(contains_pattern);
        let blogs = sqlx::query_as::<_, Blog>(
            r#"
            SELECT * FROM blogs
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR title LIKE ?2 ESCAPE '\' OR post LIKE ?2 ESCAPE '\')
            ORDER BY id
            "#,
        )
        .bind(owner)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(blogs)
    }

    pub async fn get_blog(&self, id: i64) -> Result<Option<Blog>, AppError> {
        observe_db_query("select", "blogs");
        let blog = sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(blog)
    }

    /// Get a blog only if it is owned by `user_id`
    pub async fn get_user_blog(&self, id: i64, user_id: i64) -> Result<Option<Blog>, AppError> {
        observe_db_query("select", "blogs");
        let blog = sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(blog)
    }

    pub async fn insert_blog(&self, owner: &User, title: &str, post: &str) -> Result<Blog, AppError> {
        observe_db_query("insert", "blogs");
        let now = Utc::now();
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (title, post, user_id, user_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(post)
        .bind(owner.id)
        .bind(&owner.username)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(blog)
    }

    /// Persist title, post and updated_at of an existing blog
    pub async fn update_blog(&self, blog: &Blog) -> Result<Option<Blog>, AppError> {
        observe_db_query("update", "blogs");
        let updated = sqlx::query_as::<_, Blog>(
            r#"
            UPDATE blogs SET title = ?, post = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.post)
        .bind(blog.updated_at)
        .bind(blog.id)
        .bind(blog.user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Delete a blog owned by `user_id`
    ///
    /// Comments and likes go with it (`ON DELETE CASCADE`).
    ///
    /// # Returns
    /// `true` if a row was deleted
    pub async fn delete_blog(&self, id: i64, user_id: i64) -> Result<bool, AppError> {
        observe_db_query("delete", "blogs");
        let result = sqlx::query("DELETE FROM blogs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(
        &self,
        user_id: i64,
        blog_id: i64,
        content: &str,
    ) -> Result<Comment, AppError> {
        observe_db_query("insert", "comments");
        let now = Utc::now();
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, user_id, blog_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(content)
        .bind(user_id)
        .bind(blog_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Comments of a blog in insertion order
    pub async fn get_comments(&self, blog_id: i64) -> Result<Vec<Comment>, AppError> {
        observe_db_query("select", "comments");
        let comments =
            sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE blog_id = ? ORDER BY id")
                .bind(blog_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(comments)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Insert a like
    ///
    /// # Returns
    /// `None` if this user already liked this blog (unique index hit)
    pub async fn insert_like(&self, user_id: i64, blog_id: i64) -> Result<Option<Like>, AppError> {
        observe_db_query("insert", "likes");
        let result = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (user_id, blog_id, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(blog_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(like) => Ok(Some(like)),
            Err(error) if is_unique_violation(&error) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn count_likes(&self, blog_id: i64) -> Result<i64, AppError> {
        observe_db_query("select", "likes");
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE blog_id = ?")
            .bind(blog_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Blogs with the most likes, highest first
    ///
    /// Ties are broken by ascending blog id.
    pub async fn get_most_liked(&self, limit: i64) -> Result<Vec<BlogLikeCount>, AppError> {
        observe_db_query("select", "likes");
        let counts = sqlx::query_as::<_, BlogLikeCount>(
            r#"
            SELECT blog_id, COUNT(*) AS count
            FROM likes
            GROUP BY blog_id
            ORDER BY count DESC, blog_id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
