//! Blog service
//!
//! Owner-scoped blog CRUD behind the read cache, plus the public
//! "with meta" and popularity views.

use std::sync::Arc;

use chrono::Utc;

use crate::data::cache::keys;
use crate::data::{Blog, BlogCache, BlogWithMeta, Database, User};
use crate::error::AppError;
use crate::metrics::BLOG_WRITES_TOTAL;

/// Number of blogs in the popularity list
pub const POPULAR_LIMIT: i64 = 5;

/// Fields of an update; `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub post: Option<String>,
}

fn non_blank(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|value| !value.is_empty())
}

/// Blog service
pub struct BlogService {
    db: Arc<Database>,
    cache: Arc<BlogCache>,
}

impl BlogService {
    /// Create new blog service
    pub fn new(db: Arc<Database>, cache: Arc<BlogCache>) -> Self {
        Self { db, cache }
    }

    /// List the owner's blogs, optionally filtered by a title substring
    ///
    /// Read-through: served from the cache when possible, otherwise loaded
    /// from the database and cached.
    pub async fn list(&self, owner: &User, title: Option<&str>) -> Result<Vec<Blog>, AppError> {
        let title = non_blank(title);
        let key = keys::blog_list(owner.id, title);

        if let Some(blogs) = self.cache.get::<Vec<Blog>>(&key).await {
            return Ok(blogs);
        }

        let blogs = self.db.get_user_blogs(owner.id, title).await?;
        self.cache.put(&key, &blogs).await;
        Ok(blogs)
    }

    /// Get one of the owner's blogs
    ///
    /// # Errors
    /// `NotFound` if the blog does not exist or belongs to someone else
    pub async fn get(&self, owner: &User, blog_id: i64) -> Result<Blog, AppError> {
        let key = keys::user_blog(owner.id, blog_id);

        if let Some(blog) = self.cache.get::<Blog>(&key).await {
            return Ok(blog);
        }

        let blog = self.owned(owner, blog_id).await?;
        self.cache.put(&key, &blog).await;
        Ok(blog)
    }

    async fn owned(&self, owner: &User, blog_id: i64) -> Result<Blog, AppError> {
        self.db
            .get_user_blog(blog_id, owner.id)
            .await?
            .ok_or_else(|| AppError::not_found("Blog not found"))
    }

    pub async fn create(&self, owner: &User, title: &str, post: &str) -> Result<Blog, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }

        let blog = self.db.insert_blog(owner, title, post).await?;
        self.cache.invalidate_user_blogs(owner.id, None).await;

        BLOG_WRITES_TOTAL.with_label_values(&["create"]).inc();
        tracing::info!(user_id = owner.id, blog_id = blog.id, "Blog created");
        Ok(blog)
    }

    /// Apply `changes` to one of the owner's blogs
    ///
    /// # Errors
    /// `NotFound` if not owned, `Validation` if the new title is blank
    pub async fn update(
        &self,
        owner: &User,
        blog_id: i64,
        changes: BlogChanges,
    ) -> Result<Blog, AppError> {
        let mut blog = self.owned(owner, blog_id).await?;

        if let Some(title) = changes.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::validation("title must not be blank"));
            }
            blog.title = title.to_string();
        }
        if let Some(post) = changes.post {
            blog.post = post;
        }
        blog.updated_at = Utc::now();

        // A concurrent delete between the read and the write leaves nothing to update
        let updated = self
            .db
            .update_blog(&blog)
            .await?
            .ok_or_else(|| AppError::not_found("Blog not found"))?;
        self.cache.invalidate_user_blogs(owner.id, Some(blog_id)).await;

        BLOG_WRITES_TOTAL.with_label_values(&["update"]).inc();
        tracing::info!(user_id = owner.id, blog_id, "Blog updated");
        Ok(updated)
    }

    /// Delete one of the owner's blogs
    ///
    /// # Returns
    /// The blog as it was before deletion
    pub async fn delete(&self, owner: &User, blog_id: i64) -> Result<Blog, AppError> {
        let blog = self.owned(owner, blog_id).await?;

        if !self.db.delete_blog(blog_id, owner.id).await? {
            return Err(AppError::not_found("Blog not found"));
        }
        self.cache.invalidate_user_blogs(owner.id, Some(blog_id)).await;

        BLOG_WRITES_TOTAL.with_label_values(&["delete"]).inc();
        tracing::info!(user_id = owner.id, blog_id, "Blog deleted");
        Ok(blog)
    }

    /// Blogs whose title or post contains `search`, with likes and comments
    ///
    /// # Arguments
    /// * `owner` - Restrict to this user's blogs; `None` covers every user
    pub async fn with_meta(
        &self,
        owner: Option<&User>,
        search: Option<&str>,
    ) -> Result<Vec<BlogWithMeta>, AppError> {
        let blogs = self
            .db
            .search_blogs(owner.map(|user| user.id), non_blank(search))
            .await?;

        let mut result = Vec::with_capacity(blogs.len());
        for blog in blogs {
            let likes = self.db.count_likes(blog.id).await?;
            let comments = self.db.get_comments(blog.id).await?;
            result.push(BlogWithMeta::new(blog, likes, comments));
        }

        Ok(result)
    }

    /// The most liked blogs, highest count first
    pub async fn popular(&self) -> Result<Vec<BlogWithMeta>, AppError> {
        let counts = self.db.get_most_liked(POPULAR_LIMIT).await?;

        let mut result = Vec::with_capacity(counts.len());
        for entry in counts {
            let Some(blog) = self.db.get_blog(entry.blog_id).await? else {
                tracing::debug!(blog_id = entry.blog_id, "Skipping vanished popular blog");
                continue;
            };
            let comments = self.db.get_comments(blog.id).await?;
            result.push(BlogWithMeta::new(blog, entry.count, comments));
        }

        Ok(result)
    }
}
