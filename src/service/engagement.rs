//! Comments and likes

use std::sync::Arc;

use crate::data::{Comment, Database, Like, User};
use crate::error::AppError;

pub struct EngagementService {
    db: Arc<Database>,
}

impl EngagementService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn ensure_blog_exists(&self, blog_id: i64) -> Result<(), AppError> {
        match self.db.get_blog(blog_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Blog not found")),
        }
    }

    /// Comment on any blog; there is no ownership check
    pub async fn add_comment(
        &self,
        author: &User,
        blog_id: i64,
        content: &str,
    ) -> Result<Comment, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::validation("content is required"));
        }
        self.ensure_blog_exists(blog_id).await?;

        let comment = self.db.insert_comment(author.id, blog_id, content).await?;
        tracing::info!(user_id = author.id, blog_id, comment_id = comment.id, "Comment added");
        Ok(comment)
    }

    /// Comments of a blog, oldest first. Unknown blogs have none.
    pub async fn comments(&self, blog_id: i64) -> Result<Vec<Comment>, AppError> {
        self.db.get_comments(blog_id).await
    }

    /// Like a blog once
    ///
    /// # Errors
    /// `NotFound` if the blog is absent, `Conflict` if already liked
    pub async fn like(&self, liker: &User, blog_id: i64) -> Result<Like, AppError> {
        self.ensure_blog_exists(blog_id).await?;

        let like = self
            .db
            .insert_like(liker.id, blog_id)
            .await?
            .ok_or_else(|| AppError::conflict("Already liked"))?;

        tracing::info!(user_id = liker.id, blog_id, "Blog liked");
        Ok(like)
    }

    pub async fn like_count(&self, blog_id: i64) -> Result<i64, AppError> {
        self.db.count_likes(blog_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NewUser;
    use tempfile::TempDir;

    async fn setup() -> (EngagementService, Arc<Database>, User, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::connect(&temp_dir.path().join("test.db")).await.unwrap());
        let user = db
            .insert_user(&NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (EngagementService::new(db.clone()), db, user, temp_dir)
    }

    #[tokio::test]
    async fn comments_keep_insertion_order() {
        let (service, db, alice, _temp_dir) = setup().await;
        let blog = db.insert_blog(&alice, "T", "P").await.unwrap();

        service.add_comment(&alice, blog.id, "first").await.unwrap();
        service.add_comment(&alice, blog.id, "second").await.unwrap();

        let contents: Vec<String> = service
            .comments(blog.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert!(service.comments(9999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_errors() {
        let (service, db, alice, _temp_dir) = setup().await;
        let blog = db.insert_blog(&alice, "T", "P").await.unwrap();

        assert!(matches!(
            service.add_comment(&alice, blog.id, "  ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.add_comment(&alice, 9999, "hi").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn double_like_conflicts_and_counts_once() {
        let (service, db, alice, _temp_dir) = setup().await;
        let blog = db.insert_blog(&alice, "T", "P").await.unwrap();

        let like = service.like(&alice, blog.id).await.unwrap();
        assert_eq!(like.blog_id, blog.id);

        let again = service.like(&alice, blog.id).await.unwrap_err();
        assert!(matches!(again, AppError::Conflict(ref msg) if msg == "Already liked"));
        assert_eq!(service.like_count(blog.id).await.unwrap(), 1);

        assert!(matches!(
            service.like(&alice, 9999).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.like_count(9999).await.unwrap(), 0);
    }
}
