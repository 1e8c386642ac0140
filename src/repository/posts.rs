//! Social wall repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::not_found_on_foreign_key;
use crate::{
    error::{AppError, AppResult},
    models::post::{Comment, NewPost, Post},
};

const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.body, p.image, p.created_at,
           COALESCE(
               (SELECT array_agg(l.student_id ORDER BY l.student_id)
                FROM post_likes l WHERE l.post_id = p.id),
               '{}'
           ) AS likes
    FROM posts p
"#;

#[derive(Clone)]
pub struct PostsRepository {
    pool: Pool<Postgres>,
}

impl PostsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Post> {
        sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} ORDER BY p.created_at DESC, p.id DESC LIMIT $1 OFFSET $2",
            POST_SELECT
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn create(&self, author_id: i32, post: &NewPost, at: DateTime<Utc>) -> AppResult<Post> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO posts (author_id, body, image, created_at) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(author_id)
        .bind(&post.body)
        .bind(&post.image)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Post {
            id,
            author_id,
            body: post.body.clone(),
            image: post.image.clone(),
            created_at: at,
            likes: Vec::new(),
        })
    }

    /// Delete a post with its comments and likes (cascade)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn create_comment(
        &self,
        post_id: i32,
        author_id: i32,
        body: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, body, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(body)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_on_foreign_key(e, || format!("Post with id {} not found", post_id)))
    }

    pub async fn comments(&self, post_id: i32) -> AppResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = $1 ORDER BY created_at, id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    /// Remove the like if present, otherwise add it
    pub async fn toggle_like(&self, post_id: i32, student_id: i32) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND student_id = $2")
            .bind(post_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO post_likes (post_id, student_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| not_found_on_foreign_key(e, || format!("Post with id {} not found", post_id)))?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }
}
