use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Post record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub image_key: Option<String>,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub text: Option<String>,
}

impl Post {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, text, image_key, author_id, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, text, image_key, author_id, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    pub async fn create(
        db: &PgPool,
        author_id: Uuid,
        title: &str,
        text: &str,
    ) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, text, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, text, image_key, author_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(text)
        .bind(author_id)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: PostChanges,
    ) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                text = COALESCE($3, text),
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, text, image_key, author_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.text)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    pub async fn set_image_key(
        db: &PgPool,
        id: Uuid,
        image_key: Option<&str>,
    ) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET image_key = $2,
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, text, image_key, author_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(image_key)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    /// Comments on the post go with it via `ON DELETE CASCADE`.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
