use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Comment record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Comment {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, text, author_id, post_id, created_at, updated_at
            FROM comments
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

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, text, author_id, post_id, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(comment)
    }

    pub async fn create(
        db: &PgPool,
        author_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (text, author_id, post_id)
            VALUES ($1, $2, $3)
            RETURNING id, text, author_id, post_id, created_at, updated_at
            "#,
        )
        .bind(text)
        .bind(author_id)
        .bind(post_id)
        .fetch_one(db)
        .await?;
        Ok(comment)
    }

    pub async fn update_text(db: &PgPool, id: Uuid, text: &str) -> anyhow::Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET text = $2,
                updated_at = now()
            WHERE id = $1
            RETURNING id, text, author_id, post_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(db)
        .await?;
        Ok(comment)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
