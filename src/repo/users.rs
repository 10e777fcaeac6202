use sqlx::{PgPool, Postgres, Transaction};

use super::{NewUser, UserRow};

/// `None` when the username is taken.
pub async fn insert_user(pool: &PgPool, user: NewUser) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO news.users (username, email, password_hash, created_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (username) DO NOTHING
        RETURNING id, username, email, password_hash, created_at
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, created_at
        FROM news.users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, created_at
        FROM news.users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Deletes the user; saved articles go with it through the cascading foreign key.
pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<Option<u64>, sqlx::Error> {
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

    let owned = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM news.saved_articles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(tx.as_mut())
    .await?;

    let deleted = sqlx::query(
        r#"
        DELETE FROM news.users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(tx.as_mut())
    .await?
    .rows_affected();

    tx.commit().await?;

    Ok((deleted > 0).then_some(owned.max(0) as u64))
}
