use sqlx::PgPool;
use tracing::info;

pub async fn clear_saved_articles(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM news.saved_articles
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    info!(deleted, "cleared saved articles");
    Ok(deleted)
}
