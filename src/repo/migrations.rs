use sqlx::{Executor, PgPool};
use tracing::info;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    tx.execute(
        r#"
        CREATE SCHEMA IF NOT EXISTS news;
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS news.users (
          id              BIGSERIAL PRIMARY KEY,
          username        TEXT NOT NULL UNIQUE,
          email           TEXT NOT NULL,
          password_hash   TEXT NOT NULL,
          created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS news.saved_articles (
          id              BIGSERIAL PRIMARY KEY,
          user_id         BIGINT NOT NULL REFERENCES news.users(id) ON DELETE CASCADE,
          title           VARCHAR(255) NOT NULL,
          url             TEXT NOT NULL,
          source_name     VARCHAR(100) NOT NULL,
          summary         TEXT NOT NULL,
          published_at    TIMESTAMPTZ NOT NULL,
          saved_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          CONSTRAINT saved_articles_user_url_key UNIQUE (user_id, url)
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_saved_articles_user_saved_at
          ON news.saved_articles(user_id, saved_at DESC);
        "#,
    )
    .await?;

    tx.commit().await?;
    info!("database schema ready");
    Ok(())
}
