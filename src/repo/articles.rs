use sqlx::PgPool;

use super::{NewSavedArticle, SavedArticleRow};

/// `None` when the user already saved this URL.
pub async fn insert_saved_article(
    pool: &PgPool,
    user_id: i64,
    article: NewSavedArticle,
) -> Result<Option<SavedArticleRow>, sqlx::Error> {
    sqlx::query_as::<_, SavedArticleRow>(
        r#"
        INSERT INTO news.saved_articles (
            user_id,
            title,
            url,
            source_name,
            summary,
            published_at,
            saved_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        ON CONFLICT (user_id, url) DO NOTHING
        RETURNING id,
                  user_id,
                  title,
                  url,
                  source_name,
                  summary,
                  published_at,
                  saved_at
        "#,
    )
    .bind(user_id)
    .bind(article.title)
    .bind(article.url)
    .bind(article.source_name)
    .bind(article.summary)
    .bind(article.published_at)
    .fetch_optional(pool)
    .await
}

pub async fn list_saved_articles(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<SavedArticleRow>, sqlx::Error> {
    sqlx::query_as::<_, SavedArticleRow>(
        r#"
        SELECT id,
               user_id,
               title,
               url,
               source_name,
               summary,
               published_at,
               saved_at
        FROM news.saved_articles
        WHERE user_id = $1
        ORDER BY saved_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
