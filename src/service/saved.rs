use chrono::SecondsFormat;

use crate::{
    error::{AppError, AppResult},
    model::{SaveArticlePayload, SavedArticleOut},
    repo::{NewSavedArticle, SavedArticleRow, Store},
};

const MAX_TITLE_CHARS: usize = 255;
const MAX_SOURCE_NAME_CHARS: usize = 100;

pub async fn save(
    store: &dyn Store,
    user_id: i64,
    payload: SaveArticlePayload,
) -> AppResult<SavedArticleOut> {
    let SaveArticlePayload {
        title,
        url,
        source_name,
        summary,
        published_at,
    } = payload;

    let title = title.trim().to_string();
    let url = url.trim().to_string();
    let source_name = source_name.trim().to_string();

    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::BadRequest(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    if source_name.is_empty() {
        return Err(AppError::BadRequest("source_name is required".into()));
    }
    if source_name.chars().count() > MAX_SOURCE_NAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "source_name must be at most {MAX_SOURCE_NAME_CHARS} characters"
        )));
    }
    validate_url(&url)?;

    let row = store
        .save_article(
            user_id,
            NewSavedArticle {
                title,
                url,
                source_name,
                summary,
                published_at,
            },
        )
        .await?;

    tracing::info!(user_id, article_id = row.id, url = %row.url, "article saved");
    Ok(saved_row_to_out(row))
}

pub async fn list(store: &dyn Store, user_id: i64) -> AppResult<Vec<SavedArticleOut>> {
    let rows = store.list_articles(user_id).await?;
    Ok(rows.into_iter().map(saved_row_to_out).collect())
}

fn validate_url(raw: &str) -> AppResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| AppError::BadRequest(format!("url is not a valid URL: {raw}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::BadRequest(format!(
            "url must use http or https, got {other}"
        ))),
    }
}

fn saved_row_to_out(row: SavedArticleRow) -> SavedArticleOut {
    SavedArticleOut {
        id: row.id,
        title: row.title,
        url: row.url,
        source_name: row.source_name,
        summary: row.summary,
        published_at: row.published_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        saved_at: row.saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
