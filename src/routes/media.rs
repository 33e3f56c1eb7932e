//! Media upload: multipart files into the object store, one media row each.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::Media;
use crate::AppState;

pub async fn multiple_upload(
    State(s): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Vec<Media>>)> {
    let mut saved = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        // Non-file parts (e.g. visibility flags) are skipped here.
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;

        let stored = s
            .media
            .put(&filename, &content_type, &bytes)
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        let row = sqlx::query_as::<_, Media>(
            "INSERT INTO media (id, url, mime_type, visibility) VALUES ($1, $2, $3, 'PUBLIC') RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&stored.url)
        .bind(&content_type)
        .fetch_one(&s.db)
        .await?;
        tracing::debug!(url = %row.url, "stored media object");
        saved.push(row);
    }

    if saved.is_empty() {
        return Err(ApiError::validation("no files uploaded"));
    }
    Ok((StatusCode::CREATED, Json(saved)))
}
