//! Upload-and-annotate handlers
//!
//! `GET /` shows the upload form. `POST /` stores the uploaded image, runs the
//! analyzer on it and renders the result next to the explanation images.

use axum::extract::{Multipart, State};
use axum::response::Html;

use crate::error::ApiError;
use crate::render::{render_page, INSTRUCTIONS, UPLOAD_FIELD};
use crate::sanitize::secure_filename;
use crate::state::AppState;

/// GET /
/// Show the upload form
pub async fn show_form() -> Html<String> {
    Html(render_page(INSTRUCTIONS, None))
}

/// POST /
/// Store an image, analyze it and render the result
pub async fn upload_and_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((original_name, data));
        break;
    }

    let (original_name, data) = upload.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing file field '{}'", UPLOAD_FIELD))
    })?;

    let filename = secure_filename(&original_name);
    if filename.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Unusable file name: {:?}",
            original_name
        )));
    }

    tracing::info!(
        original = %original_name,
        filename = %filename,
        size = data.len(),
        "File uploaded"
    );

    state.store().save(&filename, &data).await?;

    let out = state
        .analyzer()
        .analyze(state.store().dir(), &filename)
        .await?;

    tracing::info!(filename = %filename, "Analysis finished");

    let paths = state.explanations().paths();
    Ok(Html(render_page(&out, Some(&paths))))
}
