//! Document upload endpoint

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{UploadResponse, DEFAULT_SUBJECT};

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

/// Optional multipart field carrying the subject tag
const SUBJECT_FIELD: &str = "subject";

/// POST /api/v1/upload - Store and ingest one document
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut file: Option<(String, Bytes)> = None;
    let mut subject: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) if file.is_none() => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| Error::Validation("file field must carry a file name".to_string()))?;

                // Refuse unsupported types before reading the body
                if !state.engine().config().documents.is_supported(&filename) {
                    return Err(Error::UnsupportedFileType(format!(
                        "Only {} files are supported",
                        state.engine().config().documents.supported_extensions.join(", ")
                    )));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read file: {}", e)))?;
                file = Some((filename, data));
            }
            Some(SUBJECT_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read subject: {}", e)))?;
                subject = Some(text);
            }
            _ => continue,
        }
    }

    let (filename, data) =
        file.ok_or_else(|| Error::Validation(format!("missing multipart field '{}'", FILE_FIELD)))?;
    let subject = subject.as_deref().unwrap_or(DEFAULT_SUBJECT);

    tracing::info!("Upload received: {} ({} bytes, subject {})", filename, data.len(), subject);
    let response = state.engine().upload_with_subject(&filename, &data, subject).await?;
    Ok(Json(response))
}
