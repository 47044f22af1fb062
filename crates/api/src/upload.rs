//! Multipart upload reading.

use axum::extract::Multipart;
use volunteer_common::{AppError, AppResult, UploadKind};
use volunteer_core::FileUpload;

/// Read the first file field whose name is one of `accepted`.
///
/// Other fields are skipped. The field name decides the upload kind.
pub async fn read_upload(
    multipart: &mut Multipart,
    accepted: &[UploadKind],
) -> AppResult<(UploadKind, FileUpload)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(kind) = field
            .name()
            .and_then(UploadKind::from_field_name)
            .filter(|kind| accepted.contains(kind))
        else {
            continue;
        };

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("Upload is missing a file name".to_string()))?
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
            .to_vec();

        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        return Ok((
            kind,
            FileUpload {
                file_name,
                content_type,
                data,
            },
        ));
    }

    let expected = accepted
        .iter()
        .map(|kind| kind.field_name())
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::BadRequest(format!(
        "No file provided (expected one of: {expected})"
    )))
}
