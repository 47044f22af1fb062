//! Upload storage for identity documents and images.
//!
//! Files are written below a base directory (`public/uploads` by default) and
//! served statically under a base URL.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// The upload slots accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Volunteer identity card scan.
    NricImage,
    /// Organiser registration certificate.
    CertificationDocument,
    /// Avatar for any account.
    ProfilePicture,
    /// Event banner.
    EventImage,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

impl UploadKind {
    /// Multipart field name carrying this upload.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::NricImage => "nric_image",
            Self::CertificationDocument => "certification_document",
            Self::ProfilePicture => "profile_picture",
            Self::EventImage => "event_image",
        }
    }

    /// Inverse of [`Self::field_name`].
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "nric_image" => Some(Self::NricImage),
            "certification_document" => Some(Self::CertificationDocument),
            "profile_picture" => Some(Self::ProfilePicture),
            "event_image" => Some(Self::EventImage),
            _ => None,
        }
    }

    /// Sub-directory under the upload root.
    #[must_use]
    pub const fn directory(self) -> &'static str {
        match self {
            Self::NricImage => "nric",
            Self::CertificationDocument => "certifications",
            Self::ProfilePicture => "profiles",
            Self::EventImage => "events",
        }
    }

    /// Identity documents may also be PDFs.
    #[must_use]
    pub const fn accepts_pdf(self) -> bool {
        matches!(self, Self::NricImage | Self::CertificationDocument)
    }

    /// Check extension and mimetype against the allow-list.
    pub fn check_file_type(self, file_name: &str, content_type: &str) -> AppResult<()> {
        let extension = file_extension(file_name)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content_type = content_type.to_ascii_lowercase();

        let pdf = self.accepts_pdf() && extension == "pdf" && content_type == "application/pdf";
        let image = IMAGE_EXTENSIONS.contains(&extension.as_str())
            && IMAGE_MIME_TYPES.contains(&content_type.as_str());

        if pdf || image {
            Ok(())
        } else if self.accepts_pdf() {
            Err(AppError::BadRequest(
                "Only image files (jpg, jpeg, png, gif, webp) and PDF documents are allowed"
                    .to_string(),
            ))
        } else {
            Err(AppError::BadRequest(
                "Only image files (jpg, jpeg, png, gif, webp) are allowed".to_string(),
            ))
        }
    }
}

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key relative to the upload root.
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

fn file_extension(file_name: &str) -> Option<&str> {
    file_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < file_name.len() - 1)
        .map(|pos| &file_name[pos + 1..])
}

/// Generate a unique storage key for an upload.
///
/// Keys look like `nric/<owner>_<millis>_<uuid>.png`.
#[must_use]
pub fn generate_storage_key(kind: UploadKind, owner_id: &str, original_name: &str) -> String {
    let extension = file_extension(original_name)
        .filter(|ext| ext.len() <= 10)
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!(
        "{}/{}_{}_{}.{}",
        kind.directory(),
        owner_id,
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4(),
        extension
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key(UploadKind::NricImage, "user123", "Scan.PNG");
        assert!(key.starts_with("nric/user123_"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key(UploadKind::ProfilePicture, "user123", "file");
        assert!(key.starts_with("profiles/"));
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_field_names() {
        for kind in [
            UploadKind::NricImage,
            UploadKind::CertificationDocument,
            UploadKind::ProfilePicture,
            UploadKind::EventImage,
        ] {
            assert_eq!(UploadKind::from_field_name(kind.field_name()), Some(kind));
        }
        assert_eq!(UploadKind::from_field_name("file"), None);
    }

    #[test]
    fn test_pdf_only_for_identity_documents() {
        assert!(
            UploadKind::NricImage
                .check_file_type("nric.pdf", "application/pdf")
                .is_ok()
        );
        assert!(
            UploadKind::CertificationDocument
                .check_file_type("cert.pdf", "application/pdf")
                .is_ok()
        );
        assert!(
            UploadKind::EventImage
                .check_file_type("poster.pdf", "application/pdf")
                .is_err()
        );
    }

    #[test]
    fn test_extension_and_mimetype_must_both_match() {
        assert!(
            UploadKind::ProfilePicture
                .check_file_type("me.JPG", "image/jpeg")
                .is_ok()
        );
        assert!(
            UploadKind::ProfilePicture
                .check_file_type("me.jpg", "text/html")
                .is_err()
        );
        assert!(
            UploadKind::ProfilePicture
                .check_file_type("me.exe", "image/png")
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("vhub-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "/uploads/".to_string());

        let uploaded = storage
            .upload("events/a.png", b"png-bytes", "image/png")
            .await
            .unwrap();
        assert_eq!(uploaded.url, "/uploads/events/a.png");
        assert_eq!(uploaded.size, 9);
        assert!(dir.join("events/a.png").exists());

        storage.delete("events/a.png").await.unwrap();
        assert!(!dir.join("events/a.png").exists());

        tokio::fs::remove_dir_all(dir).await.ok();
    }
}
