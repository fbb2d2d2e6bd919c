//! Represents a stored file and the HTTP bodies derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata record persisted next to every stored blob.
///
/// Serialized as `{base}/metadata/{id}.json`; the field names are part of the
/// on-disk format and must not change.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileMetadata {
    /// Generated identifier (hyphenated UUID v4).
    pub id: String,

    /// Client-supplied filename after sanitization. May be empty.
    pub original_name: String,

    /// Content type exactly as supplied at upload time. May be empty.
    pub content_type: String,

    /// Size of the blob in bytes.
    pub size: u64,

    /// Suffix of the blob file name, including the leading dot.
    pub extension: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileMetadata {
    /// Public download path for this file.
    pub fn url(&self) -> String {
        format!("/api/v1/files/{}", self.id)
    }
}

/// Body returned by `POST /api/v1/files`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileUploadResponse {
    pub id: String,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    pub extension: String,
    pub url: String,
}

impl From<&FileMetadata> for FileUploadResponse {
    fn from(meta: &FileMetadata) -> Self {
        Self {
            id: meta.id.clone(),
            original_name: meta.original_name.clone(),
            content_type: meta.content_type.clone(),
            size: meta.size,
            extension: meta.extension.clone(),
            url: meta.url(),
        }
    }
}

/// Body returned by `GET /api/v1/files/{id}/info`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileInfoResponse {
    pub id: String,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    pub extension: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

impl From<FileMetadata> for FileInfoResponse {
    fn from(meta: FileMetadata) -> Self {
        let url = meta.url();
        Self {
            id: meta.id,
            original_name: meta.original_name,
            content_type: meta.content_type,
            size: meta.size,
            extension: meta.extension,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_serializes_with_on_disk_field_names() {
        let now = Utc::now();
        let meta = FileMetadata {
            id: "5b7c3c52-5a6e-4f7e-9d4a-0e2f0c9e1a11".into(),
            original_name: "photo.png".into(),
            content_type: "image/png".into(),
            size: 3,
            extension: ".png".into(),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&meta).unwrap();
        let obj = value.as_object().unwrap();
        for field in [
            "id",
            "original_name",
            "content_type",
            "size",
            "extension",
            "created_at",
            "updated_at",
        ] {
            assert!(obj.contains_key(field), "missing field {field}");
        }
        assert_eq!(obj.len(), 7);

        let created = obj["created_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn upload_response_carries_download_url() {
        let now = Utc::now();
        let meta = FileMetadata {
            id: "abc".into(),
            original_name: String::new(),
            content_type: String::new(),
            size: 0,
            extension: ".bin".into(),
            created_at: now,
            updated_at: now,
        };

        let resp = FileUploadResponse::from(&meta);
        assert_eq!(resp.url, "/api/v1/files/abc");
    }
}
