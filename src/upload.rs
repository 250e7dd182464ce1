use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};

use crate::errors::ApiError;

/// Name of the multipart file field carrying a picture.
pub const IMAGE_FIELD: &str = "image";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const ALLOWED_MIME_TYPES: [&str; 5] = ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

/// UploadedImage
///
/// A picture received in the `image` field, already checked for type and size.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    /// Lowercase extension for the stored file: taken from the original name when it is an
    /// allowed image extension, otherwise derived from the MIME type.
    pub fn extension(&self) -> &'static str {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        if let Some(ext) = from_name {
            if let Some(allowed) = ALLOWED_EXTENSIONS.iter().find(|a| **a == ext.as_str()) {
                return *allowed;
            }
        }
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// MultipartForm
///
/// The text fields and optional picture of an admin form submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl MultipartForm {
    /// read
    ///
    /// Drains the multipart stream. Text fields are collected by name (last one wins); a file
    /// in the `image` field must be an image no larger than `max_bytes`. Other file fields and
    /// empty file parts (a form submitted without choosing a picture) are skipped.
    pub async fn read(mut multipart: Multipart, max_bytes: usize) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_none() {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
                continue;
            }

            if name != IMAGE_FIELD {
                tracing::debug!(field = %name, "skipping unexpected file field");
                continue;
            }

            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_ascii_lowercase();
            let bytes = field.bytes().await.map_err(multipart_error)?;

            if bytes.is_empty() {
                continue;
            }
            if bytes.len() > max_bytes {
                return Err(ApiError::PayloadTooLarge("File too large".to_string()));
            }

            let image = UploadedImage {
                file_name,
                content_type,
                bytes,
            };
            if !is_allowed_image(&image) {
                return Err(ApiError::bad_request("Only image files are allowed"));
            }
            form.image = Some(image);
        }

        Ok(form)
    }

    /// Value of a text field, if it was submitted.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn insert_text(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }
}

/// Both the declared MIME type and, when present, the file extension must name an image.
fn is_allowed_image(image: &UploadedImage) -> bool {
    let mime_ok = ALLOWED_MIME_TYPES.contains(&image.content_type.as_str());
    let ext_ok = match image.file_name.as_deref().and_then(|n| n.rsplit_once('.')) {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    };
    mime_ok && ext_ok
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File too large".to_string())
    } else {
        ApiError::bad_request(err.body_text())
    }
}
