use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::ValidationError;

/// Public prefix under which stored media is served.
pub const MEDIA_URL: &str = "/media/";

const RECIPE_IMAGE_DIR: &str = "recipes/images";

/// An uploaded image after base64 decoding and format sniffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Decodes `data:image/<fmt>;base64,<payload>` or a bare base64 payload.
///
/// The stored format is taken from the decoded bytes, not from the declared
/// media type.
pub fn decode_image(data: &str) -> Result<DecodedImage, ValidationError> {
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or(ValidationError::InvalidImage)?;
            if !header.starts_with("image/") || !header.ends_with(";base64") {
                return Err(ValidationError::InvalidImage);
            }
            payload
        }
        None => data,
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| ValidationError::InvalidImage)?;
    let extension = sniff_extension(&bytes).ok_or(ValidationError::InvalidImage)?;

    Ok(DecodedImage { extension, bytes })
}

/// Public URL of a stored image reference.
pub fn media_url(image_ref: &str) -> String {
    format!("{MEDIA_URL}{image_ref}")
}

/// Filesystem-backed storage for uploaded recipe images.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the image under a fresh name and returns its reference
    /// relative to the media root.
    pub async fn save_image(&self, image: &DecodedImage) -> std::io::Result<String> {
        let dir = self.root.join(RECIPE_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

        Ok(format!("{RECIPE_IMAGE_DIR}/{file_name}"))
    }

    pub async fn remove(&self, image_ref: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(image_ref)).await {
            tracing::warn!(image = image_ref, "Failed to remove stored image: {e}");
        }
    }
}
