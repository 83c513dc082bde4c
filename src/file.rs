//! Image file utilities, for uploading gallery pictures.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{CrescendoError, CrescendoResult};

/// Extensions accepted for gallery uploads, compared case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// The URL prefix stored images are served under
pub const UPLOADS_PREFIX: &str = "uploads";

/// An image as received from the client
pub struct ImageFile {
    /// The file name the client sent. Only its extension is kept.
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ImageFile {
    /// The lowercased extension, if it is one of the [ALLOWED_EXTENSIONS].
    pub fn extension(&self) -> CrescendoResult<String> {
        if self.file_name.trim().is_empty() {
            return Err(CrescendoError::Validation("No selected file".to_owned()));
        }

        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .ok_or_else(|| CrescendoError::Validation("The file must have an extension".to_owned()))?;

        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(CrescendoError::Validation(format!(
                "Files of type .{extension} are not allowed, use one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )))
        }
    }

    /// Writes the image under a freshly generated name in `upload_dir`
    /// and returns that name.
    pub async fn save(&self, upload_dir: &Path) -> CrescendoResult<String> {
        let stored_name = format!("{}.{}", Uuid::new_v4().simple(), self.extension()?);

        tokio::fs::create_dir_all(upload_dir).await?;
        tokio::fs::write(upload_dir.join(&stored_name), &self.content).await?;

        Ok(stored_name)
    }

    pub fn relative_path(stored_name: &str) -> String {
        format!("{UPLOADS_PREFIX}/{stored_name}")
    }

    /// Where a stored relative path lives on disk.
    pub fn on_disk(relative_path: &str, upload_dir: &Path) -> Option<PathBuf> {
        let stored_name = relative_path.strip_prefix(UPLOADS_PREFIX)?.trim_start_matches('/');
        let file_name = Path::new(stored_name).file_name()?;

        Some(upload_dir.join(file_name))
    }
}
