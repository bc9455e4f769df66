use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Directory under the media root that holds listing images
pub const LISTING_IMAGES_DIR: &str = "listing_images";

/// Longest file extension carried over from an uploaded file name
const MAX_EXTENSION_LEN: usize = 8;

/// Local filesystem storage for uploaded image files
///
/// Files live under `root` and are served at `url_prefix`; the database only
/// ever records paths relative to `root`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    /// Creates a store rooted at `root`, served under `url_prefix`
    ///
    /// The prefix is normalised to start and end with a slash.
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let trimmed = url_prefix.trim_matches('/');
        let url_prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };

        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Gets the directory files are written under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Gets the URL path the root is served at, e.g. `/media/`
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Writes an uploaded image and returns its path relative to the root
    ///
    /// The stored name is a fresh UUID so uploads never collide or escape the
    /// images directory; only a short alphanumeric extension is kept from
    /// the client's file name.
    ///
    /// ### Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn store_image(&self, original_name: Option<&str>, data: &[u8]) -> Result<String> {
        let dir = self.root.join(LISTING_IMAGES_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating media directory {}", dir.display()))?;

        let file_name = match original_name.and_then(safe_extension) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = dir.join(&file_name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("writing image {}", path.display()))?;

        debug!("Stored image at {}", path.display());
        Ok(format!("{}/{}", LISTING_IMAGES_DIR, file_name))
    }

    /// Builds the URL path for a stored file
    pub fn url_for(&self, relative_path: &str) -> String {
        format!("{}{}", self.url_prefix, relative_path.trim_start_matches('/'))
    }
}

/// Lowercase extension of a client file name, if it is short and alphanumeric
fn safe_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
