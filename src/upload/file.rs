//! Candidate upload files
//!
//! An [`ImageFile`] carries what a browser `File` would: a name, a declared
//! MIME type, and a size. The bytes themselves are only read when the image
//! is encoded for the first turn.

use bytes::Bytes;
use std::path::{Path, PathBuf};

/// MIME type reported for files whose extension is not recognized
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Where the bytes of an upload live
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// On disk; read lazily
    Path(PathBuf),
    /// Already in memory
    Memory(Bytes),
}

/// A candidate upload awaiting validation
#[derive(Debug, Clone)]
pub struct ImageFile {
    name: String,
    mime_type: String,
    size: u64,
    source: ImageSource,
}

impl ImageFile {
    /// Describe a file on disk
    ///
    /// The declared type comes from the extension and the size from file
    /// metadata. Nothing else is read yet.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file metadata cannot be read
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            mime_type: mime_type_for_path(path).to_string(),
            size: metadata.len(),
            source: ImageSource::Path(path.to_path_buf()),
        })
    }

    /// Describe an in-memory upload with an explicit declared type
    ///
    /// # Examples
    ///
    /// ```
    /// use describo::upload::ImageFile;
    ///
    /// let file = ImageFile::from_bytes("dot.png", "image/png", vec![1, 2, 3]);
    /// assert_eq!(file.size(), 3);
    /// assert_eq!(file.mime_type(), "image/png");
    /// ```
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            source: ImageSource::Memory(bytes),
        }
    }

    /// File name as shown to the user
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Backing source
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Read the full contents
    pub async fn read_bytes(&self) -> std::io::Result<Bytes> {
        match &self.source {
            ImageSource::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
            ImageSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    /// Best-effort pixel dimensions, read from the image header only
    pub fn probe_dimensions(&self) -> Option<(u32, u32)> {
        match &self.source {
            ImageSource::Path(path) => image::image_dimensions(path).ok(),
            ImageSource::Memory(bytes) => image::ImageReader::new(std::io::Cursor::new(bytes))
                .with_guessed_format()
                .ok()?
                .into_dimensions()
                .ok(),
        }
    }
}

/// Declared MIME type for a path, derived from its extension
///
/// # Examples
///
/// ```
/// use describo::upload::mime_type_for_path;
/// use std::path::Path;
///
/// assert_eq!(mime_type_for_path(Path::new("cat.JPG")), "image/jpeg");
/// assert_eq!(mime_type_for_path(Path::new("notes.txt")), "text/plain");
/// ```
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => UNKNOWN_MIME_TYPE,
    }
}
