//! User-supplied media file

use bytes::Bytes;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A file handed over by the upload surface
///
/// `size` is the declared size. For files built from their contents it
/// equals `bytes.len()`; metadata-only files (pickers that stream the
/// contents lazily) carry an empty body and a declared size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub bytes: Bytes,
}

impl MediaFile {
    /// File built from its contents
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Metadata-only file with a declared size
    pub fn declared(name: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size,
            bytes: Bytes::new(),
        }
    }

    /// Lowercased extension without the dot, if the name has one
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Size in mebibytes
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MB
    }

    /// Size as shown next to the file name, e.g. `20.00 MB`
    pub fn display_size(&self) -> String {
        format!("{:.2} MB", self.size_mb())
    }
}
