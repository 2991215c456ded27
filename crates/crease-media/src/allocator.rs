//! Playback URL allocation

use std::collections::HashSet;
use std::fmt;

use crease_core::{CreaseError, CreaseResult, MediaFile};

/// A short-lived playback handle, valid until revoked
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlaybackUrl(String);

impl PlaybackUrl {
    pub fn new(url: impl Into<String>) -> Self {
        PlaybackUrl(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlaybackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Url({})", self.0)
    }
}

impl fmt::Display for PlaybackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform facility that turns a file into a playable URL
pub trait UrlAllocator: Send {
    /// Create a URL for `file`. Fails only when the platform cannot allocate one.
    fn create(&mut self, file: &MediaFile) -> CreaseResult<PlaybackUrl>;

    /// Revoke a URL previously returned by `create`
    fn revoke(&mut self, url: &PlaybackUrl);
}

/// In-process allocator minting `blob:` URLs
///
/// An optional capacity bounds the number of simultaneously live URLs;
/// `create` fails once it is reached.
pub struct BlobUrlAllocator {
    origin: String,
    next: u64,
    live: HashSet<PlaybackUrl>,
    capacity: Option<usize>,
}

impl BlobUrlAllocator {
    pub fn new() -> Self {
        Self::with_origin("crease")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        BlobUrlAllocator {
            origin: origin.into(),
            next: 0,
            live: HashSet::new(),
            capacity: None,
        }
    }

    /// Bound the number of live URLs
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Number of URLs created and not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, url: &PlaybackUrl) -> bool {
        self.live.contains(url)
    }
}

impl Default for BlobUrlAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlAllocator for BlobUrlAllocator {
    fn create(&mut self, file: &MediaFile) -> CreaseResult<PlaybackUrl> {
        if let Some(cap) = self.capacity {
            if self.live.len() >= cap {
                return Err(CreaseError::MediaUnavailable(format!(
                    "cannot allocate URL for {}: {} of {} in use",
                    file.name,
                    self.live.len(),
                    cap
                )));
            }
        }

        self.next += 1;
        let url = PlaybackUrl::new(format!("blob:{}/{}", self.origin, self.next));
        self.live.insert(url.clone());
        Ok(url)
    }

    fn revoke(&mut self, url: &PlaybackUrl) {
        if !self.live.remove(url) {
            tracing::warn!(%url, "revoke of unknown playback URL");
        }
    }
}
