//! Media resource manager
//!
//! Owns the user's file and its playback URL for the lifetime of one
//! results view. Every URL created is revoked exactly once, after the
//! playback surface has let go of it.

use std::collections::HashMap;

use crease_core::{CreaseResult, MediaFile, MediaId};

use crate::{BlobUrlAllocator, PlaybackSurface, PlaybackUrl, UrlAllocator};

/// A user file together with the URL it is played from
#[derive(Debug, Clone)]
pub struct MediaResource {
    pub id: MediaId,
    pub file: MediaFile,
    pub url: PlaybackUrl,
}

/// Ownership token for one acquired resource
///
/// Not `Clone`: `release` consumes it, so a handle can be released at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a media handle must be released"]
pub struct MediaHandle {
    id: MediaId,
    url: PlaybackUrl,
}

impl MediaHandle {
    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn url(&self) -> &PlaybackUrl {
        &self.url
    }
}

/// Create/revoke ledger
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaStats {
    pub created: u64,
    pub revoked: u64,
    pub failed: u64,
}

impl MediaStats {
    /// Every created URL has been revoked
    pub fn is_balanced(&self) -> bool {
        self.created == self.revoked
    }
}

/// Media resource manager
pub struct MediaManager {
    allocator: Box<dyn UrlAllocator>,
    live: HashMap<MediaId, MediaResource>,
    next_id: u64,
    stats: MediaStats,
}

impl MediaManager {
    /// Manager backed by the in-process blob allocator
    pub fn new() -> Self {
        Self::with_allocator(Box::new(BlobUrlAllocator::new()))
    }

    pub fn with_allocator(allocator: Box<dyn UrlAllocator>) -> Self {
        MediaManager {
            allocator,
            live: HashMap::new(),
            next_id: 0,
            stats: MediaStats::default(),
        }
    }

    /// Create a playback URL for `file`
    pub fn acquire(&mut self, file: &MediaFile) -> CreaseResult<MediaHandle> {
        let url = match self.allocator.create(file) {
            Ok(url) => url,
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(file = %file.name, error = %e, "media acquisition failed");
                return Err(e);
            }
        };

        self.next_id += 1;
        let id = MediaId::new(self.next_id);
        self.stats.created += 1;
        self.live.insert(
            id,
            MediaResource {
                id,
                file: file.clone(),
                url: url.clone(),
            },
        );

        tracing::debug!(media = %id, %url, size = file.size, "media acquired");
        Ok(MediaHandle { id, url })
    }

    /// Release a resource. The surface is detached first if it still plays
    /// this URL; only then is the URL revoked.
    pub fn release(&mut self, handle: MediaHandle, surface: &mut PlaybackSurface) {
        if surface.source() == Some(&handle.url) {
            surface.detach();
        }

        match self.live.remove(&handle.id) {
            Some(resource) => self.revoke(resource),
            None => tracing::debug!(media = %handle.id, "media already released"),
        }
    }

    /// Release every live resource (teardown)
    pub fn release_all(&mut self, surface: &mut PlaybackSurface) {
        let bound = surface
            .source()
            .map_or(false, |url| self.live.values().any(|r| &r.url == url));
        if bound {
            surface.detach();
        }

        let ids: Vec<MediaId> = self.live.keys().copied().collect();
        for id in ids {
            if let Some(resource) = self.live.remove(&id) {
                self.revoke(resource);
            }
        }
    }

    fn revoke(&mut self, resource: MediaResource) {
        self.allocator.revoke(&resource.url);
        self.stats.revoked += 1;
        tracing::debug!(media = %resource.id, url = %resource.url, "media released");
    }

    /// Look up the resource behind a handle
    pub fn resource(&self, handle: &MediaHandle) -> Option<&MediaResource> {
        self.live.get(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self) -> &MediaStats {
        &self.stats
    }
}

impl Default for MediaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MediaManager {
    fn drop(&mut self) {
        if self.live.is_empty() {
            return;
        }
        tracing::warn!(live = self.live.len(), "media manager dropped with live resources");
        let resources: Vec<MediaResource> = self.live.drain().map(|(_, r)| r).collect();
        for resource in resources {
            self.revoke(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crease_core::CreaseError;
    use parking_lot::Mutex;

    use crate::SourceWatch;

    fn clip() -> MediaFile {
        MediaFile::declared("swing.mp4", "video/mp4", 20 * 1024 * 1024)
    }

    /// Allocator that records the order of calls and whether the
    /// watched surface still played a URL when it was revoked
    struct Recording {
        log: Arc<Mutex<Vec<String>>>,
        next: u64,
        watch: Option<SourceWatch>,
    }

    impl Recording {
        fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
            Recording {
                log,
                next: 0,
                watch: None,
            }
        }

        fn watching(mut self, watch: SourceWatch) -> Self {
            self.watch = Some(watch);
            self
        }
    }

    impl UrlAllocator for Recording {
        fn create(&mut self, _file: &MediaFile) -> CreaseResult<PlaybackUrl> {
            self.next += 1;
            let url = PlaybackUrl::new(format!("blob:test/{}", self.next));
            self.log.lock().push(format!("create {}", url));
            Ok(url)
        }

        fn revoke(&mut self, url: &PlaybackUrl) {
            let bound = self.watch.as_ref().map_or(false, |w| w.is_bound_to(url));
            if bound {
                self.log.lock().push(format!("revoke {} while bound", url));
            } else {
                self.log.lock().push(format!("revoke {}", url));
            }
        }
    }

    #[test]
    fn test_acquire_release_balanced() {
        let mut manager = MediaManager::new();
        let mut surface = PlaybackSurface::default();

        let handle = manager.acquire(&clip()).unwrap();
        assert_eq!(manager.live_count(), 1);
        assert_eq!(manager.resource(&handle).unwrap().file.name, "swing.mp4");

        surface.attach(handle.url().clone());
        manager.release(handle, &mut surface);

        assert_eq!(manager.live_count(), 0);
        assert!(manager.stats().is_balanced());
        assert!(!surface.is_attached());
    }

    #[test]
    fn test_release_detaches_before_revoke() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut surface = PlaybackSurface::default();
        let mut manager = MediaManager::with_allocator(Box::new(
            Recording::new(log.clone()).watching(surface.watch()),
        ));

        let handle = manager.acquire(&clip()).unwrap();
        surface.attach(handle.url().clone());
        manager.release(handle, &mut surface);

        assert!(surface.source().is_none());
        assert_eq!(
            *log.lock(),
            vec!["create blob:test/1".to_string(), "revoke blob:test/1".to_string()]
        );
    }

    #[test]
    fn test_release_all_detaches_before_revoke() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut surface = PlaybackSurface::default();
        let mut manager = MediaManager::with_allocator(Box::new(
            Recording::new(log.clone()).watching(surface.watch()),
        ));

        let handle = manager.acquire(&clip()).unwrap();
        surface.attach(handle.url().clone());
        manager.release_all(&mut surface);

        assert!(log.lock().iter().all(|entry| !entry.ends_with("while bound")));
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_watching_allocator_flags_bound_revoke() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut surface = PlaybackSurface::default();
        let mut allocator = Recording::new(log.clone()).watching(surface.watch());

        let url = allocator.create(&clip()).unwrap();
        surface.attach(url.clone());
        allocator.revoke(&url);
        assert_eq!(log.lock().last().map(String::as_str), Some("revoke blob:test/1 while bound"));
    }

    #[test]
    fn test_release_leaves_foreign_surface_alone() {
        let mut manager = MediaManager::new();
        let mut surface = PlaybackSurface::default();
        surface.attach(PlaybackUrl::new("blob:elsewhere/9"));

        let handle = manager.acquire(&clip()).unwrap();
        manager.release(handle, &mut surface);

        assert_eq!(surface.source().map(|u| u.as_str()), Some("blob:elsewhere/9"));
    }

    #[test]
    fn test_failed_acquire_counted() {
        let mut manager =
            MediaManager::with_allocator(Box::new(BlobUrlAllocator::new().with_capacity(0)));
        let err = manager.acquire(&clip()).unwrap_err();
        assert!(matches!(err, CreaseError::MediaUnavailable(_)));
        assert_eq!(manager.stats().failed, 1);
        assert_eq!(manager.stats().created, 0);
    }

    #[test]
    fn test_release_all() {
        let mut manager = MediaManager::new();
        let mut surface = PlaybackSurface::default();

        let a = manager.acquire(&clip()).unwrap();
        let b = manager.acquire(&clip()).unwrap();
        surface.attach(b.url().clone());

        manager.release_all(&mut surface);
        assert!(!surface.is_attached());
        assert!(manager.stats().is_balanced());

        // Handles outliving a teardown release cleanly without a second revoke
        manager.release(a, &mut surface);
        manager.release(b, &mut surface);
        assert_eq!(manager.stats().revoked, 2);
    }

    #[test]
    fn test_drop_revokes_live() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let mut manager = MediaManager::with_allocator(Box::new(Recording::new(log.clone())));
            let _handle = manager.acquire(&clip()).unwrap();
        }
        assert_eq!(log.lock().last().map(String::as_str), Some("revoke blob:test/1"));
    }
}
