//! Instrumented URL allocators

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crease_core::{CreaseError, CreaseResult, MediaFile};
use crease_media::{PlaybackUrl, UrlAllocator};

/// One allocator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Created(PlaybackUrl),
    Revoked(PlaybackUrl),
    /// Allocation refused for the named file
    Failed(String),
}

/// Shared, ordered log of allocator calls
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: LedgerEntry) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().clone()
    }

    pub fn created(&self) -> usize {
        self.count(|e| matches!(e, LedgerEntry::Created(_)))
    }

    pub fn revoked(&self) -> usize {
        self.count(|e| matches!(e, LedgerEntry::Revoked(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|e| matches!(e, LedgerEntry::Failed(_)))
    }

    fn count(&self, f: impl Fn(&LedgerEntry) -> bool) -> usize {
        self.entries.lock().iter().filter(|&e| f(e)).count()
    }

    /// URLs created and not revoked
    pub fn live(&self) -> Vec<PlaybackUrl> {
        let mut live: Vec<PlaybackUrl> = Vec::new();
        for entry in self.entries.lock().iter() {
            match entry {
                LedgerEntry::Created(url) => live.push(url.clone()),
                LedgerEntry::Revoked(url) => live.retain(|u| u != url),
                LedgerEntry::Failed(_) => {}
            }
        }
        live
    }

    /// Every created URL revoked exactly once, never before its creation,
    /// and nothing revoked that was not created
    pub fn is_balanced(&self) -> bool {
        let mut revoked: HashMap<PlaybackUrl, bool> = HashMap::new();
        for entry in self.entries.lock().iter() {
            match entry {
                LedgerEntry::Created(url) => {
                    if revoked.insert(url.clone(), false).is_some() {
                        return false;
                    }
                }
                LedgerEntry::Revoked(url) => match revoked.get_mut(url) {
                    Some(done) if !*done => *done = true,
                    _ => return false,
                },
                LedgerEntry::Failed(_) => {}
            }
        }
        revoked.values().all(|&done| done)
    }
}

/// Allocator that records every call and can refuse the first few
pub struct RecordingAllocator {
    ledger: Ledger,
    next: u64,
    refuse: usize,
}

impl RecordingAllocator {
    pub fn new(ledger: Ledger) -> Self {
        RecordingAllocator {
            ledger,
            next: 0,
            refuse: 0,
        }
    }

    /// Refuse the first `n` allocations
    pub fn refusing_first(mut self, n: usize) -> Self {
        self.refuse = n;
        self
    }
}

impl UrlAllocator for RecordingAllocator {
    fn create(&mut self, file: &MediaFile) -> CreaseResult<PlaybackUrl> {
        if self.refuse > 0 {
            self.refuse -= 1;
            self.ledger.push(LedgerEntry::Failed(file.name.clone()));
            return Err(CreaseError::MediaUnavailable(format!(
                "simulated allocation failure for {}",
                file.name
            )));
        }

        self.next += 1;
        let url = PlaybackUrl::new(format!("blob:sim/{}", self.next));
        self.ledger.push(LedgerEntry::Created(url.clone()));
        Ok(url)
    }

    fn revoke(&mut self, url: &PlaybackUrl) {
        self.ledger.push(LedgerEntry::Revoked(url.clone()));
    }
}
