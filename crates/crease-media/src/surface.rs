//! Playback surface - the video element a playback URL is attached to
//!
//! The core never decodes video. It only tracks what the surface is bound
//! to and where playback is, so the overlay, scrubber and frame counter can
//! follow it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::PlaybackUrl;

/// Playback surface configuration
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Restart from the beginning when the clip ends
    pub looping: bool,
    /// Audio muted
    pub muted: bool,
    /// Start playing as soon as a URL is attached
    pub autoplay: bool,
    /// Nominal frame rate used for the frame counter
    pub frame_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            looping: true,
            muted: true,
            autoplay: true,
            frame_rate: 30.0,
        }
    }
}

/// Shared, read-only view of the URL a surface is bound to
///
/// Lets a platform allocator check that nothing still plays a URL it is
/// asked to revoke.
#[derive(Clone, Debug, Default)]
pub struct SourceWatch {
    bound: Arc<RwLock<Option<PlaybackUrl>>>,
}

impl SourceWatch {
    pub fn current(&self) -> Option<PlaybackUrl> {
        self.bound.read().clone()
    }

    pub fn is_bound_to(&self, url: &PlaybackUrl) -> bool {
        self.bound.read().as_ref() == Some(url)
    }

    fn set(&self, url: Option<PlaybackUrl>) {
        *self.bound.write() = url;
    }
}

/// Model of the video element consuming a playback URL
#[derive(Debug)]
pub struct PlaybackSurface {
    config: PlaybackConfig,
    source: Option<PlaybackUrl>,
    watch: SourceWatch,
    playing: bool,
    position: Duration,
}

impl PlaybackSurface {
    pub fn new(config: PlaybackConfig) -> Self {
        PlaybackSurface {
            config,
            source: None,
            watch: SourceWatch::default(),
            playing: false,
            position: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Bind a URL. Playback starts immediately when autoplay is on.
    pub fn attach(&mut self, url: PlaybackUrl) {
        self.watch.set(Some(url.clone()));
        self.source = Some(url);
        self.playing = self.config.autoplay;
        self.position = Duration::ZERO;
    }

    /// Unbind the current URL and stop playback
    pub fn detach(&mut self) -> Option<PlaybackUrl> {
        self.playing = false;
        self.position = Duration::ZERO;
        self.watch.set(None);
        self.source.take()
    }

    pub fn source(&self) -> Option<&PlaybackUrl> {
        self.source.as_ref()
    }

    /// Watch on this surface's binding, for allocators
    pub fn watch(&self) -> SourceWatch {
        self.watch.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Flip between playing and paused. Returns the new playing state.
    pub fn toggle_play(&mut self) -> bool {
        if self.source.is_some() {
            self.playing = !self.playing;
        }
        self.playing
    }

    /// Seek back to the first frame
    pub fn rewind(&mut self) {
        self.position = Duration::ZERO;
    }

    /// Move the playhead while playing
    pub fn advance(&mut self, dt: Duration) {
        if self.playing && self.source.is_some() {
            self.position = self.position.saturating_add(dt);
        }
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    /// Frame number at the current playhead
    pub fn frame_index(&self) -> u64 {
        (self.position.as_secs_f64() * self.config.frame_rate) as u64
    }
}

impl Default for PlaybackSurface {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}
