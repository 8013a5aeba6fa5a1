//! Mock audio backend for testing
//!
//! Counts live and paused clips so tests can assert that no more than one
//! soundtrack ever plays at once, and can be told to fail specific URLs.
//!
//! ## Example
//!
//! ```rust,ignore
//! let backend = Arc::new(MockAudioBackend::new());
//! let mut slot = AudioSlot::new(backend.clone());
//! slot.switch_to(&story)?;
//! assert_eq!(backend.active(), 1);
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::audio::{AudioBackend, AudioClip};
use crate::error::{PlaybackError, PlaybackResult};

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    max_active: AtomicUsize,
    paused: AtomicUsize,
    started: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

/// Audio backend that records what it was asked to play
#[derive(Debug, Clone, Default)]
pub struct MockAudioBackend {
    counters: Arc<Counters>,
}

impl MockAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `play_looped(url)` fail
    pub fn fail_url(&self, url: impl Into<String>) {
        self.counters.failing.lock().insert(url.into());
    }

    /// Clips currently live
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Highest number of clips ever live at once
    pub fn max_active(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }

    /// Live clips currently paused
    pub fn paused(&self) -> usize {
        self.counters.paused.load(Ordering::SeqCst)
    }

    /// URLs successfully started, in order
    pub fn started(&self) -> Vec<String> {
        self.counters.started.lock().clone()
    }
}

impl AudioBackend for MockAudioBackend {
    fn play_looped(&self, url: &str) -> PlaybackResult<Box<dyn AudioClip>> {
        if self.counters.failing.lock().contains(url) {
            return Err(PlaybackError::AudioPlayback {
                url: url.to_string(),
                reason: "mock failure".to_string(),
            });
        }

        let now_active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.counters.started.lock().push(url.to_string());

        Ok(Box::new(MockClip {
            counters: self.counters.clone(),
            paused: false,
            released: AtomicBool::new(false),
        }))
    }
}

struct MockClip {
    counters: Arc<Counters>,
    paused: bool,
    released: AtomicBool,
}

impl MockClip {
    fn release_once(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
            if self.paused {
                self.paused = false;
                self.counters.paused.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}

impl AudioClip for MockClip {
    fn pause(&mut self) {
        if !self.paused && !self.released.load(Ordering::SeqCst) {
            self.paused = true;
            self.counters.paused.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.counters.paused.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn stop(&mut self) {
        self.release_once();
    }
}

impl Drop for MockClip {
    fn drop(&mut self) {
        self.release_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_then_drop_counts_once() {
        let backend = MockAudioBackend::new();
        let mut clip = backend.play_looped("https://cdn/a.mp3").unwrap();
        assert_eq!(backend.active(), 1);
        clip.stop();
        drop(clip);
        assert_eq!(backend.active(), 0);
    }

    #[test]
    fn test_paused_clip_released_while_paused() {
        let backend = MockAudioBackend::new();
        let mut clip = backend.play_looped("https://cdn/a.mp3").unwrap();
        clip.pause();
        clip.pause();
        assert_eq!(backend.paused(), 1);
        clip.resume();
        assert_eq!(backend.paused(), 0);

        clip.pause();
        drop(clip);
        assert_eq!(backend.paused(), 0);
        assert_eq!(backend.active(), 0);
    }

    #[test]
    fn test_max_active_tracks_overlap() {
        let backend = MockAudioBackend::new();
        let a = backend.play_looped("https://cdn/a.mp3").unwrap();
        let b = backend.play_looped("https://cdn/b.mp3").unwrap();
        drop(a);
        drop(b);
        assert_eq!(backend.max_active(), 2);
        assert_eq!(backend.active(), 0);
    }

    #[test]
    fn test_failing_url() {
        let backend = MockAudioBackend::new();
        backend.fail_url("https://cdn/x.mp3");
        assert!(backend.play_looped("https://cdn/x.mp3").is_err());
        assert!(backend.started().is_empty());
    }
}
