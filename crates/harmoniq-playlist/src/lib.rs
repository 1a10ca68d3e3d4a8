//! Shared playlist used by Harmoniq Studio interfaces.
//!
//! A single [`Playlist`] is created lazily per interface context and handed
//! out by reference to every interface and host component that needs it. All
//! state sits behind a lock so the playlist can be used from any thread.

mod state;

use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

pub use state::{ItemId, PlaybackFlags, PlaylistItem, PlaylistState};

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("playlist I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse playlist: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Thread-safe playlist shared between interfaces.
#[derive(Debug)]
pub struct Playlist {
    owner: String,
    state: RwLock<PlaylistState>,
}

impl Playlist {
    /// Creates an empty playlist labelled with the owning context.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: RwLock::new(PlaylistState::default()),
        }
    }

    /// Restores a playlist persisted with [`Playlist::save`]. A missing file
    /// yields an empty playlist.
    pub fn open(owner: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, PlaylistError> {
        let path = path.as_ref();
        let owner = owner.into();
        if !path.exists() {
            return Ok(Self::new(owner));
        }
        let raw = fs::read_to_string(path)?;
        let mut state: PlaylistState = serde_json::from_str(&raw)?;
        state.normalize();
        debug!(owner = %owner, items = state.items.len(), path = %path.display(), "playlist restored");
        Ok(Self {
            owner,
            state: RwLock::new(state),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlaylistError> {
        let json = serde_json::to_string_pretty(&*self.state.read())?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn enqueue(&self, uri: impl Into<String>, title: Option<String>) -> ItemId {
        self.state.write().enqueue(uri, title)
    }

    pub fn remove(&self, id: ItemId) -> bool {
        self.state.write().remove(id)
    }

    pub fn clear(&self) {
        self.state.write().clear();
    }

    pub fn items(&self) -> Vec<PlaylistItem> {
        self.state.read().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Selects `id` as the current item. Returns `false` if it is not queued.
    pub fn play(&self, id: ItemId) -> bool {
        self.state.write().play(id)
    }

    pub fn current(&self) -> Option<PlaylistItem> {
        self.state.read().current_item().cloned()
    }

    pub fn next(&self) -> Option<PlaylistItem> {
        let mut rng = rand::thread_rng();
        self.state.write().advance(&mut rng).cloned()
    }

    pub fn previous(&self) -> Option<PlaylistItem> {
        self.state.write().retreat().cloned()
    }

    pub fn flags(&self) -> PlaybackFlags {
        self.state.read().flags
    }

    pub fn set_loop_all(&self, enabled: bool) {
        self.state.write().flags.loop_all = enabled;
    }

    pub fn set_repeat_current(&self, enabled: bool) {
        self.state.write().flags.repeat_current = enabled;
    }

    pub fn set_random(&self, enabled: bool) {
        self.state.write().flags.random = enabled;
    }

    /// Copy of the full playlist state.
    pub fn snapshot(&self) -> PlaylistState {
        self.state.read().clone()
    }
}
