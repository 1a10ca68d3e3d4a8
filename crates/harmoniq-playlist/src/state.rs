use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier for an item queued in the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Media entry stored in the playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: ItemId,
    pub uri: String,
    pub title: String,
}

impl PlaylistItem {
    pub fn new(id: ItemId, uri: impl Into<String>, title: Option<String>) -> Self {
        let uri = uri.into();
        let title = title.unwrap_or_else(|| title_from_uri(&uri));
        Self { id, uri, title }
    }
}

fn title_from_uri(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(trimmed)
        .to_string()
}

/// Playback modes applied when the cursor advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackFlags {
    /// Wrap around when running off either end of the list.
    pub loop_all: bool,
    /// Keep returning the current item.
    pub repeat_current: bool,
    /// Pick a random item instead of the following one.
    pub random: bool,
}

/// Plain playlist data. [`crate::Playlist`] wraps this behind a lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistState {
    pub items: Vec<PlaylistItem>,
    pub flags: PlaybackFlags,
    #[serde(skip)]
    pub current: Option<ItemId>,
    next_id: u64,
}

impl PlaylistState {
    pub fn enqueue(&mut self, uri: impl Into<String>, title: Option<String>) -> ItemId {
        self.next_id += 1;
        let id = ItemId(self.next_id);
        self.items.push(PlaylistItem::new(id, uri, title));
        id
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.items.remove(index);
        if self.current == Some(id) {
            self.current = None;
        }
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn play(&mut self, id: ItemId) -> bool {
        if self.position(id).is_some() {
            self.current = Some(id);
            true
        } else {
            false
        }
    }

    pub fn current_item(&self) -> Option<&PlaylistItem> {
        let id = self.current?;
        self.items.iter().find(|item| item.id == id)
    }

    /// Moves the cursor forward according to the playback flags.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&PlaylistItem> {
        if self.items.is_empty() {
            self.current = None;
            return None;
        }
        let position = self.current.and_then(|id| self.position(id));
        if self.flags.repeat_current && position.is_some() {
            return self.current_item();
        }

        let len = self.items.len();
        let next = if self.flags.random {
            match position {
                Some(index) if len > 1 => {
                    // Draw from the other items so a random step never stalls.
                    let offset = rng.gen_range(1..len);
                    Some((index + offset) % len)
                }
                _ => Some(rng.gen_range(0..len)),
            }
        } else {
            match position {
                None => Some(0),
                Some(index) if index + 1 < len => Some(index + 1),
                Some(_) if self.flags.loop_all => Some(0),
                Some(_) => None,
            }
        };
        self.select_index(next)
    }

    /// Moves the cursor back one item.
    pub fn retreat(&mut self) -> Option<&PlaylistItem> {
        let position = self.current.and_then(|id| self.position(id));
        if self.flags.repeat_current && position.is_some() {
            return self.current_item();
        }
        let previous = match position {
            None => None,
            Some(0) if self.flags.loop_all => self.items.len().checked_sub(1),
            Some(0) => None,
            Some(index) => Some(index - 1),
        };
        self.select_index(previous)
    }

    /// Restores the id counter after deserializing items from disk.
    pub(crate) fn normalize(&mut self) {
        let highest = self.items.iter().map(|item| item.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest);
        self.current = None;
    }

    fn select_index(&mut self, index: Option<usize>) -> Option<&PlaylistItem> {
        self.current = index.and_then(|index| self.items.get(index)).map(|item| item.id);
        self.current_item()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn seeded(uris: &[&str]) -> PlaylistState {
        let mut state = PlaylistState::default();
        for uri in uris {
            state.enqueue(*uri, None);
        }
        state
    }

    #[test]
    fn titles_default_to_last_uri_segment() {
        let mut state = PlaylistState::default();
        state.enqueue("file:///music/album/track01.flac", None);
        state.enqueue("http://radio.example/", Some("Radio".into()));
        assert_eq!(state.items[0].title, "track01.flac");
        assert_eq!(state.items[1].title, "Radio");
    }

    #[test]
    fn advance_walks_forward_and_stops_at_end() {
        let mut state = seeded(&["a", "b"]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(state.advance(&mut rng).map(|i| i.uri.clone()), Some("a".into()));
        assert_eq!(state.advance(&mut rng).map(|i| i.uri.clone()), Some("b".into()));
        assert!(state.advance(&mut rng).is_none());
        assert!(state.current.is_none());
    }

    #[test]
    fn loop_all_wraps_in_both_directions() {
        let mut state = seeded(&["a", "b", "c"]);
        state.flags.loop_all = true;
        let last = state.items[2].id;
        assert!(state.play(last));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(state.advance(&mut rng).map(|i| i.uri.clone()), Some("a".into()));
        assert_eq!(state.retreat().map(|i| i.uri.clone()), Some("c".into()));
    }

    #[test]
    fn repeat_current_holds_the_cursor() {
        let mut state = seeded(&["a", "b"]);
        state.flags.repeat_current = true;
        let first = state.items[0].id;
        state.play(first);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(state.advance(&mut rng).map(|i| i.id), Some(first));
        assert_eq!(state.retreat().map(|i| i.id), Some(first));
    }

    #[test]
    fn random_never_repeats_the_current_item() {
        let mut state = seeded(&["a", "b", "c", "d"]);
        state.flags.random = true;
        let mut rng = StdRng::seed_from_u64(42);
        let mut previous = state.advance(&mut rng).map(|i| i.id);
        for _ in 0..32 {
            let next = state.advance(&mut rng).map(|i| i.id);
            assert!(next.is_some());
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn removing_current_item_clears_cursor() {
        let mut state = seeded(&["a", "b"]);
        let first = state.items[0].id;
        state.play(first);
        assert!(state.remove(first));
        assert!(!state.remove(first));
        assert!(state.current.is_none());
        assert_eq!(state.items.len(), 1);
    }
}
