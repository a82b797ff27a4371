// File: ./src/visibility.rs
//! Administrator-curated allow-list of client-visible task identifiers.
//!
//! The set is loaded once from the key-value store and written back after
//! every mutation. An empty set means "show everything".
use crate::error::{Result, TimelineError};
use crate::storage::{KEY_VISIBLE_ITEMS, SharedStore};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilitySet {
    ids: BTreeSet<String>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Flips membership and returns the new state.
    fn flip(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }
}

impl<S: Into<String>> FromIterator<S> for VisibilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug)]
pub struct VisibilityStore {
    store: SharedStore,
    set: VisibilitySet,
}

impl VisibilityStore {
    /// Loads the persisted set. Absent entry -> empty set; an unreadable
    /// entry is logged and treated as empty so the timeline stays usable.
    pub fn load(store: SharedStore) -> Result<Self> {
        let set = match store.get(KEY_VISIBLE_ITEMS)? {
            None => VisibilitySet::new(),
            Some(raw) if raw.trim().is_empty() => VisibilitySet::new(),
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    log::warn!("Ignoring unreadable visible item list: {}", e);
                    VisibilitySet::new()
                }
            },
        };
        log::debug!("Loaded {} visible item(s)", set.len());
        Ok(Self { store, set })
    }

    pub fn set(&self) -> &VisibilitySet {
        &self.set
    }

    /// Plain membership, without the empty-set default.
    pub fn is_visible(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    /// Inserts `id` if absent, removes it if present, then persists.
    /// Returns the new membership. On a failed write the in-memory set is
    /// rolled back so it never drifts from what is stored.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let visible = self.set.flip(id);
        if let Err(e) = self.persist() {
            self.set.flip(id);
            return Err(e);
        }
        log::info!(
            "Task {} is now {}",
            id,
            if visible { "visible" } else { "hidden" }
        );
        Ok(visible)
    }

    /// Clears the allow-list, which makes every task visible again.
    pub fn reset(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.set);
        if let Err(e) = self.persist() {
            self.set = previous;
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let ids: Vec<&str> = self.set.iter().collect();
        let json = serde_json::to_string(&ids)
            .map_err(|e| TimelineError::Storage(format!("serialize visible items: {e}")))?;
        self.store.set(KEY_VISIBLE_ITEMS, &json)?;
        Ok(())
    }
}
