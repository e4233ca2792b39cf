//! Memoized cascade markup.
//!
//! Keyed by `(skin id, role set)`. Every skin id carries a generation
//! counter and the whole cache an epoch; an entry is only served while both
//! still match the values stamped when its computation started, so markup
//! computed concurrently with an invalidation is never served afterwards.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use drape_types::{RoleSet, SkinId};

/// Validity stamp taken before computing an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    generation: u64,
    epoch: u64,
}

#[derive(Debug)]
struct Entry {
    markup: String,
    stamp: Stamp,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<(SkinId, RoleSet), Entry>,
    generations: HashMap<SkinId, u64>,
    epoch: u64,
}

impl State {
    fn stamp(&self, id: SkinId) -> Stamp {
        Stamp {
            generation: self.generations.get(&id).copied().unwrap_or(0),
            epoch: self.epoch,
        }
    }
}

/// Process-wide markup cache shared by all resolutions.
#[derive(Debug, Default)]
pub struct MarkupCache {
    state: RwLock<State>,
}

impl MarkupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp to pass to [`MarkupCache::insert`] once the markup is computed.
    pub fn stamp(&self, id: SkinId) -> Stamp {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stamp(id)
    }

    pub fn get(&self, id: SkinId, roles: RoleSet) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let current = state.stamp(id);
        state
            .entries
            .get(&(id, roles))
            .filter(|e| e.stamp == current)
            .map(|e| e.markup.clone())
    }

    /// Store markup computed under `stamp`. Dropped if the skin was
    /// invalidated in the meantime.
    pub fn insert(&self, id: SkinId, roles: RoleSet, markup: String, stamp: Stamp) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.stamp(id) != stamp {
            log::debug!("discarding stale markup for skin {id}");
            return;
        }
        state.entries.insert((id, roles), Entry { markup, stamp });
    }

    /// Forget every role set of one skin.
    pub fn invalidate(&self, id: SkinId) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state.generations.entry(id).or_insert(0) += 1;
        state.entries.retain(|(entry_id, _), _| *entry_id != id);
    }

    /// Forget everything.
    pub fn invalidate_all(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.epoch += 1;
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
