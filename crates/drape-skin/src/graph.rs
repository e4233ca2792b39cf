//! Skin inheritance graph.
//!
//! Skins are nodes, parent links are ordered edges. Traversal is index
//! based: the graph only ever holds skin ids and asks the store for the
//! ordered parent list of one node at a time.

use std::collections::{BTreeSet, VecDeque};

use drape_store::SkinStore;
use drape_types::{DrapeError, Result, Skin, SkinId};

/// Read-only view of the inheritance graph held by a store.
pub struct SkinGraph<'a, S: SkinStore + ?Sized> {
    store: &'a S,
    max_depth: usize,
}

impl<'a, S: SkinStore + ?Sized> SkinGraph<'a, S> {
    /// `max_depth` caps the length of any ancestor chain walked.
    pub fn new(store: &'a S, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Parent skins of `id`, ordered by link position.
    pub fn ordered_parents(&self, id: SkinId) -> Result<Vec<Skin>> {
        self.store
            .parents(id)
            .into_iter()
            .map(|p| self.store.get(p))
            .collect()
    }

    /// Lazily walk the ancestors of `id` in cascade order.
    ///
    /// For each parent in position order, that parent's own ancestors come
    /// first, then the parent itself. `id` is not included. A skin reachable
    /// along several paths is yielded once per path.
    pub fn ancestors(&self, id: SkinId) -> Ancestors<'a, S> {
        Ancestors {
            store: self.store,
            max_depth: self.max_depth,
            stack: vec![Frame::new(self.store, id)],
            failed: false,
        }
    }

    /// Collect [`SkinGraph::ancestors`].
    pub fn all_ancestors(&self, id: SkinId) -> Result<Vec<SkinId>> {
        self.ancestors(id).collect()
    }

    /// Every skin contributing to the cascade of `id`, outermost first and
    /// `id` itself last.
    pub fn cascade(&self, id: SkinId) -> Result<Vec<Skin>> {
        let mut skins = Vec::new();
        for ancestor in self.ancestors(id) {
            skins.push(self.store.get(ancestor?)?);
        }
        skins.push(self.store.get(id)?);
        Ok(skins)
    }

    /// Every skin that inherits from `id`, directly or not. Each is listed
    /// once; cycles are tolerated.
    pub fn descendants(&self, id: SkinId) -> Vec<SkinId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<SkinId> = self.store.children(id).into();
        while let Some(next) = queue.pop_front() {
            if next != id && seen.insert(next) {
                queue.extend(self.store.children(next));
            }
        }
        seen.into_iter().collect()
    }
}

#[derive(Clone)]
struct Frame {
    parents: Vec<SkinId>,
    next: usize,
    id: SkinId,
}

impl Frame {
    fn new<S: SkinStore + ?Sized>(store: &S, id: SkinId) -> Self {
        Self {
            parents: store.parents(id),
            next: 0,
            id,
        }
    }
}

/// Post-order ancestor walk produced by [`SkinGraph::ancestors`].
///
/// Yields an error and stops if a chain grows deeper than the configured
/// limit, which is also how a cyclic graph surfaces.
pub struct Ancestors<'a, S: SkinStore + ?Sized> {
    store: &'a S,
    max_depth: usize,
    stack: Vec<Frame>,
    failed: bool,
}

impl<S: SkinStore + ?Sized> Clone for Ancestors<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            max_depth: self.max_depth,
            stack: self.stack.clone(),
            failed: self.failed,
        }
    }
}

impl<S: SkinStore + ?Sized> Iterator for Ancestors<'_, S> {
    type Item = Result<SkinId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let top = self.stack.last_mut()?;
            if let Some(&parent) = top.parents.get(top.next) {
                top.next += 1;
                if self.stack.len() > self.max_depth {
                    let root = self.stack[0].id;
                    self.failed = true;
                    log::warn!(
                        "ancestor chain of skin {root} exceeds {} levels",
                        self.max_depth
                    );
                    return Some(Err(DrapeError::Graph(format!(
                        "ancestor chain of skin {root} is deeper than {} levels",
                        self.max_depth
                    ))));
                }
                self.stack.push(Frame::new(self.store, parent));
                continue;
            }
            let done = self.stack.pop()?;
            if self.stack.is_empty() {
                return None;
            }
            return Some(Ok(done.id));
        }
    }
}
