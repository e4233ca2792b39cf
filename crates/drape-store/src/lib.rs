//! Skin persistence.
//!
//! The cascade engine never touches a database directly. It talks to a
//! [`SkinStore`]: skin CRUD plus ordered parent links. [`MemoryStore`] is the
//! bundled implementation, which can be snapshotted to and restored from a
//! TOML catalog file.

mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use drape_types::{Result, Skin, SkinId};

/// Ordered edge from a child skin to one of its parents.
///
/// `position` is unique among a child's links. Position 1 is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    pub child: SkinId,
    pub parent: SkinId,
    pub position: u32,
}

/// Skin and parent-link persistence.
///
/// Methods take `&self` so a store can be shared between request handlers;
/// implementations synchronize internally.
pub trait SkinStore: Send + Sync {
    /// Fetch a skin by id.
    fn get(&self, id: SkinId) -> Result<Skin>;

    /// Fetch a skin by its exact title.
    fn find_by_title(&self, title: &str) -> Option<Skin>;

    /// Insert a new skin, assigning it an id. Titles must be unique.
    fn insert(&self, skin: Skin) -> Result<SkinId>;

    /// Overwrite an existing skin. Titles must stay unique.
    fn save(&self, skin: &Skin) -> Result<()>;

    /// Delete a skin and every link it takes part in, as parent or child.
    fn delete(&self, id: SkinId) -> Result<()>;

    /// All skin ids, ascending.
    fn ids(&self) -> Vec<SkinId>;

    /// Parent ids of `child`, ordered by link position.
    fn parents(&self, child: SkinId) -> Vec<SkinId>;

    /// Ids of skins that list `parent` as a parent.
    fn children(&self, parent: SkinId) -> Vec<SkinId>;

    /// Link `parent` under `child` at `position`.
    fn add_link(&self, link: ParentLink) -> Result<()>;

    /// Remove the link between `child` and `parent`. Returns whether one
    /// existed.
    fn remove_link(&self, child: SkinId, parent: SkinId) -> Result<bool>;

    /// Drop every parent link of `child`.
    fn clear_parents(&self, child: SkinId) -> Result<()>;

    fn find_by_title_and_official(&self, title: &str, official: bool) -> Option<Skin> {
        self.find_by_title(title).filter(|s| s.official == official)
    }

    /// Flip the cached flag and persist.
    fn set_cached(&self, id: SkinId, cached: bool) -> Result<()> {
        let mut skin = self.get(id)?;
        skin.cached = cached;
        self.save(&skin)
    }

    /// Ids of skins whose cascade is pre-built to files.
    fn cached(&self) -> Vec<SkinId> {
        self.ids()
            .into_iter()
            .filter(|id| self.get(*id).is_ok_and(|s| s.cached))
            .collect()
    }
}
