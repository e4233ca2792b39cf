//! In-memory skin store.
//!
//! Skins live in a `BTreeMap<SkinId, Skin>` and links in a flat vector, all
//! behind one `RwLock`. The whole catalog can be written to TOML as
//! `[[skin]]` and `[[link]]` tables and read back.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use drape_types::{DrapeError, Result, Skin, SkinId};

use crate::{ParentLink, SkinStore};

#[derive(Debug, Default)]
struct Catalog {
    skins: BTreeMap<SkinId, Skin>,
    links: Vec<ParentLink>,
    next_id: u64,
}

impl Catalog {
    fn title_taken(&self, title: &str, except: Option<SkinId>) -> bool {
        self.skins
            .values()
            .any(|s| s.title == title && Some(s.id) != except)
    }

    fn require(&self, id: SkinId) -> Result<()> {
        if self.skins.contains_key(&id) {
            Ok(())
        } else {
            Err(DrapeError::Store(format!("no skin with id {id}")))
        }
    }
}

/// On-disk shape of a catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    skin: Vec<Skin>,
    #[serde(default)]
    link: Vec<ParentLink>,
}

/// A fully in-memory skin store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Catalog>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from catalog TOML.
    ///
    /// Ids are kept as written; new ids continue after the largest one.
    /// Links must reference existing skins and keep positions unique.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| DrapeError::Store(format!("catalog: {e}")))?;
        let store = Self::new();
        {
            let mut cat = store.write();
            for skin in file.skin {
                if cat.skins.contains_key(&skin.id) {
                    return Err(DrapeError::Store(format!("duplicate skin id {}", skin.id)));
                }
                if cat.title_taken(&skin.title, None) {
                    return Err(DrapeError::Store(format!(
                        "duplicate skin title `{}`",
                        skin.title
                    )));
                }
                cat.next_id = cat.next_id.max(skin.id.0);
                cat.skins.insert(skin.id, skin);
            }
        }
        for link in file.link {
            store.add_link(link)?;
        }
        Ok(store)
    }

    /// Snapshot the store as catalog TOML.
    pub fn to_toml(&self) -> Result<String> {
        let cat = self.read();
        let file = CatalogFile {
            skin: cat.skins.values().cloned().collect(),
            link: cat.links.clone(),
        };
        Ok(toml::to_string(&file)?)
    }

    /// Load a catalog file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("catalog {} not found, starting empty", path.display());
                Ok(Self::new())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Write the catalog file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Number of skins.
    pub fn len(&self) -> usize {
        self.read().skins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().skins.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SkinStore for MemoryStore {
    fn get(&self, id: SkinId) -> Result<Skin> {
        self.read()
            .skins
            .get(&id)
            .cloned()
            .ok_or_else(|| DrapeError::Store(format!("no skin with id {id}")))
    }

    fn find_by_title(&self, title: &str) -> Option<Skin> {
        self.read()
            .skins
            .values()
            .find(|s| s.title == title)
            .cloned()
    }

    fn insert(&self, mut skin: Skin) -> Result<SkinId> {
        let mut cat = self.write();
        if cat.title_taken(&skin.title, None) {
            return Err(DrapeError::Store(format!(
                "title `{}` must be unique",
                skin.title
            )));
        }
        cat.next_id += 1;
        let id = SkinId(cat.next_id);
        skin.id = id;
        cat.skins.insert(id, skin);
        Ok(id)
    }

    fn save(&self, skin: &Skin) -> Result<()> {
        let mut cat = self.write();
        cat.require(skin.id)?;
        if cat.title_taken(&skin.title, Some(skin.id)) {
            return Err(DrapeError::Store(format!(
                "title `{}` must be unique",
                skin.title
            )));
        }
        cat.skins.insert(skin.id, skin.clone());
        Ok(())
    }

    fn delete(&self, id: SkinId) -> Result<()> {
        let mut cat = self.write();
        cat.require(id)?;
        cat.skins.remove(&id);
        cat.links.retain(|l| l.child != id && l.parent != id);
        Ok(())
    }

    fn ids(&self) -> Vec<SkinId> {
        self.read().skins.keys().copied().collect()
    }

    fn parents(&self, child: SkinId) -> Vec<SkinId> {
        let cat = self.read();
        let mut links: Vec<&ParentLink> = cat.links.iter().filter(|l| l.child == child).collect();
        links.sort_by_key(|l| l.position);
        links.into_iter().map(|l| l.parent).collect()
    }

    fn children(&self, parent: SkinId) -> Vec<SkinId> {
        let cat = self.read();
        let mut children: Vec<SkinId> = cat
            .links
            .iter()
            .filter(|l| l.parent == parent)
            .map(|l| l.child)
            .collect();
        children.sort();
        children.dedup();
        children
    }

    fn add_link(&self, link: ParentLink) -> Result<()> {
        let mut cat = self.write();
        cat.require(link.child)?;
        cat.require(link.parent)?;
        if link.child == link.parent {
            return Err(DrapeError::Store(format!(
                "skin {} cannot be its own parent",
                link.child
            )));
        }
        if cat
            .links
            .iter()
            .any(|l| l.child == link.child && l.position == link.position)
        {
            return Err(DrapeError::Store(format!(
                "skin {} already has a parent at position {}",
                link.child, link.position
            )));
        }
        cat.links.push(link);
        Ok(())
    }

    fn remove_link(&self, child: SkinId, parent: SkinId) -> Result<bool> {
        let mut cat = self.write();
        let before = cat.links.len();
        cat.links.retain(|l| !(l.child == child && l.parent == parent));
        Ok(cat.links.len() != before)
    }

    fn clear_parents(&self, child: SkinId) -> Result<()> {
        let mut cat = self.write();
        cat.require(child)?;
        cat.links.retain(|l| l.child != child);
        Ok(())
    }
}
