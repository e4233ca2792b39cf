//! Skin catalog: a store plus everything needed to resolve, cache and import
//! its skins.

use std::sync::{PoisonError, RwLock};

use drape_store::{ParentLink, SkinStore};
use drape_types::{DrapeConfig, DrapeError, Result, Role, RoleSet, Skin, SkinId};

use crate::cache::{CachedSegment, FileCache};
use crate::import::{scan_version, site_versions, umbrella_title};
use crate::resolver::CascadeResolver;

/// Title of the plain site default skin.
pub const DEFAULT_SKIN_TITLE: &str = "Default";

/// Outcome of importing one site version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionImport {
    pub version: String,
    pub umbrella: SkinId,
    /// Component skins, in link position order.
    pub components: Vec<SkinId>,
    /// Whether the umbrella's file cache was built.
    pub cached: bool,
}

/// Outcome of [`SkinCatalog::import_site_skins`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub versions: Vec<VersionImport>,
}

/// Owns a [`SkinStore`] and routes every mutation through memo
/// invalidation.
pub struct SkinCatalog<S: SkinStore> {
    store: S,
    config: DrapeConfig,
    resolver: CascadeResolver,
    admin_default: RwLock<Option<SkinId>>,
}

impl<S: SkinStore> SkinCatalog<S> {
    pub fn new(store: S, config: DrapeConfig) -> Result<Self> {
        let resolver = CascadeResolver::new(FileCache::new(&config), config.max_ancestor_depth);
        let catalog = Self {
            store,
            config,
            resolver,
            admin_default: RwLock::new(None),
        };
        catalog.refresh_layering()?;
        Ok(catalog)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DrapeConfig {
        &self.config
    }

    pub fn resolver(&self) -> &CascadeResolver {
        &self.resolver
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -- resolution --------------------------------------------------------

    /// Markup for `id`, restricted to `roles`.
    pub fn resolve(&self, id: SkinId, roles: RoleSet) -> Result<String> {
        self.resolver.resolve(&self.store, id, roles)
    }

    /// Markup for `id` with the user, override and site roles.
    pub fn resolve_default(&self, id: SkinId) -> Result<String> {
        self.resolve(id, RoleSet::default_roles())
    }

    /// Recompute which skin wraps user skins: the administrator's default
    /// when it differs from the plain default, otherwise the current site
    /// skin.
    pub fn refresh_layering(&self) -> Result<Option<SkinId>> {
        let plain = self
            .store
            .find_by_title_and_official(DEFAULT_SKIN_TITLE, true)
            .map(|s| s.id);
        let wrapper = match self.admin_default() {
            Some(admin) if Some(admin) != plain => Some(admin),
            _ => self.current_site_skin()?.map(|s| s.id),
        };
        self.resolver.set_wrapper(wrapper);
        Ok(wrapper)
    }

    // -- file cache --------------------------------------------------------

    /// Pre-build the cascade of `id` to segment files. Publishes the skin.
    /// Returns the number of segment files written.
    pub fn build_cache(&self, id: SkinId) -> Result<usize> {
        let lock = self.resolver.files().build_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut skin = self.store.get(id)?;
        skin.public = true;
        skin.official = true;
        self.store.save(&skin)?;

        let cascade = self.resolver.graph(&self.store).cascade(id)?;
        let written = self.resolver.files().write_segments(&skin, &cascade)?;

        skin.cached = true;
        self.store.save(&skin)?;
        self.resolver.invalidate(&[id]);
        Ok(written)
    }

    /// Remove the segment files of `id` and mark it uncached. Clearing an
    /// uncached skin is not an error.
    pub fn clear_cache(&self, id: SkinId) -> Result<()> {
        let lock = self.resolver.files().build_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut skin = self.store.get(id)?;
        self.resolver.files().remove(&skin)?;
        skin.cached = false;
        self.store.save(&skin)?;
        self.resolver.invalidate(&[id]);
        Ok(())
    }

    /// Decoded segment files of a cached skin.
    pub fn cached_segments(&self, id: SkinId) -> Result<Vec<CachedSegment>> {
        let skin = self.store.get(id)?;
        self.resolver.files().read_segments(&skin)
    }

    // -- skins and links ---------------------------------------------------

    pub fn create_skin(&self, skin: Skin) -> Result<SkinId> {
        let layering = self.affects_layering(&skin);
        let id = self.store.insert(skin)?;
        if layering {
            self.refresh_layering()?;
        }
        Ok(id)
    }

    /// Persist edits to a skin. Memoized markup of the skin and everything
    /// inheriting from it is dropped. File caches are snapshots and are not
    /// rebuilt.
    pub fn save_skin(&self, skin: &Skin) -> Result<()> {
        let previous = self.store.get(skin.id)?;
        self.store.save(skin)?;
        self.touch(skin.id);
        if self.affects_layering(&previous) || self.affects_layering(skin) {
            self.refresh_layering()?;
        }
        Ok(())
    }

    /// Delete a skin, its links and its file cache.
    pub fn delete_skin(&self, id: SkinId) -> Result<()> {
        let affected = {
            let lock = self.resolver.files().build_lock(id);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let skin = self.store.get(id)?;
            let affected = self.affected(id);
            self.resolver.files().remove(&skin)?;
            self.store.delete(id)?;
            affected
        };
        self.resolver.invalidate(&affected);
        {
            let mut admin = self
                .admin_default
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if *admin == Some(id) {
                *admin = None;
            }
        }
        self.refresh_layering()?;
        Ok(())
    }

    /// Make `parent` a parent of `child` at `position`. Rejects a position
    /// already taken and links that would close a cycle.
    pub fn link_parent(&self, child: SkinId, parent: SkinId, position: u32) -> Result<()> {
        if child == parent || self.resolver.graph(&self.store).descendants(child).contains(&parent)
        {
            return Err(DrapeError::Graph(format!(
                "linking skin {parent} under skin {child} would create a cycle"
            )));
        }
        self.store.add_link(ParentLink {
            child,
            parent,
            position,
        })?;
        self.touch(child);
        Ok(())
    }

    /// Remove the link between `child` and `parent`. Returns whether one
    /// existed.
    pub fn unlink_parent(&self, child: SkinId, parent: SkinId) -> Result<bool> {
        let removed = self.store.remove_link(child, parent)?;
        if removed {
            self.touch(child);
        }
        Ok(removed)
    }

    /// `id` and every skin inheriting from it.
    fn affected(&self, id: SkinId) -> Vec<SkinId> {
        let mut ids = vec![id];
        ids.extend(self.resolver.graph(&self.store).descendants(id));
        ids
    }

    fn touch(&self, id: SkinId) {
        let affected = self.affected(id);
        for stale in affected.iter().filter(|a| self.store.get(**a).is_ok_and(|s| s.cached)) {
            log::info!("file cache of skin {stale} predates a change to its cascade");
        }
        self.resolver.invalidate(&affected);
    }

    fn affects_layering(&self, skin: &Skin) -> bool {
        skin.title == DEFAULT_SKIN_TITLE || skin.title.starts_with("Archive ")
    }

    // -- site defaults -----------------------------------------------------

    /// The official `Default` skin, created on first use.
    pub fn default_skin(&self) -> Result<Skin> {
        if let Some(skin) = self
            .store
            .find_by_title_and_official(DEFAULT_SKIN_TITLE, true)
        {
            return Ok(skin);
        }
        let mut skin = self
            .store
            .find_by_title(DEFAULT_SKIN_TITLE)
            .unwrap_or_else(|| Skin::new(DEFAULT_SKIN_TITLE).with_css("").with_role(Role::User));
        skin.public = true;
        skin.official = true;
        skin.icon = self.preview_icon()?;
        if skin.id == SkinId::default() {
            skin.id = self.store.insert(skin.clone())?;
            log::info!("created default skin {}", skin.id);
        } else {
            self.store.save(&skin)?;
        }
        self.refresh_layering()?;
        Ok(skin)
    }

    fn preview_icon(&self) -> Result<Option<String>> {
        let base = &self.config.site_skins_url;
        let candidate = match self.current_version()? {
            Some(version) => format!("{base}{version}/preview.png"),
            None => format!("{base}preview.png"),
        };
        Ok(self
            .config
            .public_path(&candidate)
            .is_file()
            .then_some(candidate))
    }

    /// Administrator's choice of system-wide default skin.
    pub fn admin_default(&self) -> Option<SkinId> {
        *self
            .admin_default
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_admin_default(&self, id: Option<SkinId>) -> Result<()> {
        if let Some(id) = id {
            self.store.get(id)?;
        }
        *self
            .admin_default
            .write()
            .unwrap_or_else(PoisonError::into_inner) = id;
        self.refresh_layering()?;
        Ok(())
    }

    /// Newest site design version on disk.
    pub fn current_version(&self) -> Result<Option<String>> {
        Ok(site_versions(&self.config.site_skins_dir())?.pop())
    }

    /// Umbrella skin of the newest site design version, if imported.
    pub fn current_site_skin(&self) -> Result<Option<Skin>> {
        Ok(self
            .current_version()?
            .and_then(|v| self.store.find_by_title_and_official(&umbrella_title(&v), true)))
    }

    /// Import every site design version found on disk.
    pub fn import_site_skins(&self) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        for version in site_versions(&self.config.site_skins_dir())? {
            report.versions.push(self.import_version(&version)?);
        }
        self.refresh_layering()?;
        log::info!("imported {} site version(s)", report.versions.len());
        Ok(report)
    }

    fn import_version(&self, version: &str) -> Result<VersionImport> {
        let scanned = scan_version(&self.config, version)?;

        let mut components = Vec::with_capacity(scanned.components.len());
        for fresh in &scanned.components {
            let id = match self.store.find_by_title(&fresh.title) {
                Some(mut skin) => {
                    skin.filename = fresh.filename.clone();
                    skin.description = fresh.description.clone();
                    skin.public = true;
                    skin.media = fresh.media.clone();
                    skin.role = fresh.role;
                    skin.ie_condition = fresh.ie_condition;
                    skin.unusable = true;
                    skin.official = true;
                    skin.icon = fresh.icon.clone();
                    self.store.save(&skin)?;
                    skin.id
                },
                None => self.store.insert(fresh.clone())?,
            };
            components.push(id);
        }

        let umbrella = match self.store.find_by_title(&umbrella_title(version)) {
            Some(mut skin) => {
                if skin.cached {
                    self.clear_cache(skin.id)?;
                    skin.cached = false;
                }
                self.store.clear_parents(skin.id)?;
                skin.icon = scanned.icon.clone();
                skin.official = true;
                self.store.save(&skin)?;
                skin.id
            },
            None => self.store.insert(scanned.umbrella())?,
        };
        for (position, parent) in (1..).zip(&components) {
            self.store.add_link(ParentLink {
                child: umbrella,
                parent: *parent,
                position,
            })?;
        }
        self.touch(umbrella);
        for id in &components {
            self.touch(*id);
        }

        let cached = self.config.environment.is_production_like();
        if cached {
            self.build_cache(umbrella)?;
        }
        log::info!(
            "site version {version}: umbrella {umbrella}, {} component(s)",
            components.len()
        );
        Ok(VersionImport {
            version: version.to_string(),
            umbrella,
            components,
            cached,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use drape_store::MemoryStore;
    use drape_types::{Media, RunEnvironment};

    fn catalog_in(dir: &Path) -> SkinCatalog<MemoryStore> {
        let config = DrapeConfig {
            public_root: dir.to_path_buf(),
            ..DrapeConfig::default()
        };
        SkinCatalog::new(MemoryStore::new(), config).unwrap()
    }

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn site_tree(dir: &Path) {
        write(dir, "stylesheets/site/2.0/1-core.css", "#core{}");
        write(dir, "stylesheets/site/2.0/2-print.css", "/* MEDIA: print */\n#print{}");
        write(dir, "stylesheets/site/2.0/preview.png", "png");
        write(dir, "stylesheets/site/1.0/1-core.css", "#old{}");
    }

    #[test]
    fn build_and_clear_cache() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let base = catalog.create_skin(Skin::new("Base").with_css("#base{}")).unwrap();
        let own = catalog
            .create_skin(Skin::new("Own").with_css("#own{}").with_role(Role::Override))
            .unwrap();
        catalog.link_parent(own, base, 1).unwrap();

        assert_eq!(catalog.build_cache(own).unwrap(), 2);
        let skin = catalog.store().get(own).unwrap();
        assert!(skin.cached && skin.is_approved());
        assert_eq!(catalog.cached_segments(own).unwrap().len(), 2);
        assert!(catalog.resolve(own, RoleSet::all()).unwrap().contains("<link"));

        catalog.clear_cache(own).unwrap();
        catalog.clear_cache(own).unwrap();
        assert!(!catalog.store().get(own).unwrap().cached);
        assert!(catalog.cached_segments(own).unwrap().is_empty());
        assert!(catalog.resolve(own, RoleSet::all()).unwrap().contains("#own{}"));
    }

    #[test]
    fn concurrent_builds_leave_one_complete_file_set() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let base = catalog.create_skin(Skin::new("Base").with_css("#base{}")).unwrap();
        let own = catalog
            .create_skin(Skin::new("Own").with_css("#own{}").with_media(vec![Media::Print]))
            .unwrap();
        catalog.link_parent(own, base, 1).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| catalog.build_cache(own).unwrap());
            }
        });
        let names: Vec<String> = catalog
            .cached_segments(own)
            .unwrap()
            .into_iter()
            .map(|seg| seg.file_name)
            .collect();
        assert_eq!(names, ["1_user_all_.css", "2_user_print_.css"]);
    }

    #[test]
    fn relinking_invalidates_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let root = catalog.create_skin(Skin::new("Root").with_css("#root{}")).unwrap();
        let mid = catalog.create_skin(Skin::new("Mid").with_css("#mid{}")).unwrap();
        let leaf = catalog.create_skin(Skin::new("Leaf").with_css("#leaf{}")).unwrap();
        catalog.link_parent(leaf, mid, 1).unwrap();
        assert!(!catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#root{}"));

        catalog.link_parent(mid, root, 1).unwrap();
        assert!(catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#root{}"));

        assert!(catalog.unlink_parent(mid, root).unwrap());
        assert!(!catalog.unlink_parent(mid, root).unwrap());
        assert!(!catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#root{}"));
    }

    #[test]
    fn saving_an_ancestor_refreshes_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let base = catalog.create_skin(Skin::new("Base").with_css("#v1{}")).unwrap();
        let leaf = catalog.create_skin(Skin::new("Leaf")).unwrap();
        catalog.link_parent(leaf, base, 1).unwrap();
        assert!(catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#v1{}"));

        let mut skin = catalog.store().get(base).unwrap();
        skin.css = Some("#v2{}".into());
        catalog.save_skin(&skin).unwrap();
        assert!(catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#v2{}"));
    }

    #[test]
    fn link_rules() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let a = catalog.create_skin(Skin::new("A")).unwrap();
        let b = catalog.create_skin(Skin::new("B")).unwrap();
        let c = catalog.create_skin(Skin::new("C")).unwrap();
        catalog.link_parent(a, b, 1).unwrap();
        assert!(catalog.link_parent(a, c, 1).is_err());
        assert!(matches!(
            catalog.link_parent(b, a, 1),
            Err(DrapeError::Graph(_))
        ));
        assert!(catalog.link_parent(a, a, 2).is_err());
    }

    #[test]
    fn delete_removes_links_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let base = catalog.create_skin(Skin::new("Base").with_css("#base{}")).unwrap();
        let leaf = catalog.create_skin(Skin::new("Leaf").with_css("#leaf{}")).unwrap();
        catalog.link_parent(leaf, base, 1).unwrap();
        catalog.build_cache(base).unwrap();
        let cache_dir = catalog
            .resolver()
            .files()
            .skin_dir(&catalog.store().get(base).unwrap());
        assert!(catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#base{}"));

        catalog.delete_skin(base).unwrap();
        assert!(!cache_dir.exists());
        assert!(catalog.store().parents(leaf).is_empty());
        assert!(!catalog.resolve(leaf, RoleSet::all()).unwrap().contains("#base{}"));
    }

    #[test]
    fn delete_during_builds_leaves_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let own = catalog.create_skin(Skin::new("Own").with_css("#own{}")).unwrap();
        catalog.build_cache(own).unwrap();

        std::thread::scope(|s| {
            s.spawn(|| while catalog.build_cache(own).is_ok() {});
            catalog.delete_skin(own).unwrap();
        });
        let prefix = format!("skin_{own}_");
        let left = crate::natural::dir_entries(catalog.resolver().files().root(), |n| {
            n.contains(&prefix)
        })
        .unwrap();
        assert!(left.is_empty(), "{left:?}");
    }

    #[test]
    fn default_skin_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_in(dir.path());
        let first = catalog.default_skin().unwrap();
        let second = catalog.default_skin().unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.is_approved());
        assert_eq!(first.effective_role(), Role::User);
        assert!(first.icon.is_none());
    }

    #[test]
    fn import_creates_umbrella_with_ordered_parents() {
        let dir = tempfile::tempdir().unwrap();
        site_tree(dir.path());
        let catalog = catalog_in(dir.path());
        let report = catalog.import_site_skins().unwrap();
        let versions: Vec<&str> = report.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, ["1.0", "2.0"]);

        let current = &report.versions[1];
        assert!(!current.cached);
        assert_eq!(catalog.store().parents(current.umbrella), current.components);
        assert_eq!(catalog.current_version().unwrap().as_deref(), Some("2.0"));
        let site = catalog.current_site_skin().unwrap().unwrap();
        assert_eq!(site.id, current.umbrella);
        assert_eq!(site.icon.as_deref(), Some("/stylesheets/site/2.0/preview.png"));
        assert_eq!(catalog.resolver().wrapper(), Some(current.umbrella));
    }

    #[test]
    fn reimport_keeps_ids_and_relinks() {
        let dir = tempfile::tempdir().unwrap();
        site_tree(dir.path());
        let catalog = catalog_in(dir.path());
        let first = catalog.import_site_skins().unwrap();
        write(dir.path(), "stylesheets/site/2.0/3-extra.css", "#extra{}");
        let second = catalog.import_site_skins().unwrap();

        let (a, b) = (&first.versions[1], &second.versions[1]);
        assert_eq!(a.umbrella, b.umbrella);
        assert_eq!(&b.components[..2], &a.components[..]);
        assert_eq!(b.components.len(), 3);
        assert_eq!(catalog.store().parents(b.umbrella), b.components);
    }

    #[test]
    fn site_skin_wraps_user_skins() {
        let dir = tempfile::tempdir().unwrap();
        site_tree(dir.path());
        let catalog = catalog_in(dir.path());
        catalog.import_site_skins().unwrap();
        let mine = catalog.create_skin(Skin::new("Mine").with_css("#mine{}")).unwrap();
        let out = catalog.resolve_default(mine).unwrap();
        let core = out.find("/stylesheets/site/2.0/1-core.css").unwrap();
        let own = out.find("#mine{}").unwrap();
        assert!(core < own);
        assert!(!out.contains("/stylesheets/site/1.0/"));
    }

    #[test]
    fn admin_default_replaces_site_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        site_tree(dir.path());
        let catalog = catalog_in(dir.path());
        catalog.import_site_skins().unwrap();
        let plain = catalog.default_skin().unwrap();
        let house = catalog
            .create_skin(Skin::new("House").with_css("#house{}").with_role(Role::Site))
            .unwrap();

        catalog.set_admin_default(Some(plain.id)).unwrap();
        assert_ne!(catalog.resolver().wrapper(), Some(plain.id));

        catalog.set_admin_default(Some(house)).unwrap();
        assert_eq!(catalog.resolver().wrapper(), Some(house));
        let mine = catalog.create_skin(Skin::new("Mine").with_css("#mine{}")).unwrap();
        assert!(catalog.resolve_default(mine).unwrap().starts_with("<style"));
        assert!(catalog.resolve_default(mine).unwrap().contains("#house{}"));

        catalog.set_admin_default(None).unwrap();
        assert_eq!(
            catalog.resolver().wrapper(),
            catalog.current_site_skin().unwrap().map(|s| s.id)
        );
    }

    #[test]
    fn production_import_builds_umbrella_cache() {
        let dir = tempfile::tempdir().unwrap();
        site_tree(dir.path());
        let config = DrapeConfig {
            public_root: dir.path().to_path_buf(),
            environment: RunEnvironment::Production,
            ..DrapeConfig::default()
        };
        let catalog = SkinCatalog::new(MemoryStore::new(), config).unwrap();
        let report = catalog.import_site_skins().unwrap();
        let current = &report.versions[1];
        assert!(current.cached);
        let segments = catalog.cached_segments(current.umbrella).unwrap();
        let names: Vec<&str> = segments.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, ["1_site_screen_.css", "2_site_print_.css"]);

        // Re-import clears the stale cache before rebuilding it.
        let again = catalog.import_site_skins().unwrap();
        assert_eq!(again.versions[1].umbrella, current.umbrella);
        assert_eq!(catalog.cached_segments(current.umbrella).unwrap().len(), 2);
    }
}
