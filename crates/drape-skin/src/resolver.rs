//! Cascade resolution: turn a skin and a role filter into page markup.

use std::sync::{PoisonError, RwLock};

use drape_store::SkinStore;
use drape_types::{Result, Role, RoleSet, Skin, SkinId};

use crate::cache::FileCache;
use crate::graph::SkinGraph;
use crate::markup::{ie_comment, style_block, stylesheet_link};
use crate::memo::MarkupCache;
use crate::wizard::wizard_css;

/// Resolves skins to markup, memoizing the result per `(skin, roles)`.
///
/// Skins whose role is neither `override` nor `site` are wrapped: the markup
/// of the layering skin (see [`CascadeResolver::set_wrapper`]) is emitted
/// before their own.
#[derive(Debug)]
pub struct CascadeResolver {
    files: FileCache,
    memo: MarkupCache,
    wrapper: RwLock<Option<SkinId>>,
    max_depth: usize,
}

impl CascadeResolver {
    pub fn new(files: FileCache, max_depth: usize) -> Self {
        Self {
            files,
            memo: MarkupCache::new(),
            wrapper: RwLock::new(None),
            max_depth,
        }
    }

    pub fn files(&self) -> &FileCache {
        &self.files
    }

    pub fn memo(&self) -> &MarkupCache {
        &self.memo
    }

    pub fn graph<'a, S: SkinStore + ?Sized>(&self, store: &'a S) -> SkinGraph<'a, S> {
        SkinGraph::new(store, self.max_depth)
    }

    /// Skin that wraps user skins, if any.
    pub fn wrapper(&self) -> Option<SkinId> {
        *self.wrapper.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the wrapping skin. Every memoized entry may embed the old
    /// wrapper, so all of them are dropped on change.
    pub fn set_wrapper(&self, wrapper: Option<SkinId>) {
        let mut current = self.wrapper.write().unwrap_or_else(PoisonError::into_inner);
        if *current != wrapper {
            log::debug!("layering skin changed from {current:?} to {wrapper:?}");
            *current = wrapper;
            self.memo.invalidate_all();
        }
    }

    /// Forget memoized markup of the given skins. Touching the wrapper
    /// invalidates everything.
    pub fn invalidate(&self, ids: &[SkinId]) {
        if let Some(wrapper) = self.wrapper()
            && ids.contains(&wrapper)
        {
            self.memo.invalidate_all();
            return;
        }
        for id in ids {
            self.memo.invalidate(*id);
        }
    }

    /// Markup for `id` with only the roles in `roles`.
    pub fn resolve<S: SkinStore + ?Sized>(
        &self,
        store: &S,
        id: SkinId,
        roles: RoleSet,
    ) -> Result<String> {
        if let Some(markup) = self.memo.get(id, roles) {
            log::debug!("memoized markup for skin {id} ({roles})");
            return Ok(markup);
        }
        let stamp = self.memo.stamp(id);
        let skin = store.get(id)?;

        let mut markup = String::new();
        if let Some(wrapper) = self.wrapper()
            && wrapper != id
            && !matches!(skin.effective_role(), Role::Override | Role::Site)
        {
            markup.push_str(&self.resolve(store, wrapper, roles)?);
        }
        markup.push_str(&self.style_block(store, &skin, roles)?);

        self.memo.insert(id, roles, markup.clone(), stamp);
        Ok(markup)
    }

    /// The skin's own cascade, without wrapping: cached segment links when
    /// the skin is cached, a live walk otherwise.
    pub fn style_block<S: SkinStore + ?Sized>(
        &self,
        store: &S,
        skin: &Skin,
        roles: RoleSet,
    ) -> Result<String> {
        if skin.cached {
            match self.cached_block(skin, roles) {
                Ok(block) => return Ok(block),
                Err(e) => log::warn!("cache of skin {} unreadable, resolving live: {e}", skin.id),
            }
        }
        let mut block = String::new();
        for member in self.graph(store).cascade(skin.id)? {
            let single = single_block(&member, roles);
            if !single.is_empty() {
                block.push_str(&single);
                block.push('\n');
            }
        }
        Ok(block)
    }

    fn cached_block(&self, skin: &Skin, roles: RoleSet) -> Result<String> {
        let mut block = String::new();
        for segment in self.files.read_segments(skin)? {
            let sheet = &segment.sheet_role;
            if !roles.contains(sheet.role) {
                continue;
            }
            let href = self.files.segment_url(skin, &segment.file_name);
            let link = stylesheet_link(&href, &sheet.media_attr());
            block.push_str(&ie_comment(&link, sheet.ie_condition));
            block.push('\n');
        }
        Ok(block)
    }
}

/// Markup one skin contributes on its own, or nothing if its role is
/// filtered out.
///
/// A stylesheet file wins over literal CSS, which wins over wizard CSS.
/// Wizard output is never wrapped in a legacy conditional.
pub fn single_block(skin: &Skin, roles: RoleSet) -> String {
    if !roles.contains(skin.effective_role()) {
        return String::new();
    }
    let media = skin.media_attr();
    if let Some(file) = skin.file_reference() {
        return ie_comment(&stylesheet_link(file, &media), skin.ie_condition);
    }
    if let Some(css) = skin.literal_css() {
        return ie_comment(&style_block(&media, css), skin.ie_condition);
    }
    let css = wizard_css(&skin.wizard);
    if css.is_empty() {
        String::new()
    } else {
        style_block(&media, &css)
    }
}
