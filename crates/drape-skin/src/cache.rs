//! Pre-built cascade files.
//!
//! A cached skin owns one directory, `skin_<id>_<title>`, under the skins
//! root. It holds numbered segment files named `<n>_<sheet role>.css`; each
//! segment is the concatenated CSS of consecutive cascade members that share
//! a role, media list and legacy condition. Reading them back in natural
//! order reproduces the cascade.
//!
//! Builds go to a scratch directory that is renamed into place at the end,
//! so a failed build leaves the previous file set untouched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use drape_types::{DrapeConfig, DrapeError, Result, Skin, SkinId};

use crate::codec::SheetRole;
use crate::natural::dir_entries;
use crate::wizard::wizard_css;

/// One segment file of a cached skin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSegment {
    pub sequence: u64,
    pub file_name: String,
    pub sheet_role: SheetRole,
}

/// Directory name of a skin's cache: `skin_<id>_<title>` with every
/// non-word character of the title replaced by `_`, lower-cased.
pub fn dirname(skin: &Skin) -> String {
    let title: String = skin
        .title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("skin_{}_{}", skin.id, title).to_lowercase()
}

/// Split a segment file name into its sequence number and sheet role token.
pub fn parse_segment_name(name: &str) -> Option<(u64, &str)> {
    let stem = name.strip_suffix(".css")?;
    let (sequence, token) = stem.split_once('_')?;
    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((sequence.parse().ok()?, token))
}

/// File-backed cascade cache.
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
    public_root: PathBuf,
    url_prefix: String,
    build_locks: Mutex<HashMap<SkinId, Arc<Mutex<()>>>>,
}

impl FileCache {
    pub fn new(config: &DrapeConfig) -> Self {
        Self {
            root: config.skins_dir(),
            public_root: config.public_root.clone(),
            url_prefix: config.skins_url.clone(),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding every skin's cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skin_dir(&self, skin: &Skin) -> PathBuf {
        self.root.join(dirname(skin))
    }

    /// Public URL of one segment file.
    pub fn segment_url(&self, skin: &Skin, file_name: &str) -> String {
        format!("{}{}/{}", self.url_prefix, dirname(skin), file_name)
    }

    /// Lock serializing builds and clears of one skin's directory.
    pub fn build_lock(&self, id: SkinId) -> Arc<Mutex<()>> {
        let mut locks = self
            .build_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    /// CSS text a skin contributes: its stylesheet file, its literal CSS,
    /// or its wizard CSS, in that order of precedence.
    pub fn skin_css(&self, skin: &Skin) -> Result<String> {
        if let Some(file) = skin.file_reference() {
            let path = self.public_root.join(file.trim_start_matches('/'));
            return fs::read_to_string(&path).map_err(|e| {
                log::warn!("stylesheet {} of skin {} unreadable", path.display(), skin.id);
                DrapeError::Cache(format!(
                    "skin {} stylesheet {}: {e}",
                    skin.id,
                    path.display()
                ))
            });
        }
        if let Some(css) = skin.literal_css() {
            return Ok(css.to_string());
        }
        Ok(wizard_css(&skin.wizard))
    }

    /// Write the segment files for `skin`, whose full cascade (ancestors
    /// first, `skin` last) is `cascade`. Returns the number of files written.
    ///
    /// Callers hold [`FileCache::build_lock`] for the skin.
    pub fn write_segments(&self, skin: &Skin, cascade: &[Skin]) -> Result<usize> {
        fs::create_dir_all(&self.root)?;
        let name = dirname(skin);
        let scratch = self
            .root
            .join(format!(".{name}.building-{}", std::process::id()));
        remove_dir_if_present(&scratch)?;
        fs::create_dir(&scratch)?;

        let written = match self.fill(&scratch, cascade) {
            Ok(n) => n,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&scratch) {
                    log::warn!("leaving {}: {cleanup}", scratch.display());
                }
                return Err(e);
            },
        };

        let retired = self
            .root
            .join(format!(".{name}.old-{}", std::process::id()));
        swap_in(&scratch, &self.root.join(&name), &retired)?;
        self.remove_dirs_of(skin.id, Some(name.as_str()))?;
        log::info!("cached skin {} as {written} segment(s) in {name}", skin.id);
        Ok(written)
    }

    fn fill(&self, dir: &Path, cascade: &[Skin]) -> Result<usize> {
        let mut sequence = 1;
        let mut current: Option<String> = None;
        let mut css = String::new();
        for member in cascade {
            let key = SheetRole::of_contribution(member).encode();
            if current.as_deref() != Some(key.as_str()) {
                if let Some(prev) = current.take()
                    && flush(dir, sequence, &prev, &css)?
                {
                    sequence += 1;
                }
                css.clear();
                current = Some(key);
            }
            css.push_str(&self.skin_css(member)?);
        }
        if let Some(last) = current
            && flush(dir, sequence, &last, &css)?
        {
            sequence += 1;
        }
        Ok(sequence - 1)
    }

    /// Segment files of a skin, in natural order. A missing directory means
    /// no segments; a file whose role token does not decode is skipped.
    pub fn read_segments(&self, skin: &Skin) -> Result<Vec<CachedSegment>> {
        let names = dir_entries(&self.skin_dir(skin), |n| parse_segment_name(n).is_some())?;
        let mut segments = Vec::with_capacity(names.len());
        for file_name in names {
            let Some((sequence, token)) = parse_segment_name(&file_name) else {
                continue;
            };
            match SheetRole::decode(token) {
                Ok(sheet_role) => segments.push(CachedSegment {
                    sequence,
                    sheet_role,
                    file_name,
                }),
                Err(e) => log::warn!("skipping cache file {file_name} of skin {}: {e}", skin.id),
            }
        }
        Ok(segments)
    }

    /// Delete every cache directory of the skin. Missing directories are
    /// not an error.
    pub fn remove(&self, skin: &Skin) -> Result<()> {
        self.remove_dirs_of(skin.id, None)
    }

    /// Directories are looked up by id prefix so a cache built under an
    /// older title is removed too. `keep` names one directory to spare.
    fn remove_dirs_of(&self, id: SkinId, keep: Option<&str>) -> Result<()> {
        let prefix = format!("skin_{id}_");
        for name in dir_entries(&self.root, |n| n.starts_with(&prefix) && Some(n) != keep)? {
            let path = self.root.join(&name);
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
                log::debug!("removed {}", path.display());
            }
        }
        Ok(())
    }
}

/// Write one segment if it has any CSS. Returns whether a file was written.
fn flush(dir: &Path, sequence: usize, token: &str, css: &str) -> Result<bool> {
    if css.trim().is_empty() {
        return Ok(false);
    }
    let file = dir.join(format!("{sequence}_{token}.css"));
    fs::write(&file, css)?;
    log::debug!("wrote {}", file.display());
    Ok(true)
}

/// Replace `target` with `scratch`. An existing `target` is parked at
/// `retired` until the rename succeeds, and put back if it fails.
fn swap_in(scratch: &Path, target: &Path, retired: &Path) -> Result<()> {
    remove_dir_if_present(retired)?;
    let parked = target.is_dir();
    if parked {
        fs::rename(target, retired)?;
    }
    if let Err(e) = fs::rename(scratch, target) {
        if parked && let Err(restore) = fs::rename(retired, target) {
            log::warn!("could not restore {}: {restore}", target.display());
        }
        if let Err(cleanup) = remove_dir_if_present(scratch) {
            log::warn!("leaving {}: {cleanup}", scratch.display());
        }
        return Err(e.into());
    }
    if parked && let Err(e) = fs::remove_dir_all(retired) {
        log::warn!("leaving {}: {e}", retired.display());
    }
    Ok(())
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
