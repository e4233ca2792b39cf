//! Skin cascade engine.
//!
//! A skin is a bundle of CSS that may inherit from ordered parent skins. The
//! engine walks that inheritance graph to produce the markup a page embeds,
//! either live (inline CSS and stylesheet links per contributing skin) or
//! from a pre-built file cache that merges adjacent skins sharing a role,
//! media list and legacy condition into one stylesheet.

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod graph;
pub mod import;
pub mod markup;
mod memo;
pub mod natural;
pub mod resolver;
mod wizard;

pub use cache::{CachedSegment, FileCache};
pub use catalog::{DEFAULT_SKIN_TITLE, ImportReport, SkinCatalog, VersionImport};
pub use codec::SheetRole;
pub use graph::{Ancestors, SkinGraph};
pub use memo::{MarkupCache, Stamp};
pub use natural::{NaturalKey, natural_key, sort_naturally};
pub use resolver::{CascadeResolver, single_block};
pub use wizard::wizard_css;
