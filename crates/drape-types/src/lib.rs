//! Foundation types for drape.
//!
//! This crate contains the types shared by every drape crate: the closed
//! enumerations a skin is classified by (role, media, legacy browser
//! condition), the skin entity itself, configuration, and error types.

pub mod config;
pub mod error;
pub mod kinds;
pub mod skin;

pub use config::{DrapeConfig, RunEnvironment};
pub use error::{DrapeError, Result};
pub use kinds::{DEFAULT_MEDIA, IeCondition, Media, Role, RoleSet};
pub use skin::{Skin, SkinId, WizardSettings};
