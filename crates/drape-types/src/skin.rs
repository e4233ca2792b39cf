//! The skin entity.
//!
//! A skin is a node in the inheritance graph: one contribution of CSS (a
//! literal block, a static stylesheet file, or wizard knobs) plus the
//! classification that decides where in the cascade it lands. Parent links
//! live in the store, not on the skin.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kinds::{DEFAULT_MEDIA, IeCondition, Media, Role};

/// Opaque skin identity assigned by the store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SkinId(pub u64);

impl fmt::Display for SkinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Scalar style knobs that synthesize CSS when a skin has neither literal
/// CSS nor a stylesheet file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Work margin, in percent.
    pub margin: Option<f64>,
    /// Base font size, in percent.
    pub base_em: Option<f64>,
    /// Comma-separated font family list.
    pub font: Option<String>,
    pub background_color: Option<String>,
    /// Paragraph bottom margin, in em.
    pub paragraph_margin: Option<f64>,
    pub foreground_color: Option<String>,
    pub header_color: Option<String>,
    pub accent_color: Option<String>,
}

impl WizardSettings {
    /// Whether any knob is set. Blank strings count as unset.
    pub fn is_set(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        self.margin.is_some()
            || self.base_em.is_some()
            || self.paragraph_margin.is_some()
            || present(&self.font)
            || present(&self.background_color)
            || present(&self.foreground_color)
            || present(&self.header_color)
            || present(&self.accent_color)
    }
}

/// A themeable bundle of CSS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skin {
    pub id: SkinId,
    /// Unique, human-readable title.
    pub title: String,
    pub description: String,
    /// Literal CSS, already sanitized upstream.
    pub css: Option<String>,
    /// Path of a static stylesheet under the public root. Takes precedence
    /// over `css` when both are present.
    pub filename: Option<String>,
    /// Ordered media list; empty means [`DEFAULT_MEDIA`].
    pub media: Vec<Media>,
    pub ie_condition: Option<IeCondition>,
    /// `None` means [`Role::User`].
    pub role: Option<Role>,
    /// Whether this skin's cascade has been pre-built to files.
    pub cached: bool,
    pub public: bool,
    pub official: bool,
    /// System component skins that cannot be picked on their own.
    pub unusable: bool,
    /// Preview image path.
    pub icon: Option<String>,
    pub wizard: WizardSettings,
}

impl Skin {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_media(mut self, media: impl Into<Vec<Media>>) -> Self {
        self.media = media.into();
        self
    }

    pub fn with_ie_condition(mut self, condition: IeCondition) -> Self {
        self.ie_condition = Some(condition);
        self
    }

    pub fn with_wizard(mut self, wizard: WizardSettings) -> Self {
        self.wizard = wizard;
        self
    }

    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or_default()
    }

    pub fn effective_media(&self) -> &[Media] {
        if self.media.is_empty() {
            DEFAULT_MEDIA
        } else {
            &self.media
        }
    }

    /// Media list as it appears in a `media` attribute.
    pub fn media_attr(&self) -> String {
        self.effective_media()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Public and official: visible to everyone.
    pub fn is_approved(&self) -> bool {
        self.public && self.official
    }

    pub fn has_wizard_settings(&self) -> bool {
        self.wizard.is_set()
    }

    /// Literal CSS, if present and non-blank.
    pub fn literal_css(&self) -> Option<&str> {
        self.css.as_deref().filter(|css| !css.trim().is_empty())
    }

    /// Stylesheet file reference, if present and non-blank.
    pub fn file_reference(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_user() {
        let skin = Skin::new("Plain");
        assert_eq!(skin.effective_role(), Role::User);
        assert_eq!(skin.with_role(Role::Site).effective_role(), Role::Site);
    }

    #[test]
    fn media_defaults_to_all() {
        let skin = Skin::new("Plain");
        assert_eq!(skin.effective_media(), &[Media::All]);
        assert_eq!(skin.media_attr(), "all");
    }

    #[test]
    fn media_attr_joins_queries() {
        let skin = Skin::new("Narrow").with_media(vec![Media::Screen, Media::Narrow]);
        assert_eq!(
            skin.media_attr(),
            "screen, only screen and (max-width: 42em)"
        );
    }

    #[test]
    fn blank_css_is_not_literal() {
        assert!(Skin::new("a").with_css("   \n").literal_css().is_none());
        assert_eq!(
            Skin::new("b").with_css("p { }").literal_css(),
            Some("p { }")
        );
    }

    #[test]
    fn wizard_blank_strings_are_unset() {
        let mut wizard = WizardSettings {
            font: Some("  ".into()),
            ..WizardSettings::default()
        };
        assert!(!wizard.is_set());
        wizard.margin = Some(5.0);
        assert!(wizard.is_set());
    }

    #[test]
    fn approval_needs_both_flags() {
        let mut skin = Skin::new("Shared");
        skin.public = true;
        assert!(!skin.is_approved());
        skin.official = true;
        assert!(skin.is_approved());
    }

    #[test]
    fn skin_round_trips_through_toml() {
        let skin = Skin::new("Dark")
            .with_css("body { color: #eee; }")
            .with_role(Role::Override)
            .with_media(vec![Media::Screen, Media::Midsize])
            .with_ie_condition(IeCondition::Ie8OrLower);
        let text = toml::to_string(&skin).unwrap();
        let back: Skin = toml::from_str(&text).unwrap();
        assert_eq!(back, skin);
    }
}
