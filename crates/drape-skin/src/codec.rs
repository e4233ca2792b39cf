//! Sheet role tokens.
//!
//! A cache segment file is named after the `(role, media, ie condition)`
//! bucket its CSS belongs to. The token is `role_media_ie`, with the media
//! list joined by `.` and the breakpoint queries replaced by single words:
//!
//! | Bucket | Token |
//! |--------|-------|
//! | user, `[all]`, none | `user_all_` |
//! | override, `[screen, (max-width: 42em)]`, none | `override_screen.narrow_` |
//! | site, `[print]`, `IE8_or_lower` | `site_print_IE8_or_lower` |
//!
//! Decoding splits on the first two `_` only, since condition tags may
//! themselves contain underscores.

use std::fmt;
use std::str::FromStr;

use drape_types::{DrapeError, IeCondition, Media, Result, Role, Skin};

/// The cascade bucket a stylesheet fragment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRole {
    pub role: Role,
    /// Ordered, non-empty media list.
    pub media: Vec<Media>,
    pub ie_condition: Option<IeCondition>,
}

impl SheetRole {
    pub fn new(role: Role, media: Vec<Media>, ie_condition: Option<IeCondition>) -> Self {
        Self {
            role,
            media,
            ie_condition,
        }
    }

    /// The bucket a skin's own contribution falls into.
    pub fn of(skin: &Skin) -> Self {
        Self::new(
            skin.effective_role(),
            skin.effective_media().to_vec(),
            skin.ie_condition,
        )
    }

    /// The bucket a skin's CSS is cached under. Wizard CSS is never gated
    /// by a legacy condition, so a skin contributing only wizard CSS files
    /// without one.
    pub fn of_contribution(skin: &Skin) -> Self {
        let mut sheet = Self::of(skin);
        if skin.file_reference().is_none() && skin.literal_css().is_none() {
            sheet.ie_condition = None;
        }
        sheet
    }

    /// Filesystem-safe token naming this bucket.
    pub fn encode(&self) -> String {
        let media: Vec<&str> = self.media.iter().map(|m| m.filename_token()).collect();
        format!(
            "{}_{}_{}",
            self.role.as_str(),
            media.join("."),
            self.ie_condition.map(IeCondition::as_str).unwrap_or_default()
        )
    }

    /// Parse a token produced by [`SheetRole::encode`].
    pub fn decode(token: &str) -> Result<Self> {
        let mut parts = token.splitn(3, '_');
        let (Some(role), Some(media), Some(ie)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(DrapeError::Codec(format!(
                "sheet role `{token}` needs three `_`-separated parts"
            )));
        };
        let role: Role = role.parse()?;
        if media.is_empty() {
            return Err(DrapeError::Codec(format!(
                "sheet role `{token}` has no media"
            )));
        }
        let media = media
            .split('.')
            .map(Media::from_filename_token)
            .collect::<Result<Vec<_>>>()?;
        let ie_condition = if ie.is_empty() {
            None
        } else {
            Some(ie.parse()?)
        };
        Ok(Self::new(role, media, ie_condition))
    }

    /// Media list as it appears in a `media` attribute.
    pub fn media_attr(&self) -> String {
        self.media
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SheetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for SheetRole {
    type Err = DrapeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
