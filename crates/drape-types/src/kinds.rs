//! Closed enumerations a skin is classified by.
//!
//! Every stylesheet fragment in a cascade is bucketed by its [`Role`], its
//! list of [`Media`] and an optional [`IeCondition`]. Values arrive already
//! validated from the data-entry boundary; parsing an unknown token here is
//! an error rather than a silent drop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DrapeError, Result};

/// Media applied when a skin lists none.
pub const DEFAULT_MEDIA: &[Media] = &[Media::All];

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Cascade behavior of a skin.
///
/// `User` and `Override` are offered to end users; the remaining roles are
/// reserved for system skins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Adds on to the archive skin.
    #[default]
    User,
    /// Replaces the archive skin entirely.
    Override,
    Admin,
    Translator,
    Site,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 5] = [
        Role::User,
        Role::Override,
        Role::Admin,
        Role::Translator,
        Role::Site,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Override => "override",
            Role::Admin => "admin",
            Role::Translator => "translator",
            Role::Site => "site",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DrapeError;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DrapeError::Codec(format!("unknown role `{s}`")))
    }
}

// ---------------------------------------------------------------------------
// RoleSet
// ---------------------------------------------------------------------------

/// A set of roles to include when resolving a cascade.
///
/// Stored as a bitmask, so equal sets always compare and hash equal no
/// matter the insertion order. This makes it usable directly as part of a
/// memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All five roles.
    pub fn all() -> Self {
        Role::ALL.into_iter().collect()
    }

    /// `user`, `override` and `site`: what a rendered page includes unless
    /// told otherwise.
    pub fn default_roles() -> Self {
        [Role::User, Role::Override, Role::Site].into_iter().collect()
    }

    pub fn only(role: Role) -> Self {
        Self(role.bit())
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Roles in the set, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for RoleSet {
    type Err = DrapeError;

    /// Parse a comma-separated role list such as `user,override`.
    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Role::from_str)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// A media type a skin's stylesheet applies to.
///
/// Besides the plain CSS media types there are two responsive breakpoint
/// queries. Those are the only entries that are not a single alphanumeric
/// word, which is why they get dedicated filename tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Media {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "screen")]
    Screen,
    #[serde(rename = "handheld")]
    Handheld,
    #[serde(rename = "speech")]
    Speech,
    #[serde(rename = "print")]
    Print,
    #[serde(rename = "braille")]
    Braille,
    #[serde(rename = "embossed")]
    Embossed,
    #[serde(rename = "projection")]
    Projection,
    #[serde(rename = "tty")]
    Tty,
    #[serde(rename = "tv")]
    Tv,
    #[serde(rename = "only screen and (max-width: 42em)")]
    Narrow,
    #[serde(rename = "only screen and (max-width: 62em)")]
    Midsize,
}

impl Media {
    pub const ALL: [Media; 12] = [
        Media::All,
        Media::Screen,
        Media::Handheld,
        Media::Speech,
        Media::Print,
        Media::Braille,
        Media::Embossed,
        Media::Projection,
        Media::Tty,
        Media::Tv,
        Media::Narrow,
        Media::Midsize,
    ];

    /// The media query as it appears in a `media` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Media::All => "all",
            Media::Screen => "screen",
            Media::Handheld => "handheld",
            Media::Speech => "speech",
            Media::Print => "print",
            Media::Braille => "braille",
            Media::Embossed => "embossed",
            Media::Projection => "projection",
            Media::Tty => "tty",
            Media::Tv => "tv",
            Media::Narrow => "only screen and (max-width: 42em)",
            Media::Midsize => "only screen and (max-width: 62em)",
        }
    }

    /// Filesystem-safe single word for this media entry.
    pub fn filename_token(self) -> &'static str {
        match self {
            Media::Narrow => "narrow",
            Media::Midsize => "midsize",
            other => other.as_str(),
        }
    }

    /// Inverse of [`Media::filename_token`].
    pub fn from_filename_token(token: &str) -> Result<Self> {
        Media::ALL
            .into_iter()
            .find(|m| m.filename_token() == token)
            .ok_or_else(|| DrapeError::Codec(format!("unknown media token `{token}`")))
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Media {
    type Err = DrapeError;

    /// Parse a media query. Breakpoint queries are recognized by their width,
    /// so `screen and (max-width: 42em)` also maps to [`Media::Narrow`].
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains("max-width: 42em") {
            return Ok(Media::Narrow);
        }
        if s.contains("max-width: 62em") {
            return Ok(Media::Midsize);
        }
        Media::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DrapeError::Codec(format!("unknown media `{s}`")))
    }
}

// ---------------------------------------------------------------------------
// IeCondition
// ---------------------------------------------------------------------------

/// Legacy Internet Explorer conditional-comment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IeCondition {
    #[serde(rename = "IE")]
    Ie,
    #[serde(rename = "IE5")]
    Ie5,
    #[serde(rename = "IE6")]
    Ie6,
    #[serde(rename = "IE7")]
    Ie7,
    #[serde(rename = "IE8")]
    Ie8,
    #[serde(rename = "IE9")]
    Ie9,
    #[serde(rename = "IE8_or_lower")]
    Ie8OrLower,
}

impl IeCondition {
    pub const ALL: [IeCondition; 7] = [
        IeCondition::Ie,
        IeCondition::Ie5,
        IeCondition::Ie6,
        IeCondition::Ie7,
        IeCondition::Ie8,
        IeCondition::Ie9,
        IeCondition::Ie8OrLower,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IeCondition::Ie => "IE",
            IeCondition::Ie5 => "IE5",
            IeCondition::Ie6 => "IE6",
            IeCondition::Ie7 => "IE7",
            IeCondition::Ie8 => "IE8",
            IeCondition::Ie9 => "IE9",
            IeCondition::Ie8OrLower => "IE8_or_lower",
        }
    }

    /// Comparison operator for the conditional comment, if any.
    ///
    /// `or_lower` tags compare with `lte`, `or_higher` tags with `gte`, and
    /// everything else is an exact match.
    pub fn comparison(self) -> Option<&'static str> {
        let tag = self.as_str();
        if tag.contains("or_lower") {
            Some("lte")
        } else if tag.contains("or_higher") {
            Some("gte")
        } else {
            None
        }
    }

    /// IE version number carried by the tag (`None` for plain `IE`).
    pub fn version(self) -> Option<u8> {
        let digits: String = self
            .as_str()
            .trim_start_matches("IE")
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

impl fmt::Display for IeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IeCondition {
    type Err = DrapeError;

    fn from_str(s: &str) -> Result<Self> {
        IeCondition::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DrapeError::Codec(format!("unknown ie condition `{s}`")))
    }
}
