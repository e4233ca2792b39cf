//! Site-default skin import.
//!
//! The site import root holds one directory per design version, named
//! `<major>.<minor>`. Each version directory contains numbered stylesheets
//! `<position>-<title>.css` and an optional `preview.png`. The first line of
//! a stylesheet may carry directives overriding the component defaults:
//!
//! ```text
//! /* ROLE: override MEDIA: screen, print ENDMEDIA IE_CONDITION: IE8_or_lower */
//! ```
//!
//! Scanning is read-only; [`crate::SkinCatalog::import_site_skins`] applies
//! the result to a store.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use drape_types::{DrapeConfig, DrapeError, IeCondition, Media, Result, Role, Skin};

use crate::natural::dir_entries;

const PREVIEW: &str = "preview.png";

/// Title of the skin layering every component of `version`.
pub fn umbrella_title(version: &str) -> String {
    format!("Archive {version}")
}

/// `<major>.<minor>`, both all digits.
pub fn is_version_name(name: &str) -> bool {
    let Some((major, minor)) = name.split_once('.') else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(major) && digits(minor)
}

/// Split `<position>-<title>.css` into its position and raw title.
pub fn parse_stylesheet_name(name: &str) -> Option<(u32, &str)> {
    let stem = name.strip_suffix(".css")?;
    let (position, title) = stem.split_once('-')?;
    if position.is_empty() || !position.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((position.parse().ok()?, title))
}

/// Version directory names under `root`, oldest first.
pub fn site_versions(root: &Path) -> Result<Vec<String>> {
    let mut versions = dir_entries(root, is_version_name)?;
    versions.retain(|v| root.join(v).is_dir());
    Ok(versions)
}

/// Overrides read from a stylesheet's first line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub role: Option<Role>,
    pub media: Option<Vec<Media>>,
    pub ie_condition: Option<IeCondition>,
}

impl Directives {
    pub fn parse(line: &str) -> Result<Self> {
        let mut directives = Self::default();
        if let Some(word) = word_after(line, "ROLE: ") {
            directives.role = Some(word.parse()?);
        }
        if let Some(list) = list_after(line) {
            let media = list
                .split(',')
                .map(|m| m.trim().parse())
                .collect::<Result<Vec<Media>>>()?;
            directives.media = Some(media);
        } else if let Some(word) = word_after(line, "MEDIA: ") {
            directives.media = Some(vec![word.parse()?]);
        }
        if let Some(word) = word_after(line, "IE_CONDITION: ") {
            directives.ie_condition = Some(word.parse()?);
        }
        Ok(directives)
    }
}

/// The run of word characters following `marker`, if any.
fn word_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Text between `MEDIA: ` and the nearest following ` ENDMEDIA`.
fn list_after(line: &str) -> Option<&str> {
    let start = line.find("MEDIA: ")? + "MEDIA: ".len();
    let rest = &line[start..];
    let end = rest.find(" ENDMEDIA")?;
    Some(&rest[..end])
}

/// One scanned version directory.
#[derive(Debug, Clone)]
pub struct SiteVersion {
    pub version: String,
    /// Public URL of the preview image, if the directory has one.
    pub icon: Option<String>,
    /// Component skins in position order, not yet stored.
    pub components: Vec<Skin>,
}

impl SiteVersion {
    /// Fresh umbrella skin for this version.
    pub fn umbrella(&self) -> Skin {
        let mut skin = Skin::new(umbrella_title(&self.version))
            .with_css("")
            .with_role(Role::Site)
            .with_media(vec![Media::Screen]);
        skin.description = format!("Version {} of the default Archive style.", self.version);
        skin.public = true;
        skin.official = true;
        skin.icon = self.icon.clone();
        skin
    }
}

/// Read the component stylesheets of one version directory.
pub fn scan_version(config: &DrapeConfig, version: &str) -> Result<SiteVersion> {
    let dir = config.site_skins_dir().join(version);
    let url = format!("{}{version}/", config.site_skins_url);
    let icon = dir.join(PREVIEW).is_file().then(|| format!("{url}{PREVIEW}"));

    let mut components = Vec::new();
    for file in dir_entries(&dir, |n| parse_stylesheet_name(n).is_some())? {
        let Some((position, raw_title)) = parse_stylesheet_name(&file) else {
            continue;
        };
        let title = raw_title.replace(['-', '_'], " ");
        let directives = Directives::parse(&first_line(&dir.join(&file))?)
            .map_err(|e| DrapeError::Import(format!("{version}/{file}: {e}")))?;

        let mut skin = Skin::new(format!("Archive {version}: ({position}) {title}"))
            .with_filename(format!("{url}{file}"))
            .with_role(directives.role.unwrap_or(Role::Site))
            .with_media(directives.media.unwrap_or_else(|| vec![Media::Screen]));
        skin.ie_condition = directives.ie_condition;
        skin.description = format!(
            "Version {version} of the {title} component ({position}) of the default archive site design."
        );
        skin.public = true;
        skin.official = true;
        skin.unusable = true;
        skin.icon = icon.clone();
        components.push(skin);
    }
    log::debug!("version {version}: {} component(s)", components.len());
    Ok(SiteVersion {
        version: version.to_string(),
        icon,
        components,
    })
}

fn first_line(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .map_err(|e| DrapeError::Import(format!("{}: {e}", path.display())))?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> DrapeConfig {
        DrapeConfig {
            public_root: dir.to_path_buf(),
            ..DrapeConfig::default()
        }
    }

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn version_names() {
        assert!(is_version_name("1.0"));
        assert!(is_version_name("10.12"));
        assert!(!is_version_name("1"));
        assert!(!is_version_name("1.0.2"));
        assert!(!is_version_name("v1.0"));
        assert!(!is_version_name("preview.png"));
    }

    #[test]
    fn stylesheet_names() {
        assert_eq!(parse_stylesheet_name("01-core.css"), Some((1, "core")));
        assert_eq!(
            parse_stylesheet_name("12-site-chrome.css"),
            Some((12, "site-chrome"))
        );
        assert_eq!(parse_stylesheet_name("core.css"), None);
        assert_eq!(parse_stylesheet_name("01-core.css.bak"), None);
        assert_eq!(parse_stylesheet_name("-core.css"), None);
    }

    #[test]
    fn directives_all_present() {
        let d = Directives::parse(
            "/* ROLE: override MEDIA: screen, print ENDMEDIA IE_CONDITION: IE8_or_lower */",
        )
        .unwrap();
        assert_eq!(d.role, Some(Role::Override));
        assert_eq!(d.media, Some(vec![Media::Screen, Media::Print]));
        assert_eq!(d.ie_condition, Some(IeCondition::Ie8OrLower));
    }

    #[test]
    fn single_word_media() {
        let d = Directives::parse("/* MEDIA: print */").unwrap();
        assert_eq!(d.media, Some(vec![Media::Print]));
        assert_eq!(d.role, None);
    }

    #[test]
    fn breakpoint_media_list() {
        let d = Directives::parse(
            "/* MEDIA: only screen and (max-width: 42em) ENDMEDIA */",
        )
        .unwrap();
        assert_eq!(d.media, Some(vec![Media::Narrow]));
    }

    #[test]
    fn plain_css_has_no_directives() {
        assert_eq!(Directives::parse("body { margin: 0; }").unwrap(), Directives::default());
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(Directives::parse("/* ROLE: wrangler */").is_err());
    }

    #[test]
    fn versions_naturally_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for v in ["1.10", "1.2", "2.0"] {
            fs::create_dir_all(dir.path().join(v)).unwrap();
        }
        fs::write(dir.path().join("3.0"), "not a dir").unwrap();
        assert_eq!(site_versions(dir.path()).unwrap(), ["1.2", "1.10", "2.0"]);
    }

    #[test]
    fn scan_builds_components_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = "stylesheets/site/2.0";
        write(dir.path(), &format!("{root}/10-zone_footer.css"), "#footer{}");
        write(dir.path(), &format!("{root}/2-core.css"), "/* ROLE: override */\nbody{}");
        write(
            dir.path(),
            &format!("{root}/3-narrow.css"),
            "/* MEDIA: only screen and (max-width: 42em) ENDMEDIA */",
        );
        write(dir.path(), &format!("{root}/preview.png"), "png");
        write(dir.path(), &format!("{root}/notes.txt"), "x");

        let scanned = scan_version(&config_in(dir.path()), "2.0").unwrap();
        let titles: Vec<&str> = scanned.components.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Archive 2.0: (2) core",
                "Archive 2.0: (3) narrow",
                "Archive 2.0: (10) zone footer",
            ]
        );
        let core = &scanned.components[0];
        assert_eq!(core.role, Some(Role::Override));
        assert_eq!(core.media, vec![Media::Screen]);
        assert_eq!(core.filename.as_deref(), Some("/stylesheets/site/2.0/2-core.css"));
        assert!(core.unusable && core.official && core.public);
        assert_eq!(core.icon.as_deref(), Some("/stylesheets/site/2.0/preview.png"));
        assert_eq!(scanned.components[1].media, vec![Media::Narrow]);
        assert_eq!(scanned.components[2].role, Some(Role::Site));

        let umbrella = scanned.umbrella();
        assert_eq!(umbrella.title, "Archive 2.0");
        assert_eq!(umbrella.role, Some(Role::Site));
        assert!(umbrella.is_approved());
        assert!(!umbrella.unusable);
    }

    #[test]
    fn bad_directive_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "stylesheets/site/1.0/1-core.css", "/* MEDIA: hologram */");
        let err = scan_version(&config_in(dir.path()), "1.0").unwrap_err();
        assert!(err.to_string().contains("1.0/1-core.css"), "{err}");
    }

    #[test]
    fn missing_preview_means_no_icon() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "stylesheets/site/1.0/1-core.css", "");
        let scanned = scan_version(&config_in(dir.path()), "1.0").unwrap();
        assert!(scanned.icon.is_none());
        assert_eq!(scanned.components.len(), 1);
    }
}
