//! Configuration loaded from `drape.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DrapeError, Result};

/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl RunEnvironment {
    /// Staging and production build caches eagerly.
    pub fn is_production_like(self) -> bool {
        matches!(self, RunEnvironment::Staging | RunEnvironment::Production)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrapeConfig {
    /// Web root. Stylesheet file references resolve under it.
    pub public_root: PathBuf,
    /// URL prefix of per-skin cache directories.
    pub skins_url: String,
    /// URL prefix of imported site stylesheets.
    pub site_skins_url: String,
    /// Cap on ancestor-chain depth during traversal.
    pub max_ancestor_depth: usize,
    pub environment: RunEnvironment,
}

impl Default for DrapeConfig {
    fn default() -> Self {
        Self {
            public_root: PathBuf::from("public"),
            skins_url: "/stylesheets/skins/".to_string(),
            site_skins_url: "/stylesheets/site/".to_string(),
            max_ancestor_depth: 64,
            environment: RunEnvironment::Development,
        }
    }
}

impl DrapeConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| DrapeError::Config(format!("drape.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DrapeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.max_ancestor_depth == 0 {
            return Err(DrapeError::Config(
                "max_ancestor_depth must be at least 1".to_string(),
            ));
        }
        for (key, url) in [
            ("skins_url", &self.skins_url),
            ("site_skins_url", &self.site_skins_url),
        ] {
            if !url.starts_with('/') || !url.ends_with('/') {
                return Err(DrapeError::Config(format!(
                    "{key} must start and end with `/`: {url}"
                )));
            }
        }
        Ok(())
    }

    /// Directory holding one cache directory per skin.
    pub fn skins_dir(&self) -> PathBuf {
        self.public_path(&self.skins_url)
    }

    /// Root of the site-default import tree.
    pub fn site_skins_dir(&self) -> PathBuf {
        self.public_path(&self.site_skins_url)
    }

    /// Map a public URL path (`/stylesheets/...`) onto the filesystem.
    pub fn public_path(&self, url: &str) -> PathBuf {
        self.public_root.join(url.trim_start_matches('/'))
    }
}
