//! Command-line parsing and command execution.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use drape_skin::SkinCatalog;
use drape_store::{MemoryStore, SkinStore};
use drape_types::{RoleSet, Skin, SkinId};

pub const USAGE: &str = "\
usage: drape [--config <path>] [--catalog <path>] <command>

commands:
  list                         list skins
  resolve <skin> [roles...]    print resolved markup
  cache <skin>                 build the file cache for a skin
  clear <skin>                 clear a skin's file cache
  segments <skin>              list cached segment files
  import                       import site-default skins";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Resolve { skin: String, roles: RoleSet },
    Cache { skin: String },
    Clear { skin: String },
    Segments { skin: String },
    Import,
}

impl Command {
    /// Whether the catalog must be written back afterwards.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Cache { .. } | Command::Clear { .. } | Command::Import
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub catalog: PathBuf,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config = None;
    let mut catalog = PathBuf::from("skins.toml");
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(iter.next().context("--config needs a path")?));
            },
            "--catalog" => {
                catalog = PathBuf::from(iter.next().context("--catalog needs a path")?);
            },
            _ => rest.push(arg.as_str()),
        }
    }

    let skin_arg = |name: &str| -> Result<String> {
        match rest.get(1) {
            Some(skin) => Ok((*skin).to_string()),
            None => bail!("`{name}` needs a skin id or title"),
        }
    };
    let command = match rest.first().copied() {
        Some("list") => Command::List,
        Some("resolve") => {
            let skin = skin_arg("resolve")?;
            let roles = if rest.len() > 2 {
                let mut roles = RoleSet::empty();
                for list in &rest[2..] {
                    for role in list.parse::<RoleSet>()?.iter() {
                        roles.insert(role);
                    }
                }
                roles
            } else {
                RoleSet::default_roles()
            };
            Command::Resolve { skin, roles }
        },
        Some("cache") => Command::Cache {
            skin: skin_arg("cache")?,
        },
        Some("clear") => Command::Clear {
            skin: skin_arg("clear")?,
        },
        Some("segments") => Command::Segments {
            skin: skin_arg("segments")?,
        },
        Some("import") => Command::Import,
        Some(other) => bail!("unknown command `{other}`\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    };
    Ok(Invocation {
        config,
        catalog,
        command,
    })
}

/// A skin named by id or exact title.
fn find_skin(catalog: &SkinCatalog<MemoryStore>, key: &str) -> Result<Skin> {
    if let Ok(id) = key.parse::<u64>()
        && let Ok(skin) = catalog.store().get(SkinId(id))
    {
        return Ok(skin);
    }
    catalog
        .store()
        .find_by_title(key)
        .with_context(|| format!("no skin with id or title `{key}`"))
}

/// Run one command and return what it prints.
pub fn run(catalog: &SkinCatalog<MemoryStore>, command: &Command) -> Result<String> {
    let out = match command {
        Command::List => {
            let mut out = String::new();
            for id in catalog.store().ids() {
                let skin = catalog.store().get(id)?;
                out.push_str(&format!(
                    "{:>4}  {:<8}  {}  {}\n",
                    skin.id,
                    skin.effective_role(),
                    if skin.cached { "cached" } else { "      " },
                    skin.title
                ));
            }
            out
        },
        Command::Resolve { skin, roles } => {
            let skin = find_skin(catalog, skin)?;
            catalog.resolve(skin.id, *roles)?
        },
        Command::Cache { skin } => {
            let skin = find_skin(catalog, skin)?;
            let written = catalog.build_cache(skin.id)?;
            format!("cached `{}` in {written} segment file(s)\n", skin.title)
        },
        Command::Clear { skin } => {
            let skin = find_skin(catalog, skin)?;
            catalog.clear_cache(skin.id)?;
            format!("cleared cache of `{}`\n", skin.title)
        },
        Command::Segments { skin } => {
            let skin = find_skin(catalog, skin)?;
            let mut out = String::new();
            for segment in catalog.cached_segments(skin.id)? {
                let sheet = &segment.sheet_role;
                out.push_str(&format!(
                    "{:>3}  {:<8}  {:<40}  {:<12}  {}\n",
                    segment.sequence,
                    sheet.role,
                    sheet.media_attr(),
                    sheet.ie_condition.map(|c| c.as_str()).unwrap_or("-"),
                    segment.file_name
                ));
            }
            out
        },
        Command::Import => {
            let report = catalog.import_site_skins()?;
            let mut out = String::new();
            for version in &report.versions {
                out.push_str(&format!(
                    "{}: umbrella {}, {} component(s){}\n",
                    version.version,
                    version.umbrella,
                    version.components.len(),
                    if version.cached { ", cached" } else { "" }
                ));
            }
            out
        },
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_types::{DrapeConfig, Role};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_flags_anywhere() {
        let inv = parse_args(&args(&["--catalog", "c.toml", "list", "--config", "d.toml"])).unwrap();
        assert_eq!(inv.catalog, PathBuf::from("c.toml"));
        assert_eq!(inv.config, Some(PathBuf::from("d.toml")));
        assert_eq!(inv.command, Command::List);
    }

    #[test]
    fn resolve_roles_default_and_explicit() {
        let inv = parse_args(&args(&["resolve", "Dark"])).unwrap();
        assert_eq!(
            inv.command,
            Command::Resolve {
                skin: "Dark".into(),
                roles: RoleSet::default_roles()
            }
        );
        let inv = parse_args(&args(&["resolve", "3", "override", "user,site"])).unwrap();
        let Command::Resolve { roles, .. } = inv.command else {
            panic!("expected resolve");
        };
        assert!(roles.contains(Role::Override));
        assert!(roles.contains(Role::User));
        assert!(roles.contains(Role::Site));
        assert!(!roles.contains(Role::Admin));
    }

    #[test]
    fn parse_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["cache"])).is_err());
        assert!(parse_args(&args(&["list", "--catalog"])).is_err());
        assert!(parse_args(&args(&["resolve", "1", "wrangler"])).is_err());
    }

    #[test]
    fn only_writes_mutate() {
        assert!(Command::Import.mutates());
        assert!(Command::Cache { skin: "1".into() }.mutates());
        assert!(!Command::List.mutates());
    }

    #[test]
    fn run_against_a_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = DrapeConfig {
            public_root: dir.path().to_path_buf(),
            ..DrapeConfig::default()
        };
        let catalog = SkinCatalog::new(MemoryStore::new(), config).unwrap();
        let id = catalog
            .create_skin(Skin::new("Dark Mode").with_css("body{}"))
            .unwrap();

        let listing = run(&catalog, &Command::List).unwrap();
        assert!(listing.contains("Dark Mode"));
        let by_title = Command::Resolve {
            skin: "Dark Mode".into(),
            roles: RoleSet::all(),
        };
        assert!(run(&catalog, &by_title).unwrap().contains("body{}"));

        run(&catalog, &Command::Cache { skin: id.to_string() }).unwrap();
        let segments = run(&catalog, &Command::Segments { skin: id.to_string() }).unwrap();
        assert!(segments.contains("1_user_all_.css"));
        run(&catalog, &Command::Clear { skin: id.to_string() }).unwrap();
        assert!(run(&catalog, &Command::Segments { skin: id.to_string() }).unwrap().is_empty());

        assert!(run(&catalog, &Command::Cache { skin: "Nope".into() }).is_err());
    }
}
