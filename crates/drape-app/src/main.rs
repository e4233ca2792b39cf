//! drape -- command-line front end for the skin cascade engine.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use drape_skin::SkinCatalog;
use drape_store::MemoryStore;
use drape_types::DrapeConfig;

/// `--config`, then `DRAPE_CONFIG`, then `drape.toml` if it exists.
fn load_config(flag: Option<PathBuf>) -> Result<DrapeConfig> {
    let explicit = flag.or_else(|| std::env::var_os("DRAPE_CONFIG").map(PathBuf::from));
    let path = match explicit {
        Some(path) => path,
        None if Path::new("drape.toml").is_file() => PathBuf::from("drape.toml"),
        None => {
            log::debug!("no drape.toml, using defaults");
            return Ok(DrapeConfig::default());
        },
    };
    DrapeConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = commands::parse_args(&args)?;
    let config = load_config(invocation.config.clone())?;
    log::info!(
        "public root {}, environment {:?}",
        config.public_root.display(),
        config.environment
    );

    let store = MemoryStore::load(&invocation.catalog)
        .with_context(|| format!("loading {}", invocation.catalog.display()))?;
    let catalog = SkinCatalog::new(store, config)?;

    let output = commands::run(&catalog, &invocation.command)?;
    print!("{output}");

    if invocation.command.mutates() {
        catalog
            .store()
            .save_to(&invocation.catalog)
            .with_context(|| format!("saving {}", invocation.catalog.display()))?;
        log::info!("saved {}", invocation.catalog.display());
    }
    Ok(())
}
