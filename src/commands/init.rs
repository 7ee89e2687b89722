use crate::config::{TestVerdictConfig, CONFIG_FILE_NAME};
use anyhow::{Context, Result};
use std::path::Path;

/// Write the default configuration into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let body = toml::to_string_pretty(&TestVerdictConfig::default())
        .context("serializing default configuration")?;
    let contents = format!("# testverdict configuration\n\n{body}");
    std::fs::write(&config_path, contents)
        .with_context(|| format!("writing {}", config_path.display()))?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(())
}
