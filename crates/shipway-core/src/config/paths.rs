//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "shipway.toml";

/// Where `shipway.toml` lives when no path is given.
///
/// A file in `project_root` wins over the one in the user config directory.
pub fn default_config_path(project_root: &Path, global_dir: &Path) -> PathBuf {
    let local = project_root.join(CONFIG_FILE_NAME);
    if local.exists() {
        local
    } else {
        global_dir.join(CONFIG_FILE_NAME)
    }
}

/// `<config_dir>/shipway`, falling back to `~/.config/shipway`.
pub fn global_config_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Ok(dir.join("shipway"));
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(home.join(".config").join("shipway"))
}
