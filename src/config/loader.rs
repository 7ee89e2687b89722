use std::fs;
use std::path::{Path, PathBuf};

use super::TestVerdictConfig;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = ".testverdict.toml";

/// Per-user fallback, relative to the platform config directory.
pub const USER_CONFIG_PATH: &str = "testverdict/config.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse config text. Errors carry a human-readable reason.
pub fn parse_config(contents: &str) -> Result<TestVerdictConfig, String> {
    let config = toml::from_str::<TestVerdictConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;
    config.validate()?;
    Ok(config)
}

/// `None` when the file is missing or invalid; invalid files are logged.
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<TestVerdictConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read config file {}: {}", config_path.display(), e);
            }
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// `start` and its parents, nearest first, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        parent.pop().then_some(parent)
    })
    .take(max_depth)
}

/// `~/.config/testverdict/config.toml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_PATH))
}

/// Search upward from `start` for the nearest config file, then fall back to
/// the per-user file. The nearest file found is the only one read: if it is
/// invalid the defaults apply.
pub fn load_config_from(start: &Path) -> TestVerdictConfig {
    let nearest = directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file());

    let loaded = match nearest {
        Some(path) => try_load_config_from_path(&path),
        None => {
            debug!(
                "No {} found within {} directories",
                CONFIG_FILE_NAME, MAX_TRAVERSAL_DEPTH
            );
            user_config_path().and_then(|path| try_load_config_from_path(&path))
        }
    };
    loaded.unwrap_or_default()
}

pub fn load_config() -> TestVerdictConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(&dir),
        Err(e) => {
            warn!("Failed to get current directory: {}. Using default config.", e);
            TestVerdictConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_ancestors_is_bounded() {
        let dirs: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b"),
            ]
        );
    }

    #[test]
    fn test_config_found_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[ai]\nenabled = false\n\n[git]\nhistory_limit = 4\n",
        )
        .unwrap();
        let nested = temp.path().join("src").join("main");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config_from(&nested);
        assert!(!config.ai.enabled);
        assert_eq!(config.git.history_limit, 4);
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "[ai\nenabled = ").unwrap();
        let config = load_config_from(temp.path());
        assert_eq!(config, TestVerdictConfig::default());
    }

    #[test]
    fn test_malformed_nearest_config_does_not_defer_to_parent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "[git]\nhistory_limit = 4\n").unwrap();
        let nested = temp.path().join("service");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(CONFIG_FILE_NAME), "[git\nhistory_limit = ").unwrap();

        let config = load_config_from(&nested);
        assert_eq!(config, TestVerdictConfig::default());
    }

    #[test]
    fn test_user_config_path_is_namespaced() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with(USER_CONFIG_PATH));
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(parse_config("[correlation]\nmin_confidence = 1.5\n").is_err());
        assert!(parse_config("[ai]\nmax_concurrent = 0\n").is_err());
    }
}
