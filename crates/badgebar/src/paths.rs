use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub const CONFIG_FILE_NAME: &str = "badgebar.json";

/// Stores references to the paths relevant to badgebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarPaths {
    pub config_dir: PathBuf,
}

impl BarPaths {
    /// Use an explicitly given configuration directory, which has to exist.
    pub fn from_config_dir<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        if config_dir.is_file() {
            bail!("Please provide the path to the config directory, not a file within it")
        }
        if !config_dir.exists() {
            bail!("Configuration directory {} does not exist", config_dir.display());
        }
        Ok(BarPaths { config_dir: config_dir.canonicalize()? })
    }

    /// `$XDG_CONFIG_HOME/badgebar`, which doesn't have to exist.
    pub fn default() -> Result<Self> {
        let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(std::env::var_os("HOME").context("Neither XDG_CONFIG_HOME nor HOME is set")?).join(".config"),
        };
        Ok(BarPaths { config_dir: config_home.join("badgebar") })
    }

    pub fn get_config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

impl std::fmt::Display for BarPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config-dir: {}", self.config_dir.display())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_config_dir() {
        let dir = std::env::temp_dir().join(format!("badgebar-test-{}-paths", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let paths = BarPaths::from_config_dir(&dir).unwrap();
        assert_eq!(dir.canonicalize().unwrap().join("badgebar.json"), paths.get_config_file());

        assert!(BarPaths::from_config_dir(dir.join("missing")).is_err());
        std::fs::write(dir.join("file"), "").unwrap();
        assert!(BarPaths::from_config_dir(dir.join("file")).is_err());
    }
}
