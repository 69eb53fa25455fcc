use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
const LOG_FILE_NAME: &str = "library-manager.log";
const EXPORT_DIR_NAME: &str = "exports";

/// Overrides the database location, e.g. to keep a separate test library.
pub const DB_PATH_ENV: &str = "LIBRARY_DB_PATH";
/// Overrides where "Save As" writes its files.
pub const EXPORT_DIR_ENV: &str = "LIBRARY_EXPORT_DIR";

/// Where the application keeps its files. Presentation preferences are not
/// part of this: they always start from their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    pub log_path: PathBuf,
}

impl AppConfig {
    /// Resolve paths from the environment, falling back to the home directory.
    pub fn from_env() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        let data_dir = base_dirs.home_dir().join(DATA_DIR_NAME);
        Ok(Self::resolve(
            &data_dir,
            env::var_os(DB_PATH_ENV).map(PathBuf::from),
            env::var_os(EXPORT_DIR_ENV).map(PathBuf::from),
        ))
    }

    /// Defaults rooted at `data_dir`, with optional overrides. The log file
    /// always sits next to the database.
    pub fn resolve(
        data_dir: &Path,
        db_override: Option<PathBuf>,
        export_override: Option<PathBuf>,
    ) -> Self {
        let db_path = db_override.unwrap_or_else(|| data_dir.join(DB_FILE_NAME));
        let export_dir = export_override.unwrap_or_else(|| data_dir.join(EXPORT_DIR_NAME));
        let log_path = db_path
            .parent()
            .map(|parent| parent.join(LOG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME));
        Self {
            db_path,
            export_dir,
            log_path,
        }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::resolve(data_dir, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_live_in_data_dir() {
        let config = AppConfig::in_dir(Path::new("/home/ann/.library-manager"));
        assert_eq!(
            config.db_path,
            PathBuf::from("/home/ann/.library-manager/library.sqlite")
        );
        assert_eq!(
            config.export_dir,
            PathBuf::from("/home/ann/.library-manager/exports")
        );
        assert_eq!(
            config.log_path,
            PathBuf::from("/home/ann/.library-manager/library-manager.log")
        );
    }

    #[test]
    fn test_overrides_win() {
        let config = AppConfig::resolve(
            Path::new("/data"),
            Some(PathBuf::from("/tmp/other/test.sqlite")),
            Some(PathBuf::from("/tmp/out")),
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/other/test.sqlite"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/other/library-manager.log"));
    }
}
