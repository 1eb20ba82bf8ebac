use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Reading config file {} failed: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Config file {} is not valid: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("No downloads directory given and no home directory found")]
    NoDownloadsDir,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Storage engine connection string, e.g. `rocksdb:///var/lib/images`
    pub conn_str: String,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// An explicit connection string wins over the config file, which is then
    /// not read at all.
    pub fn resolve(path: &Path, conn_str: Option<String>) -> Result<Self, ConfigError> {
        match conn_str {
            Some(conn_str) => Ok(Self { conn_str }),
            None => Self::load(path),
        }
    }
}

pub fn downloads_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    explicit
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .ok_or(ConfigError::NoDownloadsDir)
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, r#"{"conn_str": "rocksdb:///tmp/images"}"#).unwrap();

        let conf = AppConfig::load(&path).unwrap();
        assert_eq!(conf.conn_str, "rocksdb:///tmp/images");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("config")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_config_without_conn_str() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, r#"{"connection": "x"}"#).unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_explicit_conn_str_skips_file() {
        let dir = tempdir().unwrap();
        let conf = AppConfig::resolve(&dir.path().join("absent"), Some("/tmp/db".to_string())).unwrap();
        assert_eq!(conf.conn_str, "/tmp/db");
    }

    #[test]
    fn test_explicit_downloads_dir() {
        assert_eq!(downloads_dir(Some(PathBuf::from("/srv/out"))).unwrap(), PathBuf::from("/srv/out"));
    }
}
