//! Vault location configuration

use crate::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "QRVAULT_DATA_DIR";

const DATABASE_FILE: &str = "vault.db";
const KEYSTORE_DIR: &str = "keystore";

/// Filesystem layout of a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Root data directory
    pub data_dir: PathBuf,
    /// SQLite record database
    pub database_path: PathBuf,
    /// File keystore directory
    pub keystore_dir: PathBuf,
}

impl VaultConfig {
    /// Layout rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database_path: data_dir.join(DATABASE_FILE),
            keystore_dir: data_dir.join(KEYSTORE_DIR),
            data_dir,
        }
    }

    /// Resolve the data directory: explicit override, then
    /// `QRVAULT_DATA_DIR`, then the platform data directory
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(dir) = explicit {
            return Self::with_data_dir(dir);
        }
        Self::resolve_with_env(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
    }

    fn resolve_with_env(env_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = env_dir.filter(|d| !d.as_os_str().is_empty()) {
            return Self::with_data_dir(dir);
        }
        let base = ProjectDirs::from("com", "Blockchain Commons", "QR Vault")
            .map(|dirs| dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".qrvault"));
        Self::with_data_dir(base)
    }

    /// Create the data and keystore directories
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.keystore_dir)?;
        tracing::debug!("Vault data directory: {}", self.data_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let config = VaultConfig::with_data_dir("/tmp/qrvault");
        assert_eq!(config.database_path, PathBuf::from("/tmp/qrvault/vault.db"));
        assert_eq!(config.keystore_dir, PathBuf::from("/tmp/qrvault/keystore"));
    }

    #[test]
    fn test_resolution_order() {
        let explicit = VaultConfig::resolve(Some(Path::new("/explicit")));
        assert_eq!(explicit.data_dir, PathBuf::from("/explicit"));

        let from_env = VaultConfig::resolve_with_env(Some(PathBuf::from("/from-env")));
        assert_eq!(from_env.data_dir, PathBuf::from("/from-env"));

        let fallback = VaultConfig::resolve_with_env(Some(PathBuf::new()));
        assert_ne!(fallback.data_dir, PathBuf::new());
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = VaultConfig::with_data_dir(dir.path().join("nested"));
        config.ensure_dirs().unwrap();
        assert!(config.keystore_dir.is_dir());
    }
}
