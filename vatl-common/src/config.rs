//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from, in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal; it is logged and the
//! remaining sources are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "VATL_ROOT_FOLDER";

/// Environment variable naming the project database
pub const DATABASE_ENV: &str = "VATL_DB";

/// Database file name used when only a root folder is known
pub const DEFAULT_DB_FILE: &str = "vatl.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the project database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database path (overrides `<root_folder>/vatl.db`)
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load the platform config file, falling back to defaults
    ///
    /// Errors are downgraded to warnings so a broken config file never
    /// prevents startup.
    pub fn load_or_default() -> Self {
        match config_file_path() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                debug!("No config file in use: {}", e);
                Self::default()
            }
        }
    }

    /// Load a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Resolve the root folder
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root) = &toml.root_folder {
        return root.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve the project database path
///
/// Same priority order as [`resolve_root_folder`]; when no explicit database
/// is configured the file lives inside the resolved root folder.
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml: &TomlConfig,
    root_folder: &Path,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(db) = &toml.database {
        return db.clone();
    }

    root_folder.join(DEFAULT_DB_FILE)
}

/// Get configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/vatl/config.toml first, then /etc/vatl/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("vatl").join("config.toml"));
        let system_config = PathBuf::from("/etc/vatl/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("vatl").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/vatl
        dirs::data_local_dir()
            .map(|d| d.join("vatl"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/vatl"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/vatl
        dirs::data_dir()
            .map(|d| d.join("vatl"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/vatl"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\vatl
        dirs::data_local_dir()
            .map(|d| d.join("vatl"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\vatl"))
    } else {
        PathBuf::from("./vatl_data")
    }
}
