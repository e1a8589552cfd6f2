//! File persistence helpers.
//!
//! JSON files (settings, markup rules) are written atomically with
//! owner-only permissions.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/pricewise`
/// - Linux: `~/.config/pricewise`
/// - Windows: `%APPDATA%\pricewise`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support").join("pricewise"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .map(|c| c.join("pricewise"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the default data directory, where the catalog database lives.
///
/// - macOS: `~/Library/Application Support/pricewise`
/// - Linux: `~/.local/share/pricewise`
/// - Windows: `%APPDATA%\pricewise`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("pricewise"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the default markup rules file path.
pub fn default_markup_rules_path() -> PathBuf {
    default_config_dir().join("markup_rules.json")
}

/// Returns the default catalog database path.
pub fn default_catalog_path() -> PathBuf {
    default_data_dir().join("catalog.db")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
pub(crate) async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0600", "Set restrictive permissions");
    Ok(())
}

/// Sets restrictive directory permissions (0o700) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o700);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0700", "Set restrictive directory permissions");
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
pub(crate) async fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Creates the parent directory of `path` if missing.
///
/// Only the leaf directory is tightened to 0o700; pre-existing ancestors
/// keep their permissions.
pub(crate) async fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent).await,
        _ => Ok(()),
    }
}

/// Saves data to a JSON file with secure permissions.
///
/// Creates parent directories if they don't exist, writes atomically
/// (via temp file + rename), and sets restrictive permissions on Unix.
///
/// # Errors
///
/// Returns [`StoreError::Io`] or [`StoreError::Serialization`].
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    ensure_parent_dir(path).await?;

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    set_restrictive_permissions(&temp_path).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), "JSON file saved securely");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read, or
/// [`StoreError::Serialization`] if it is not valid JSON for `T`.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    debug!(path = %path.display(), "JSON file loaded");
    Ok(data)
}

/// Loads data from a JSON file, returning default if missing or invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "File not found, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            T::default()
        }
    }
}

/// Ensures a directory exists with secure permissions.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !tokio::fs::try_exists(path).await? {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_restrictive_dir_permissions(path).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
