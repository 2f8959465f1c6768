//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/funk-deploy/`
//! - macOS: `~/Library/Application Support/funk-deploy/`
//! - Windows: `%APPDATA%\funk-deploy\`

use std::path::{Path, PathBuf};

/// Application name used for directory lookups
const APP_NAME: &str = "funk-deploy";

/// File name of the deploy plan inside an SDK directory
pub const DEPLOY_PLAN_FILE: &str = "deploy.yaml";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Path of the deploy plan for an SDK directory
pub fn deploy_plan_path(sdk_dir: &Path) -> PathBuf {
    sdk_dir.join(DEPLOY_PLAN_FILE)
}
