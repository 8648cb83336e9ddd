//! Config file locations, discovery and parsing.
//!
//! The home directory holds the hidden `.cslrun.yaml`. Project directories hold
//! an undotted `cslrun.yaml`, found by walking up from the working directory.

use super::types::Configuration;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Base name shared by both config files.
pub const CONFIG_FILE_NAME: &str = "cslrun.yaml";

/// Name of the user-level file in the home directory.
pub const USER_CONFIG_FILE_NAME: &str = ".cslrun.yaml";

/// Body written to the home directory when no user-level file exists yet.
pub const DEFAULT_USER_CONFIG: &str = "\
groupID: 2319948
path:
    styletests: false
    local: false
    std: false
    src: false
    locale: false
    modules: false
    cslschema: false
    cslmschema: false
";

/// Path of the user-level config file under `home`.
pub fn user_config_file(home: &Path) -> PathBuf {
    home.join(USER_CONFIG_FILE_NAME)
}

/// Path of the project-level config file in `dir`.
pub fn project_config_file(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// `start` followed by each of its ancestors, ending at the filesystem root.
///
/// Lazy; callers stop pulling as soon as they find what they need.
pub fn search_dirs(start: &Path) -> impl Iterator<Item = &Path> {
    start.ancestors().filter(|dir| !dir.as_os_str().is_empty())
}

/// Write [`DEFAULT_USER_CONFIG`] to `file` unless it already exists.
///
/// Returns `true` when a file was written.
pub fn ensure_user_config(file: &Path) -> ConfigResult<bool> {
    if file.exists() {
        return Ok(false);
    }
    write_default_config(file)?;
    Ok(true)
}

/// Write [`DEFAULT_USER_CONFIG`] to `file`, replacing anything already there.
pub fn write_default_config(file: &Path) -> ConfigResult<()> {
    std::fs::write(file, DEFAULT_USER_CONFIG).map_err(|e| ConfigError::io(file, e))?;
    info!(path = %file.display(), "Wrote default configuration");
    Ok(())
}

/// Read and parse a config file, then absolutize its paths against `base`.
///
/// Any read or parse failure, including a `path:` that is not a mapping,
/// becomes a [`ConfigError::Parse`] naming `file`.
pub fn read_config_file(file: &Path, base: &Path) -> ConfigResult<Configuration> {
    let content = std::fs::read_to_string(file).map_err(|e| ConfigError::parse(file, e))?;
    let mut config: Configuration =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::parse(file, e))?;
    config.path.absolutize(base);
    debug!(
        path = %file.display(),
        entries = config.path.len(),
        "Loaded config file"
    );
    Ok(config)
}
