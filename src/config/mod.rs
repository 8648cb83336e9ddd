//! Layered configuration for the cslrun style-test runner.
//!
//! Two file tiers are merged per key under `path:`:
//! 1. **User** - `~/.cslrun.yaml`, created with defaults on first run
//! 2. **Project** - the nearest `cslrun.yaml` in the working directory or an ancestor
//!
//! Relative paths in either file are resolved against the directory holding that
//! file. Unset schema, locale and module paths fall back to the bundled packages.
//!
//! ## Environment Variables
//! - `TRAVIS` - CI mode: skip `~/.cslrun.yaml`, keep fixtures under home
//! - `CSLRUN_HOME` - Home directory override
//! - `CSLRUN_SCRIPT_DIR` - Runner directory override
//! - `CSLRUN_SCHEMATA_DIR`, `CSLRUN_LOCALES_DIR`, `CSLRUN_MODULES_DIR` - Fallback overrides

mod fallbacks;
mod files;
mod loader;
mod merge;
mod types;

pub use fallbacks::{CSL_SCHEMA_FILE, CSLM_SCHEMA_FILE, FallbackResources, apply_fallbacks};
pub use files::{
    CONFIG_FILE_NAME, DEFAULT_USER_CONFIG, USER_CONFIG_FILE_NAME, ensure_user_config,
    project_config_file, read_config_file, search_dirs, user_config_file, write_default_config,
};
pub use loader::{
    CHAI_ENTRY, CI_ENV_VAR, ConfigResolver, FIXTURE_DIR_NAME, JING_JAR, ProjectOverride,
    ResolverEnv, derive_mode, finalize, find_project_override, load_user_config, resolve_config,
};
pub use merge::{merge_override, merge_paths};
pub use types::*;
