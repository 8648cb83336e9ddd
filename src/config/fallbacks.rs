//! Bundled fallback locations for schemata, locales and jurisdiction modules.
//!
//! ## Environment Variables
//! - `CSLRUN_SCHEMATA_DIR` - Directory holding `csl.rnc` and `csl-m.rnc`
//! - `CSLRUN_LOCALES_DIR` - Locale files directory
//! - `CSLRUN_MODULES_DIR` - Jurisdiction modules directory
//!
//! Without overrides each one points into `node_modules/` next to the runner.

use super::types::{PathKey, PathTable};
use crate::paths::{absolutize, is_empty_dir};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Schema file names inside the schemata package.
pub const CSL_SCHEMA_FILE: &str = "csl.rnc";
pub const CSLM_SCHEMA_FILE: &str = "csl-m.rnc";

/// Default locations supplied by the bundled data packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResources {
    pub csl_schema: PathBuf,
    pub cslm_schema: PathBuf,
    pub locales: PathBuf,
    pub modules: PathBuf,
}

impl FallbackResources {
    /// Locate the bundled packages, honoring environment overrides.
    pub fn discover(script_dir: &Path) -> Self {
        Self::discover_with(script_dir, |key| std::env::var_os(key))
    }

    /// Same as [`discover`](Self::discover), reading variables through `var`.
    ///
    /// Empty values count as unset. Relative overrides are joined onto `script_dir`.
    pub fn discover_with<F>(script_dir: &Path, var: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let packages = script_dir.join("node_modules");
        let dir = |key: &str, package: &str| {
            var(key)
                .filter(|v| !v.is_empty())
                .map(|v| absolutize(script_dir, Path::new(&v)))
                .unwrap_or_else(|| packages.join(package))
        };

        let schemata = dir("CSLRUN_SCHEMATA_DIR", "citeproc-csl-schemata");
        let locales = dir("CSLRUN_LOCALES_DIR", "citeproc-locales");
        let modules = dir("CSLRUN_MODULES_DIR", "citeproc-juris-modules");

        Self::with_schemata_dir(&schemata, locales, modules)
    }

    /// Build from a schemata directory plus locale and module directories.
    pub fn with_schemata_dir(schemata: &Path, locales: PathBuf, modules: PathBuf) -> Self {
        Self {
            csl_schema: schemata.join(CSL_SCHEMA_FILE),
            cslm_schema: schemata.join(CSLM_SCHEMA_FILE),
            locales,
            modules,
        }
    }
}

fn usable_file(paths: &PathTable, key: PathKey) -> bool {
    paths.get(key).is_some_and(Path::exists)
}

fn usable_dir(paths: &PathTable, key: PathKey) -> bool {
    paths
        .get(key)
        .is_some_and(|dir| dir.exists() && !is_empty_dir(dir))
}

/// Replace unset or unusable schema, locale and module paths with the fallbacks.
///
/// The two schema keys are swapped together: if either one is unusable, both
/// take the bundled values.
pub fn apply_fallbacks(paths: &mut PathTable, fallbacks: &FallbackResources) {
    if !usable_file(paths, PathKey::CslSchema) || !usable_file(paths, PathKey::CslmSchema) {
        debug!(
            csl = %fallbacks.csl_schema.display(),
            cslm = %fallbacks.cslm_schema.display(),
            "Using bundled CSL schemata"
        );
        paths.set(PathKey::CslSchema, &fallbacks.csl_schema);
        paths.set(PathKey::CslmSchema, &fallbacks.cslm_schema);
    }

    if !usable_dir(paths, PathKey::Locale) {
        debug!(path = %fallbacks.locales.display(), "Using bundled locales");
        paths.set(PathKey::Locale, &fallbacks.locales);
    }

    if !usable_dir(paths, PathKey::Modules) {
        debug!(path = %fallbacks.modules.display(), "Using bundled juris modules");
        paths.set(PathKey::Modules, &fallbacks.modules);
    }
}
