//! Configuration resolver.
//!
//! Runs the pipeline Load -> Find-override -> Merge -> Fallbacks -> Mode -> Finalize.
//! Every stage returns a `Result`; the first failure ends the run and is handed
//! back to the caller.

use super::fallbacks::{FallbackResources, apply_fallbacks};
use super::files::{
    ensure_user_config, project_config_file, read_config_file, search_dirs, user_config_file,
};
use super::merge::merge_override;
use super::types::{
    ConfigSources, Configuration, Mode, PathKey, PathTable, ResolvedConfig, SetupNotice,
};
use crate::error::{ConfigError, ConfigResult};
use crate::paths::absolutize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CI indicator variable. When set, the home config is bypassed.
pub const CI_ENV_VAR: &str = "TRAVIS";

/// Fixture cache directory name, created under the config directory.
pub const FIXTURE_DIR_NAME: &str = ".cslTestFixtures";

/// Bundled RELAX NG validator, relative to the script directory.
pub const JING_JAR: &str = "jing/jing-20131210.jar";

/// Assertion library entry point, relative to the script directory.
pub const CHAI_ENTRY: &str = "node_modules/chai/index.js";

/// Process inputs consumed by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverEnv {
    /// User home directory; holds `.cslrun.yaml`.
    pub home_dir: PathBuf,
    /// Working directory the project search starts from.
    pub cwd: PathBuf,
    /// Directory containing the runner executable.
    pub script_dir: PathBuf,
    /// Running under CI.
    pub ci: bool,
}

impl ResolverEnv {
    /// Discover inputs from the process environment.
    pub fn discover() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        Self::discover_with(
            |key| std::env::var_os(key),
            cwd,
            dirs::home_dir(),
            std::env::current_exe().ok(),
        )
    }

    /// Build from an explicit variable lookup and process facts.
    ///
    /// - `CSLRUN_HOME` overrides `default_home`
    /// - `CSLRUN_SCRIPT_DIR` overrides the directory of `exe`
    /// - a non-empty `TRAVIS` turns on CI mode
    ///
    /// Empty values count as unset. Relative overrides are joined onto `cwd`.
    pub fn discover_with<F>(
        var: F,
        cwd: PathBuf,
        default_home: Option<PathBuf>,
        exe: Option<PathBuf>,
    ) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let lookup = |key: &str| {
            var(key)
                .filter(|v| !v.is_empty())
                .map(|v| absolutize(&cwd, Path::new(&v)))
        };

        let home_dir = lookup("CSLRUN_HOME")
            .or(default_home)
            .ok_or(ConfigError::HomeDirUnavailable)?;

        let script_dir = lookup("CSLRUN_SCRIPT_DIR")
            .or_else(|| exe.and_then(|exe| exe.parent().map(Path::to_path_buf)))
            .unwrap_or_else(|| cwd.clone());

        let ci = var(CI_ENV_VAR).is_some_and(|v| !v.is_empty());

        Ok(Self {
            home_dir,
            cwd,
            script_dir,
            ci,
        })
    }

    /// Path of the user-level config file.
    pub fn user_config_file(&self) -> PathBuf {
        user_config_file(&self.home_dir)
    }
}

/// A project-level `cslrun.yaml` found above the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOverride {
    /// Directory holding the file.
    pub dir: PathBuf,
    /// The file itself.
    pub file: PathBuf,
    /// Parsed contents, already absolutized against `dir`.
    pub config: Configuration,
}

/// Load the user-level configuration, creating the default file when absent.
///
/// In CI the file is skipped and an empty `path:` table is returned without
/// `configdir`.
pub fn load_user_config(env: &ResolverEnv) -> ConfigResult<Configuration> {
    if env.ci {
        debug!("CI environment detected, skipping user config");
        return Ok(Configuration::empty());
    }

    let file = env.user_config_file();
    ensure_user_config(&file)?;

    let mut config = read_config_file(&file, &env.home_dir)?;
    config.path.set(PathKey::ConfigDir, &env.home_dir);
    Ok(config)
}

/// Search `start_dir` and its ancestors for a project `cslrun.yaml`.
///
/// The nearest file wins. A hit in `home_dir` is a [`ConfigError::Placement`].
pub fn find_project_override(
    start_dir: &Path,
    home_dir: &Path,
) -> ConfigResult<Option<ProjectOverride>> {
    for dir in search_dirs(start_dir) {
        let file = project_config_file(dir);
        if !file.exists() {
            continue;
        }
        if dir == home_dir {
            return Err(ConfigError::Placement {
                home: home_dir.to_path_buf(),
            });
        }

        let config = read_config_file(&file, dir)?;
        debug!(path = %file.display(), "Found project override");
        return Ok(Some(ProjectOverride {
            dir: dir.to_path_buf(),
            file,
            config,
        }));
    }
    Ok(None)
}

/// `FullMode` when every source-repository key is set, `StyleMode` otherwise.
pub fn derive_mode(paths: &PathTable) -> Mode {
    let set = PathKey::SOURCE_REPO
        .iter()
        .filter(|key| paths.is_set(key))
        .count();
    if set < PathKey::SOURCE_REPO.len() {
        Mode::StyleMode
    } else {
        Mode::FullMode
    }
}

/// Attach the derived paths.
///
/// Returns a setup notice when `styletests` is still unset.
pub fn finalize(paths: &mut PathTable, env: &ResolverEnv) -> Option<SetupNotice> {
    paths.set(PathKey::Cwd, &env.cwd);
    paths.set(PathKey::ScriptDir, &env.script_dir);
    paths.set(PathKey::Jing, env.script_dir.join(JING_JAR));
    paths.set(PathKey::Chai, env.script_dir.join(CHAI_ENTRY));

    let fixture_base = if env.ci {
        env.home_dir.clone()
    } else {
        paths
            .get(PathKey::ConfigDir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| env.home_dir.clone())
    };
    paths.set(PathKey::FixtureDir, fixture_base.join(FIXTURE_DIR_NAME));

    if paths.is_set(PathKey::StyleTests) {
        None
    } else {
        Some(SetupNotice::styletests_missing(&env.user_config_file()))
    }
}

/// Resolve the full configuration for one run.
pub fn resolve_config(
    env: &ResolverEnv,
    fallbacks: &FallbackResources,
) -> ConfigResult<ResolvedConfig> {
    let user = load_user_config(env)?;
    let mut sources = ConfigSources {
        user_file: (!env.ci).then(|| env.user_config_file()),
        project_file: None,
    };

    let group_id = user.group_id;
    let mut paths = user.path;

    if let Some(project) = find_project_override(&env.cwd, &env.home_dir)? {
        paths = merge_override(paths, project.config.path, &project.dir);
        sources.project_file = Some(project.file);
    }

    apply_fallbacks(&mut paths, fallbacks);
    let mode = derive_mode(&paths);
    let notice = finalize(&mut paths, env);

    if let Some(ref notice) = notice {
        debug!("{}", notice.summary);
    }
    info!(mode = %mode, configdir = ?paths.get(PathKey::ConfigDir), "Configuration resolved");

    Ok(ResolvedConfig {
        group_id,
        mode,
        path: paths,
        sources,
        notice,
    })
}

/// Resolver bound to an environment and a set of fallbacks.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    pub env: ResolverEnv,
    pub fallbacks: FallbackResources,
}

impl ConfigResolver {
    /// Discover the environment and bundled fallbacks from the process.
    pub fn discover() -> ConfigResult<Self> {
        let env = ResolverEnv::discover()?;
        let fallbacks = FallbackResources::discover(&env.script_dir);
        Ok(Self { env, fallbacks })
    }

    pub fn new(env: ResolverEnv, fallbacks: FallbackResources) -> Self {
        Self { env, fallbacks }
    }

    pub fn resolve(&self) -> ConfigResult<ResolvedConfig> {
        resolve_config(&self.env, &self.fallbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathValue;
    use tempfile::TempDir;

    fn env_in(temp: &TempDir) -> ResolverEnv {
        let home = temp.path().join("home");
        let cwd = home.join("work");
        std::fs::create_dir_all(&cwd).unwrap();
        ResolverEnv {
            home_dir: home,
            cwd,
            script_dir: temp.path().join("bin"),
            ci: false,
        }
    }

    #[test]
    fn test_load_user_config_creates_default() {
        let temp = TempDir::new().unwrap();
        let env = env_in(&temp);

        let config = load_user_config(&env).unwrap();

        assert!(env.user_config_file().exists());
        assert_eq!(config.group_id, Some(2319948));
        assert_eq!(config.path.get(PathKey::ConfigDir), Some(env.home_dir.as_path()));
        assert!(!config.path.is_set(PathKey::StyleTests));
    }

    #[test]
    fn test_load_user_config_ci_skips_file() {
        let temp = TempDir::new().unwrap();
        let env = ResolverEnv {
            ci: true,
            ..env_in(&temp)
        };

        let config = load_user_config(&env).unwrap();

        assert!(config.path.is_empty());
        assert!(!env.user_config_file().exists());
    }

    #[test]
    fn test_load_user_config_rejects_sequence_path() {
        let temp = TempDir::new().unwrap();
        let env = env_in(&temp);
        std::fs::write(env.user_config_file(), "groupID: 1\npath:\n  - std\n").unwrap();

        let err = load_user_config(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(
            err.to_string()
                .contains(&env.user_config_file().display().to_string())
        );
    }

    #[test]
    fn test_find_project_override_nearest_wins() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("repo");
        let nested = root.join("styles/apa");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(project_config_file(&root), "path:\n  std: ../std\n").unwrap();
        std::fs::write(
            project_config_file(&root.join("styles")),
            "path:\n  std: here\n",
        )
        .unwrap();

        let found = find_project_override(&nested, &temp.path().join("home"))
            .unwrap()
            .unwrap();

        assert_eq!(found.dir, root.join("styles"));
        assert_eq!(
            found.config.path.get(PathKey::Std),
            Some(root.join("styles/here").as_path())
        );
    }

    #[test]
    fn test_find_project_override_none() {
        let temp = TempDir::new().unwrap();
        let start = temp.path().join("a/b");
        std::fs::create_dir_all(&start).unwrap();

        // Ancestors of the temp dir must not carry a cslrun.yaml for this to hold.
        let found = find_project_override(&start, &temp.path().join("home")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_undotted_file_in_home_is_placement_error() {
        let temp = TempDir::new().unwrap();
        let env = env_in(&temp);
        std::fs::write(project_config_file(&env.home_dir), "path: {}\n").unwrap();

        let err = find_project_override(&env.cwd, &env.home_dir).unwrap_err();
        assert!(matches!(err, ConfigError::Placement { .. }));
    }

    #[test]
    fn test_placement_error_ignores_content() {
        let temp = TempDir::new().unwrap();
        let env = env_in(&temp);
        std::fs::write(project_config_file(&env.home_dir), ":: not yaml [").unwrap();

        let err = find_project_override(&env.home_dir, &env.home_dir).unwrap_err();
        assert!(matches!(err, ConfigError::Placement { .. }));
    }

    #[test]
    fn test_derive_mode() {
        let mut paths = PathTable::new();
        for key in PathKey::SOURCE_REPO {
            paths.set(key, format!("/repo/{key}"));
        }
        assert_eq!(derive_mode(&paths), Mode::FullMode);

        paths.insert(PathKey::Src.as_str(), PathValue::Unset);
        assert_eq!(derive_mode(&paths), Mode::StyleMode);

        assert_eq!(derive_mode(&PathTable::new()), Mode::StyleMode);
    }

    #[test]
    fn test_styletests_does_not_affect_mode() {
        let mut paths = PathTable::new();
        paths.set(PathKey::StyleTests, "/tests");
        for key in &PathKey::SOURCE_REPO[..6] {
            paths.set(key, "/repo");
        }
        assert_eq!(derive_mode(&paths), Mode::StyleMode);
    }

    #[test]
    fn test_finalize_sets_derived_paths() {
        let temp = TempDir::new().unwrap();
        let env = env_in(&temp);
        let mut paths = PathTable::new();
        paths.set(PathKey::ConfigDir, "/proj");
        paths.set(PathKey::StyleTests, "/proj/tests");

        let notice = finalize(&mut paths, &env);

        assert!(notice.is_none());
        assert_eq!(paths.get(PathKey::Cwd), Some(env.cwd.as_path()));
        assert_eq!(paths.get(PathKey::ScriptDir), Some(env.script_dir.as_path()));
        assert_eq!(
            paths.get(PathKey::Jing),
            Some(env.script_dir.join("jing/jing-20131210.jar").as_path())
        );
        assert_eq!(
            paths.get(PathKey::Chai),
            Some(env.script_dir.join("node_modules/chai/index.js").as_path())
        );
        assert_eq!(
            paths.get(PathKey::FixtureDir),
            Some(Path::new("/proj/.cslTestFixtures"))
        );
    }

    #[test]
    fn test_finalize_ci_fixtures_under_home() {
        let temp = TempDir::new().unwrap();
        let env = ResolverEnv {
            ci: true,
            ..env_in(&temp)
        };
        let mut paths = PathTable::new();
        paths.set(PathKey::ConfigDir, "/proj");

        let notice = finalize(&mut paths, &env);

        assert!(notice.is_some());
        assert_eq!(
            paths.get(PathKey::FixtureDir),
            Some(env.home_dir.join(".cslTestFixtures").as_path())
        );
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let pairs: Vec<(String, OsString)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_discover_with_defaults() {
        let env = ResolverEnv::discover_with(
            vars(&[]),
            PathBuf::from("/work"),
            Some(PathBuf::from("/home/u")),
            Some(PathBuf::from("/opt/cslrun/bin/cslrun")),
        )
        .unwrap();

        assert_eq!(env.home_dir, PathBuf::from("/home/u"));
        assert_eq!(env.cwd, PathBuf::from("/work"));
        assert_eq!(env.script_dir, PathBuf::from("/opt/cslrun/bin"));
        assert!(!env.ci);
    }

    #[test]
    fn test_discover_with_overrides() {
        let env = ResolverEnv::discover_with(
            vars(&[
                ("CSLRUN_HOME", "/srv/home"),
                ("CSLRUN_SCRIPT_DIR", "/srv/runner"),
                ("TRAVIS", "true"),
            ]),
            PathBuf::from("/work"),
            Some(PathBuf::from("/home/u")),
            None,
        )
        .unwrap();

        assert_eq!(env.home_dir, PathBuf::from("/srv/home"));
        assert_eq!(env.script_dir, PathBuf::from("/srv/runner"));
        assert!(env.ci);
    }

    #[test]
    fn test_discover_with_relative_overrides_join_cwd() {
        let env = ResolverEnv::discover_with(
            vars(&[("CSLRUN_HOME", "relhome"), ("CSLRUN_SCRIPT_DIR", "./bin")]),
            PathBuf::from("/work"),
            Some(PathBuf::from("/home/u")),
            None,
        )
        .unwrap();

        assert_eq!(env.home_dir, PathBuf::from("/work/relhome"));
        assert_eq!(env.script_dir, PathBuf::from("/work/bin"));
        assert!(env.home_dir.is_absolute());
        assert!(env.script_dir.is_absolute());
    }

    #[test]
    fn test_discover_with_empty_values_are_unset() {
        let env = ResolverEnv::discover_with(
            vars(&[("CSLRUN_HOME", ""), ("CSLRUN_SCRIPT_DIR", ""), ("TRAVIS", "")]),
            PathBuf::from("/work"),
            Some(PathBuf::from("/home/u")),
            None,
        )
        .unwrap();

        assert_eq!(env.home_dir, PathBuf::from("/home/u"));
        // No override and no executable path: fall back to the working directory
        assert_eq!(env.script_dir, PathBuf::from("/work"));
        assert!(!env.ci);
    }

    #[test]
    fn test_discover_with_no_home() {
        let err = ResolverEnv::discover_with(vars(&[]), PathBuf::from("/work"), None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::HomeDirUnavailable));
    }

    #[test]
    fn test_relative_home_override_still_rejects_undotted_file() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("relhome");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::write(project_config_file(&home), "path: {}\n").unwrap();

        let env = ResolverEnv::discover_with(
            vars(&[("CSLRUN_HOME", "relhome"), ("CSLRUN_SCRIPT_DIR", "bin")]),
            temp.path().to_path_buf(),
            None,
            None,
        )
        .unwrap();
        let env = ResolverEnv {
            cwd: home.clone(),
            ..env
        };

        let err = find_project_override(&env.cwd, &env.home_dir).unwrap_err();
        assert!(matches!(err, ConfigError::Placement { .. }));
    }

    #[test]
    fn test_relative_overrides_resolve_to_absolute_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("relhome")).unwrap();

        let env = ResolverEnv::discover_with(
            vars(&[("CSLRUN_HOME", "relhome"), ("CSLRUN_SCRIPT_DIR", "bin")]),
            temp.path().to_path_buf(),
            None,
            None,
        )
        .unwrap();
        let fallbacks = FallbackResources::discover_with(&env.script_dir, vars(&[]));

        let config = resolve_config(&env, &fallbacks).unwrap();

        for (key, value) in config.path.iter() {
            if let Some(p) = value.as_path() {
                assert!(p.is_absolute(), "{key} is not absolute: {}", p.display());
            }
        }
        assert_eq!(
            config.path(PathKey::ConfigDir),
            Some(temp.path().join("relhome").as_path())
        );
    }
}
