//! Configuration types and structures.

use crate::paths::absolutize;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Logical keys understood under `path:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKey {
    StyleTests,
    Local,
    Std,
    Src,
    Locale,
    Modules,
    CslSchema,
    CslmSchema,
    // Derived by the resolver
    ConfigDir,
    Cwd,
    ScriptDir,
    Jing,
    FixtureDir,
    Chai,
}

impl PathKey {
    /// Keys that may appear in a config file.
    pub const CONFIGURABLE: [PathKey; 8] = [
        PathKey::StyleTests,
        PathKey::Local,
        PathKey::Std,
        PathKey::Src,
        PathKey::Locale,
        PathKey::Modules,
        PathKey::CslSchema,
        PathKey::CslmSchema,
    ];

    /// Keys naming subdirectories of a CSL source repository checkout.
    /// All of them must be set for full mode.
    pub const SOURCE_REPO: [PathKey; 7] = [
        PathKey::Local,
        PathKey::Std,
        PathKey::Src,
        PathKey::Locale,
        PathKey::Modules,
        PathKey::CslSchema,
        PathKey::CslmSchema,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PathKey::StyleTests => "styletests",
            PathKey::Local => "local",
            PathKey::Std => "std",
            PathKey::Src => "src",
            PathKey::Locale => "locale",
            PathKey::Modules => "modules",
            PathKey::CslSchema => "cslschema",
            PathKey::CslmSchema => "cslmschema",
            PathKey::ConfigDir => "configdir",
            PathKey::Cwd => "cwd",
            PathKey::ScriptDir => "scriptdir",
            PathKey::Jing => "jing",
            PathKey::FixtureDir => "fixturedir",
            PathKey::Chai => "chai",
        }
    }
}

impl AsRef<str> for PathKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `path:` entry: a filesystem path, or unset.
///
/// In YAML, `false`, `null` and `""` all read as unset. Unset writes back as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathValue {
    #[default]
    Unset,
    Set(PathBuf),
}

impl PathValue {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            PathValue::Set(p) => Some(p),
            PathValue::Unset => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, PathValue::Set(_))
    }
}

impl Serialize for PathValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathValue::Unset => serializer.serialize_bool(false),
            PathValue::Set(p) => p.serialize(serializer),
        }
    }
}

struct PathValueVisitor;

impl<'de> Visitor<'de> for PathValueVisitor {
    type Value = PathValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a path string or false")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<PathValue, E> {
        if v {
            Err(E::invalid_value(de::Unexpected::Bool(true), &self))
        } else {
            Ok(PathValue::Unset)
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PathValue, E> {
        if v.is_empty() {
            Ok(PathValue::Unset)
        } else {
            Ok(PathValue::Set(PathBuf::from(v)))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<PathValue, E> {
        Ok(PathValue::Unset)
    }

    fn visit_none<E: de::Error>(self) -> Result<PathValue, E> {
        Ok(PathValue::Unset)
    }
}

impl<'de> Deserialize<'de> for PathValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PathValueVisitor)
    }
}

/// The `path:` mapping. Unknown keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTable(BTreeMap<String, PathValue>);

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The path stored under `key`, if it is set.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Path> {
        self.0.get(key.as_ref()).and_then(PathValue::as_path)
    }

    pub fn is_set(&self, key: impl AsRef<str>) -> bool {
        self.get(key).is_some()
    }

    /// Whether the key appears at all, set or not.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.0.contains_key(key.as_ref())
    }

    pub fn set(&mut self, key: impl AsRef<str>, path: impl Into<PathBuf>) {
        self.0
            .insert(key.as_ref().to_string(), PathValue::Set(path.into()));
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PathValue) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rewrite every relative set value as absolute against `base`, in place.
    pub fn absolutize(&mut self, base: &Path) {
        for value in self.0.values_mut() {
            if let PathValue::Set(p) = value {
                *p = absolutize(base, p);
            }
        }
    }
}

impl IntoIterator for PathTable {
    type Item = (String, PathValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PathValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, PathValue)> for PathTable {
    fn from_iter<I: IntoIterator<Item = (K, PathValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Contents of a single `cslrun.yaml` / `.cslrun.yaml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Informational group identifier.
    #[serde(rename = "groupID", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    pub path: PathTable,
}

impl Configuration {
    /// Configuration with an empty `path:` mapping, used in CI runs.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Operating mode derived from the source-repository keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Testing styles in isolation.
    StyleMode,
    /// Running against a full CSL source repository checkout.
    FullMode,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::StyleMode => "styleMode",
            Mode::FullMode => "fullMode",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal notice shown when no style-test directory is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupNotice {
    pub summary: String,
    pub instructions: String,
}

impl SetupNotice {
    pub fn styletests_missing(user_file: &Path) -> Self {
        Self {
            summary: "Some setup required.".to_string(),
            instructions: format!(
                "Configuration\n\n\
                 To use the cslrun command for building and\n\
                 running style tests, edit the styletests line\n\
                 in {}:\n\n    \
                 styletests: path/to/styles/directory\n\n\
                 The path should be to the parent directory of\n\
                 subdirectories named for the styles to be tested.\n",
                user_file.display()
            ),
        }
    }
}

impl fmt::Display for SetupNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.summary, self.instructions)
    }
}

/// Where the merged values came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    /// The user-level file; `None` in CI runs.
    pub user_file: Option<PathBuf>,
    /// The project override file, if one was found.
    pub project_file: Option<PathBuf>,
}

/// Fully resolved configuration handed to the rest of the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    #[serde(rename = "groupID", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    pub mode: Mode,

    pub path: PathTable,

    #[serde(skip)]
    pub sources: ConfigSources,

    #[serde(skip)]
    pub notice: Option<SetupNotice>,
}

impl ResolvedConfig {
    /// Shorthand for `self.path.get(key)`.
    pub fn path(&self, key: PathKey) -> Option<&Path> {
        self.path.get(key)
    }
}
