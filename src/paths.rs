//! Path helpers for configuration values.
//!
//! Pure path manipulation; nothing here touches the filesystem except
//! [`is_empty_dir`].

use std::path::{Component, Path, PathBuf};

/// Make `value` absolute against `base`.
///
/// Absolute values are returned untouched, since `..` after a symlink may not
/// mean the lexical parent. Relative values are joined onto `base` and then
/// normalized, so `styles/../std` under `/home/u` becomes `/home/u/std`.
pub fn absolutize(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        normalize_path_components(&base.join(value))
    }
}

/// Resolve `.` and `..` without consulting the filesystem.
pub fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(Component::Prefix(p)),
            Component::RootDir => components.push(Component::RootDir),
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(Component::ParentDir),
            },
            Component::Normal(name) => components.push(Component::Normal(name)),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }
    components.iter().collect()
}

/// True when `dir` has no entries. An unreadable directory counts as empty.
pub fn is_empty_dir(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_joined_onto_base() {
        let out = absolutize(Path::new("/home/u"), Path::new("styles"));
        assert_eq!(out, PathBuf::from("/home/u/styles"));
    }

    #[test]
    fn test_absolute_kept() {
        let out = absolutize(Path::new("/home/u"), Path::new("/srv/csl/std"));
        assert_eq!(out, PathBuf::from("/srv/csl/std"));
    }

    #[test]
    fn test_absolute_dot_segments_left_alone() {
        let out = absolutize(Path::new("/home/u"), Path::new("/srv/link/../std"));
        assert_eq!(out, PathBuf::from("/srv/link/../std"));
    }

    #[test]
    fn test_dot_segments_resolved() {
        let out = absolutize(Path::new("/home/u/proj"), Path::new("./a/../../std"));
        assert_eq!(out, PathBuf::from("/home/u/std"));
    }

    #[test]
    fn test_parent_of_root_is_root() {
        let out = normalize_path_components(Path::new("/../x"));
        assert_eq!(out, PathBuf::from("/x"));
    }

    #[test]
    fn test_is_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(is_empty_dir(temp.path()));

        std::fs::write(temp.path().join("en-US.xml"), "<locale/>").unwrap();
        assert!(!is_empty_dir(temp.path()));

        assert!(is_empty_dir(&temp.path().join("missing")));
    }
}
