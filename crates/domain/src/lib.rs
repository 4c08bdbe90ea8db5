//! crosspost domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `platform`: Target platforms and the front matter platform selector
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Publishing workflow, remote verification, change detection

pub mod model;
pub mod platform;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use platform::{Platform, PlatformParseError, PlatformSelector};
pub use ports::*;

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically, resolving `.` and `..` without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_normal = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_with_normal {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Lexical path of `path` relative to `base`, walking up with `..` past the
/// common prefix. Both paths must already be normalized.
///
/// Returns `None` when no relative path exists, e.g. one path is absolute and
/// the other is not, or `base` climbs out through `..` beyond the common prefix.
pub fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.has_root() != base.has_root() {
        return None;
    }

    let path_components: Vec<Component<'_>> = path.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();
    let common = path_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for component in &base_components[common..] {
        match component {
            Component::Normal(_) => relative.push(".."),
            _ => return None,
        }
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }
    Some(relative)
}

/// Build the post map key for a path relative to the working directory.
///
/// Keys always use `/` separators so map files are portable between machines.
pub fn path_key(relative: &Path) -> String {
    if relative.has_root() {
        return relative.to_string_lossy().into_owned();
    }
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
