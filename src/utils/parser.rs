use std::path::{Path, PathBuf};
use log::error;
use regex::Regex;
use crate::errors::SourceError::InvalidArgumentError;
use crate::errors::SourceResult;

// Google Drive ids (and the `root` alias) only use URL-safe base64 characters.
const DRIVE_ID_REGEX: &str = r"^[A-Za-z0-9_-]+$";

/// Convert a folder name to its local directory name.
///
/// Lowercases the name and replaces every single space with `_`
/// (`"My  Notes"` becomes `"my__notes"`).
pub(crate) fn normalize_folder_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Relative parent path of the children of `folder_name` under `parent`.
///
/// The root parent is the empty string so the first level is `/<name>`.
pub(crate) fn child_parent_path(parent: &str, folder_name: &str) -> String {
    format!("{}/{}", parent, folder_name)
}

/// Resolve `destination/<parent>/<leaf>` on the local file system.
///
/// `parent` is a `/`-separated relative path as produced by [child_parent_path].
pub(crate) fn local_path(destination: &Path, parent: &str, leaf: &str) -> PathBuf {
    let mut path = destination.to_path_buf();
    for component in parent.split('/').filter(|component| !component.is_empty()) {
        path.push(component);
    }
    path.push(leaf);
    path
}

/// Check that a Drive name can be used as exactly one local path component.
///
/// # Arguments
/// - `name`: folder or file name derived from a Drive entry.
///
/// # Returns
/// - SourceResult<()>: [InvalidArgumentError] when the name is empty, `.` or `..`,
/// or contains a path separator or NUL, since it would leave the mirrored directory.
pub(crate) fn validate_path_component(name: &str) -> SourceResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        error!("Name cannot be used as a local path component: {:?}", name);
        return Err(InvalidArgumentError(format!(
            "Name '{}' cannot be used as a local path component", name)));
    }

    Ok(())
}

/// Check a Drive id before it is interpolated into a `files.list` query.
pub(crate) fn validate_drive_id(id: &str) -> SourceResult<()> {
    // SAFETY: The regex statement is const string so this is always Ok().
    let regex = Regex::new(DRIVE_ID_REGEX).unwrap();

    if !regex.is_match(id) {
        error!("Drive id is invalid: {}", id);
        return Err(InvalidArgumentError(format!("Invalid Drive id: '{}'", id)));
    }

    Ok(())
}
