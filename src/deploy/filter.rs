//! Deny-list filtering for deploy folders.
//!
//! Two layers with distinct jobs: directory rules prune the walk so denied
//! trees are never descended into, and file rules drop individual entries by
//! basename. Matching is case-sensitive and operates on '/'-separated paths
//! relative to the deploy root.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, ShipError};

/// One deny rule. The variant decides which part of a path it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyRule {
    /// Directory basename; prunes the whole subtree.
    Directory(&'static str),
    /// Exact file basename.
    File(&'static str),
    /// `.env` and every `.env.*` sibling.
    EnvFamily,
    /// File extension, leading dot included.
    Extension(&'static str),
}

/// Deny rules applied to every deploy. Source control metadata, dependency
/// trees, and anything that tends to hold credentials.
pub const DENY_RULES: &[DenyRule] = &[
    DenyRule::Directory(".git"),
    DenyRule::Directory("node_modules"),
    DenyRule::Directory(".claude"),
    DenyRule::File(".DS_Store"),
    DenyRule::File(".deploy.json"),
    DenyRule::File(".npmrc"),
    DenyRule::File("id_rsa"),
    DenyRule::File("id_ed25519"),
    DenyRule::File("id_ecdsa"),
    DenyRule::EnvFamily,
    DenyRule::Extension(".pem"),
    DenyRule::Extension(".key"),
    DenyRule::Extension(".pfx"),
    DenyRule::Extension(".p12"),
];

fn denied_dir_name(name: &str) -> bool {
    DENY_RULES
        .iter()
        .any(|rule| matches!(rule, DenyRule::Directory(dir) if *dir == name))
}

fn denied_basename(name: &str) -> bool {
    DENY_RULES.iter().any(|rule| match rule {
        DenyRule::Directory(_) => false,
        DenyRule::File(file) => *file == name,
        DenyRule::EnvFamily => name == ".env" || name.starts_with(".env."),
        DenyRule::Extension(ext) => name.ends_with(ext),
    })
}

/// Whether a '/'-separated relative path is excluded from deployment.
///
/// Directory rules match ancestor segments only; the final segment is checked
/// against the file rules. A file that merely shares its name with a denied
/// directory is kept.
#[must_use]
pub fn should_exclude(relative_path: &str) -> bool {
    let mut segments = relative_path.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            return denied_basename(segment);
        }
        if denied_dir_name(segment) {
            return true;
        }
    }
    false
}

/// Depth 0 is the deploy root itself; it is never pruned, even when the
/// folder happens to be named like a denied directory.
fn keep_entry(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    !entry.file_name().to_str().is_some_and(denied_dir_name)
}

/// Walk `root` and return the relative paths of every deployable file,
/// sorted ascending. Symlinks are skipped rather than followed.
pub fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(keep_entry) {
        let entry = entry.map_err(|err| ShipError::Filter(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|err| ShipError::Filter(err.to_string()))?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if should_exclude(&relative) {
            continue;
        }
        files.push(relative);
    }

    files.sort();
    Ok(files)
}
