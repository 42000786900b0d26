// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Mapping between workspace-relative paths and live document identities.

use std::path::{Component, Path, PathBuf};

use crate::document::DocumentId;

/// Resolves the relative paths stored in a timeline against the workspace
/// the session is being replayed (or recorded) in.
pub trait WorkspaceResolver: Send + Sync {
    /// `None` when the path cannot name a document inside the workspace.
    fn resolve(&self, relative: &str) -> Option<DocumentId>;

    /// `None` when the document lives outside the workspace.
    fn relativize(&self, document: &DocumentId) -> Option<String>;
}

/// Workspace rooted at a directory on the local filesystem.
///
/// Relative paths always use `/` separators so that sessions move between
/// platforms.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl WorkspaceResolver for FsWorkspace {
    fn resolve(&self, relative: &str) -> Option<DocumentId> {
        if relative.is_empty() || relative.starts_with('/') || relative.starts_with('\\') {
            return None;
        }
        let mut path = self.root.clone();
        for part in relative.split(['/', '\\']) {
            match part {
                "" | "." => continue,
                ".." => return None,
                part if Path::new(part).is_absolute() || part.contains(':') => return None,
                part => path.push(part),
            }
        }
        (path != self.root).then(|| DocumentId::new(path))
    }

    fn relativize(&self, document: &DocumentId) -> Option<String> {
        let relative = document.path().strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[codio_test_utils::logged_test]
    fn resolves_nested_paths_under_root() {
        let workspace = FsWorkspace::new("/work/project");
        assert_eq!(
            workspace.resolve("src/main.rs"),
            Some(DocumentId::new("/work/project/src/main.rs"))
        );
        assert_eq!(
            workspace.resolve("./docs\\guide.md"),
            Some(DocumentId::new("/work/project/docs/guide.md"))
        );
    }

    #[codio_test_utils::logged_test]
    fn rejects_paths_that_escape_or_are_empty() {
        let workspace = FsWorkspace::new("/work/project");
        assert_eq!(workspace.resolve(""), None);
        assert_eq!(workspace.resolve("."), None);
        assert_eq!(workspace.resolve("/etc/passwd"), None);
        assert_eq!(workspace.resolve("src/../../secret"), None);
        assert_eq!(workspace.resolve("C:/Windows"), None);
    }

    #[codio_test_utils::logged_test]
    fn relativize_is_inverse_of_resolve() {
        let workspace = FsWorkspace::new("/work/project");
        let id = workspace.resolve("src/bin/tool.rs").unwrap();
        assert_eq!(workspace.relativize(&id).as_deref(), Some("src/bin/tool.rs"));
        assert_eq!(workspace.relativize(&DocumentId::new("/work/other.rs")), None);
        assert_eq!(workspace.relativize(&DocumentId::new("/work/project")), None);
    }
}
