// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration file discovery

use std::path::{Path, PathBuf};

/// Configuration files consulted, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct Paths {
    pub user: Option<PathBuf>,
    pub repo: Option<PathBuf>,
}

/// `CODIO_HOME/config.toml` (or the platform config dir) and, when a
/// workspace is known, `<workspace>/.codio/config.toml`.
pub fn discover_paths(workspace: Option<&Path>) -> Paths {
    Paths {
        user: user_config_path(),
        repo: workspace.map(|root| root.join(".codio").join("config.toml")),
    }
}

fn user_config_path() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("CODIO_HOME") {
        return Some(PathBuf::from(home).join("config.toml"));
    }
    dirs::config_dir().map(|dir| dir.join("codio").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[codio_test_utils::logged_test]
    fn repo_layer_lives_under_dot_codio() {
        let paths = discover_paths(Some(Path::new("/work/project")));
        assert_eq!(
            paths.repo,
            Some(PathBuf::from("/work/project/.codio/config.toml"))
        );
        assert!(discover_paths(None).repo.is_none());
    }
}
