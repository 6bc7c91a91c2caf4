use crate::config::ProtectionConfig;
use regex::Regex;
use std::path::{Component, Path};

/// Infrastructure files generated code must never overwrite.
pub const DEFAULT_PROTECTED_NAMES: &[&str] = &[
    "nuxt.config",
    "app.vue",
    "package.json",
    "tailwind.config",
    "postcss.config",
    "vite.config",
    "tsconfig.json",
    "main.ts",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDecision {
    Write,
    /// Matched the denylist; carries the entry that matched.
    Protected(String),
    /// Cannot be placed safely under the base directory.
    Unsafe(String),
}

impl PathDecision {
    pub fn is_write(&self) -> bool {
        matches!(self, PathDecision::Write)
    }

    pub fn describe(&self) -> String {
        match self {
            PathDecision::Write => "write".to_string(),
            PathDecision::Protected(token) => format!("skip (protected: {})", token),
            PathDecision::Unsafe(reason) => format!("reject ({})", reason),
        }
    }
}

pub struct PathPolicy {
    enabled: bool,
    protected_names: Vec<String>,
    protected_patterns: Vec<Regex>,
}

impl PathPolicy {
    pub fn new(config: &ProtectionConfig) -> Self {
        let protected_patterns = config
            .protected_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid protected pattern");
                    None
                }
            })
            .collect();

        Self {
            enabled: config.enabled,
            protected_names: config.protected_names.clone(),
            protected_patterns,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn check(&self, relative_path: &str) -> PathDecision {
        if let Err(reason) = validate_relative_path(relative_path) {
            return PathDecision::Unsafe(reason);
        }

        match self.protected_match(relative_path) {
            Some(token) => PathDecision::Protected(token),
            None => PathDecision::Write,
        }
    }

    /// Substring match against the denylist, then the regex patterns.
    ///
    /// Any occurrence counts, in a directory segment or the file name, so
    /// `src/main.tsx` and `old-package.json.bak` are protected as well.
    pub fn protected_match(&self, relative_path: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        if let Some(name) = self
            .protected_names
            .iter()
            .find(|name| relative_path.contains(name.as_str()))
        {
            return Some(name.clone());
        }

        self.protected_patterns
            .iter()
            .find(|pattern| pattern.is_match(relative_path))
            .map(|pattern| pattern.as_str().to_string())
    }

    pub fn is_protected(&self, relative_path: &str) -> bool {
        self.protected_match(relative_path).is_some()
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new(&ProtectionConfig::default())
    }
}

/// Reject paths that would land outside the base directory once joined.
pub fn validate_relative_path(relative_path: &str) -> std::result::Result<(), String> {
    if relative_path.is_empty() {
        return Err("empty path".to_string());
    }

    if relative_path.chars().any(|c| c == '\0') {
        return Err("path contains a NUL byte".to_string());
    }

    let path = Path::new(relative_path);
    if path.has_root() || path.is_absolute() {
        return Err("absolute paths are not allowed".to_string());
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err("directory traversal is not allowed".to_string());
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err("absolute paths are not allowed".to_string());
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    if path.file_name().is_none() {
        return Err("path does not name a file".to_string());
    }

    Ok(())
}
