use crate::error::{AnimCodeError, Result};
use crate::writer::DEFAULT_PROTECTED_NAMES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_VAR: &str = "ANIMATION_SERVER_PATH";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub protection: ProtectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Root of the animation project; falls back to `env_var` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<PathBuf>,
    pub env_var: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtectionConfig {
    pub enabled: bool,
    pub protected_names: Vec<String>,
    pub protected_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub show_skipped: bool,
    pub progress: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_directory: None,
            env_var: DEFAULT_ENV_VAR.to_string(),
        }
    }
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            protected_names: DEFAULT_PROTECTED_NAMES.iter().map(|s| s.to_string()).collect(),
            protected_patterns: Vec::new(),
        }
    }
}

impl ProtectionConfig {
    /// Append `name` to the denylist unless it is blank or already present.
    pub fn add_protected_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.protected_names.iter().any(|n| n == name) {
            return false;
        }

        self.protected_names.push(name.to_string());
        true
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_skipped: true,
            progress: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AnimCodeError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| AnimCodeError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| AnimCodeError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["animcode.toml", ".animcode.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref target) = cli_args.target {
            self.target.base_directory = Some(target.clone());
        }

        if let Some(allow_protected) = cli_args.allow_protected {
            self.protection.enabled = !allow_protected;
        }

        if let Some(ref protect) = cli_args.protect {
            for name in protect {
                self.protection.add_protected_name(name);
            }
        }

        if let Some(progress) = cli_args.progress {
            self.output.progress = progress;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| AnimCodeError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| AnimCodeError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.env_var.trim().is_empty() {
            return Err(AnimCodeError::Config {
                message: "target.env_var must name an environment variable".to_string(),
            });
        }

        if self.protection.protected_names.iter().any(|n| n.is_empty()) {
            return Err(AnimCodeError::Config {
                message: "Protected names must not be empty (an empty name would match every path)"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// The configured base directory, consulting the environment through `lookup`.
    ///
    /// An explicit `base_directory` wins over the environment variable. Empty
    /// values count as unset.
    pub fn base_directory_with<F>(&self, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref dir) = self.target.base_directory {
            if !dir.as_os_str().is_empty() {
                return Some(dir.clone());
            }
        }

        lookup(&self.target.env_var)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn base_directory(&self) -> Option<PathBuf> {
        self.base_directory_with(|name| std::env::var(name).ok())
    }

    /// Resolve the base directory and check that it exists.
    pub fn resolve_base_directory(&self) -> Result<PathBuf> {
        let dir = self
            .base_directory()
            .ok_or_else(|| AnimCodeError::BaseDirectoryNotConfigured {
                env_var: self.target.env_var.clone(),
            })?;

        check_base_directory(&dir)?;
        Ok(dir)
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.target.base_directory = Some(PathBuf::from("/path/to/animation_server"));
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

pub fn check_base_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(AnimCodeError::BaseDirectoryNotFound {
            path: dir.display().to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub target: Option<PathBuf>,
    pub allow_protected: Option<bool>,
    pub protect: Option<Vec<String>>,
    pub progress: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: Option<PathBuf>) -> Self {
        self.target = target;
        self
    }

    pub fn with_allow_protected(mut self, allow: Option<bool>) -> Self {
        self.allow_protected = allow;
        self
    }

    pub fn with_protect(mut self, protect: Option<Vec<String>>) -> Self {
        self.protect = protect;
        self
    }

    pub fn with_progress(mut self, progress: Option<bool>) -> Self {
        self.progress = progress;
        self
    }
}
