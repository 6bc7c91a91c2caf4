use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnimCodeError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Animation server directory is not configured (set {env_var} or --target)")]
    BaseDirectoryNotConfigured { env_var: String },

    #[error("Animation server directory not found: {path}")]
    BaseDirectoryNotFound { path: String },

    #[error("Invalid file path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to read input: {message}")]
    Input { message: String },

    #[error("Error saving animation code: {message}")]
    Task { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for AnimCodeError {
    fn user_message(&self) -> String {
        match self {
            AnimCodeError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            AnimCodeError::BaseDirectoryNotConfigured { env_var } => {
                format!("No animation server directory configured ({} is not set)", env_var)
            }
            AnimCodeError::BaseDirectoryNotFound { path } => {
                format!("Animation server directory not found: {}", path)
            }
            AnimCodeError::InvalidPath { path, reason } => {
                format!("Invalid file path {}: {}", path, reason)
            }
            AnimCodeError::Input { message } => {
                format!("Could not read the completion text: {}", message)
            }
            AnimCodeError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            AnimCodeError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            AnimCodeError::BaseDirectoryNotConfigured { env_var } => Some(format!(
                "Export {} with the path of the animation project, pass --target, or set [target] base_directory in animcode.toml.",
                env_var
            )),
            AnimCodeError::BaseDirectoryNotFound { .. } => Some(
                "Make sure the animation project has been checked out and the path points at its root directory.".to_string()
            ),
            AnimCodeError::Input { .. } => Some(
                "Pass a readable file path, or pipe the completion on stdin.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for AnimCodeError {
    fn from(error: toml::de::Error) -> Self {
        AnimCodeError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnimCodeError>;
