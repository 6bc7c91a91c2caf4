use crate::error::AnimCodeError;
use serde::{Deserialize, Serialize};

/// Outcome of one save invocation, in the shape the orchestration layer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub success: bool,
    pub message: String,
    pub saved_files: Vec<String>,
}

impl WriteResult {
    pub fn saved(saved_files: Vec<String>) -> Self {
        Self {
            success: true,
            message: format!("Successfully saved {} animation files", saved_files.len()),
            saved_files,
        }
    }

    pub fn cancelled(saved_files: Vec<String>) -> Self {
        Self {
            success: false,
            message: format!("Cancelled after saving {} animation files", saved_files.len()),
            saved_files,
        }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self {
            success: false,
            message: message.into(),
            saved_files: Vec::new(),
        }
    }

    /// Result for a save that stopped before writing anything.
    pub fn from_error(error: &AnimCodeError) -> Self {
        match error {
            AnimCodeError::Cancelled => Self::cancelled(Vec::new()),
            _ => Self::failed(error.to_string()),
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved_files.len()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
