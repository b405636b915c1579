//! Shared data structures for the application state
//!
//! These types flow between the image store, the generation job
//! and the UI layer.

use std::path::PathBuf;

use crate::error::{AppError, AppResult, ErrorKind};

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt";

/// One persisted image in the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// File stem, shown to the user (e.g. "06.14.25_09:41")
    pub name: String,
    /// Full path to the PNG file
    pub path: PathBuf,
}

/// Whether a request starts from scratch or modifies an existing image.
/// An edit always carries its source, so "attached but no file" can't exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationMode {
    Create,
    Edit { source: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub mode: GenerationMode,
}

impl GenerationRequest {
    /// Build a request from raw user input.
    ///
    /// The prompt is trimmed; a blank prompt is a validation error and no
    /// request is produced. Supplying a source image selects `Edit` mode.
    pub fn new(prompt: &str, source: Option<PathBuf>) -> AppResult<Self> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::validation(EMPTY_PROMPT_MESSAGE));
        }

        let mode = match source {
            Some(source) => GenerationMode::Edit { source },
            None => GenerationMode::Create,
        };

        Ok(Self {
            prompt: prompt.to_string(),
            mode,
        })
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, GenerationMode::Edit { .. })
    }
}

/// Outcome of one generation job, delivered exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success {
        image_bytes: Vec<u8>,
        suggested_name: String,
    },
    Failure {
        reason: String,
        kind: ErrorKind,
    },
}

impl GenerationResult {
    pub fn failure(error: &AppError) -> Self {
        Self::Failure {
            reason: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// Identifies one launched job; handed out in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobTicket(pub u64);

/// Per-window generation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Generating { ticket: JobTicket },
}

impl JobState {
    pub fn is_generating(&self) -> bool {
        matches!(self, JobState::Generating { .. })
    }

    /// True if `ticket` is the job this window is currently waiting on
    pub fn is_waiting_on(&self, ticket: JobTicket) -> bool {
        *self == JobState::Generating { ticket }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_source_is_create() {
        let request = GenerationRequest::new("a red balloon", None).unwrap();
        assert_eq!(request.mode, GenerationMode::Create);
        assert_eq!(request.prompt, "a red balloon");
        assert!(!request.is_edit());
    }

    #[test]
    fn prompt_with_source_is_edit() {
        let source = PathBuf::from("images/cat.png");
        let request = GenerationRequest::new("  add a hat ", Some(source.clone())).unwrap();
        assert_eq!(request.mode, GenerationMode::Edit { source });
        assert_eq!(request.prompt, "add a hat");
    }

    #[test]
    fn blank_prompt_is_rejected() {
        for prompt in ["", "   ", "\n\t"] {
            let error = GenerationRequest::new(prompt, None).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Validation);
            assert_eq!(error.to_string(), EMPTY_PROMPT_MESSAGE);
        }
    }

    #[test]
    fn job_state_tracks_the_current_ticket() {
        let state = JobState::Generating {
            ticket: JobTicket(3),
        };
        assert!(state.is_generating());
        assert!(state.is_waiting_on(JobTicket(3)));
        assert!(!state.is_waiting_on(JobTicket(2)));
        assert!(!JobState::Idle.is_waiting_on(JobTicket(3)));
    }
}
