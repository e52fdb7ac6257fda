use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    /// The pre-action needle was not on screen, so the action cannot be performed.
    #[error("Precondition missing: could not find {}", .needle.display())]
    PreconditionMissing { needle: PathBuf },

    /// The action was attempted but the post-action needle never confirmed it.
    #[error("Could not confirm {} after {attempts} attempts", .needle.display())]
    ConfirmationTimeout { needle: PathBuf, attempts: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Screen capture error: {0}")]
    Capture(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl BotError {
    /// Configuration errors are deployment defects; the process must not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::InvalidConfig(_))
    }
}
