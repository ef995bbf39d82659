use thiserror::Error;

/// Fatal pre-write failures. The reason is surfaced to the user verbatim.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    #[error("customer email `{0}` is not a valid email address")]
    MalformedEmail(String),
}

/// The two fatal outcomes of a submission. Color-resolution and notification
/// failures are deliberately absent: both are non-fatal and are handled at
/// their origin.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl SubmissionError {
    /// What the wizard shows next to its retry affordance. Validation
    /// reasons pass through verbatim; backend detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => error.to_string(),
            Self::Persistence(_) => {
                "We could not save your configuration. Please try again.".to_string()
            }
        }
    }
}
