use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScorecardError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("manager passcode rejected")]
    Unauthorized,

    #[error("passcode does not match staff member {0}")]
    StaffPasscodeMismatch(String),

    #[error("unknown staff member: {0}")]
    UnknownStaff(String),

    #[error("assessment not found: {0}")]
    AssessmentNotFound(Uuid),

    #[error("submission not found: {0}")]
    SubmissionNotFound(Uuid),

    #[error("submission {0} has already been graded")]
    AlreadyGraded(Uuid),
}

impl ScorecardError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScorecardError::Validation(message.into())
    }
}
