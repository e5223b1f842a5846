use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Tool {tool} timed out after {seconds} seconds")]
    Timeout { tool: String, seconds: u64 },

    #[error("Duplicate capability name: {0}")]
    Duplicate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CapabilityError {
    /// Errors caused by the argument the model chose (bad input, missing
    /// file, path outside the workspace). Backend failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CapabilityError::InvalidArgument(_)
                | CapabilityError::NotFound(_)
                | CapabilityError::PermissionDenied(_)
        )
    }
}
