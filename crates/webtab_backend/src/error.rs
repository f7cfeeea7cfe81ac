use webtab_domain::ValidationError;

/// Failures the reconciler recovers from. Only [`StorageError::Validation`]
/// coming out of a backup import ever reaches a caller.
#[derive(Debug)]
pub enum StorageError {
    Parse { key: String, message: String },
    Validation(ValidationError),
    BackendUnavailable,
    Backend(String),
    SizeExceeded { key: String, bytes: usize, limit: usize },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Parse { key, message } => {
                write!(f, "stored value for {key} is not valid JSON: {message}")
            }
            StorageError::Validation(err) => write!(f, "{err}"),
            StorageError::BackendUnavailable => write!(f, "sync backend is not available"),
            StorageError::Backend(message) => write!(f, "sync backend error: {message}"),
            StorageError::SizeExceeded { key, bytes, limit } => {
                write!(f, "value for {key} is {bytes} bytes, over the {limit} byte limit")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::Validation(err)
    }
}
