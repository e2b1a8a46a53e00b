use crate::store::StoreError;

/// Message reported whenever a post cannot be found
pub const NOT_FOUND_MESSAGE: &str = "Data tidak ditemukan";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller input broke one or more declared rules
    #[error("{}", .0.join(" "))]
    Validation(Vec<String>),

    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_space_separated() {
        let err = AppError::Validation(vec![
            "The title field is required.".to_string(),
            "The description must be a string.".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "The title field is required. The description must be a string."
        );
    }

    #[test]
    fn store_faults_keep_their_raw_text() {
        let err = AppError::from(StoreError::Fault("disk on fire".to_string()));
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn not_found_uses_shared_message() {
        assert_eq!(AppError::NotFound.to_string(), "Data tidak ditemukan");
    }
}
