//! Error types for notelink.

use thiserror::Error;

/// Result type alias using notelink's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notelink operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(uuid::Uuid),

    /// Malformed link envelope (structural decode failure)
    #[error("Envelope error: {0}")]
    Envelope(String),

    /// Message bus unreachable or rejected an operation
    #[error("Bus error: {0}")]
    Bus(String),

    /// Operation exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the caller may retry the whole triggering action from scratch.
    ///
    /// Bus and store unavailability surface to HTTP callers as 503; the
    /// remaining variants are caller or programming errors.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Bus(_) | Error::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_event_not_found() {
        let id = Uuid::new_v4();
        let err = Error::EventNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_envelope() {
        let err = Error::Envelope("wrong identifier width".to_string());
        assert_eq!(err.to_string(), "Envelope error: wrong identifier width");
    }

    #[test]
    fn test_error_display_bus() {
        let err = Error::Bus("broker unreachable".to_string());
        assert_eq!(err.to_string(), "Bus error: broker unreachable");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("publish".to_string());
        assert_eq!(err.to_string(), "Timeout: publish");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Bus("down".into()).is_retryable());
        assert!(Error::Timeout("publish".into()).is_retryable());
        assert!(!Error::Envelope("bad".into()).is_retryable());
        assert!(!Error::NoteNotFound(Uuid::nil()).is_retryable());
        assert!(!Error::Internal("bug".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
