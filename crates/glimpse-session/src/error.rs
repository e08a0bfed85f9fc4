//! Session error taxonomy.

/// Failures surfaced by the session controllers.
///
/// Every variant is terminal for the controller instance that produced it.
/// Recovery is always the same move: discard the instance, let the user
/// retry, construct a fresh controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The transport could not allocate a peer identity.
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// Blank room code, rejected before any transport contact.
    #[error("invalid room code")]
    InvalidRoomCode,

    /// The room could not be reached, or rejected the connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings() {
        let err = SessionError::RegistrationFailed("broker unreachable".into());
        assert_eq!(err.to_string(), "registration failed: broker unreachable");

        let err = SessionError::InvalidRoomCode;
        assert_eq!(err.to_string(), "invalid room code");

        let err = SessionError::ConnectionFailed("unknown peer".into());
        assert_eq!(err.to_string(), "connection failed: unknown peer");
    }
}
