use thiserror::Error;

/// Error taxonomy for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to spawn server process: {0}")]
    Spawn(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("client is not connected")]
    NotConnected,

    #[error("no active session: {0}")]
    SessionNotFound(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid params for {method}: {message}")]
    InvalidParams { method: String, message: String },

    #[error("server error: {message}")]
    Protocol {
        message: String,
        code: Option<i64>,
        data: Option<serde_json::Value>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn spawn(message: impl ToString) -> Self {
        BridgeError::Spawn(message.to_string())
    }

    pub fn transport(message: impl ToString) -> Self {
        BridgeError::Transport(message.to_string())
    }

    pub fn session_not_found(session_id: impl ToString) -> Self {
        BridgeError::SessionNotFound(session_id.to_string())
    }

    pub fn invalid_params(method: impl ToString, message: impl ToString) -> Self {
        BridgeError::InvalidParams {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    pub fn protocol(message: impl ToString) -> Self {
        BridgeError::Protocol {
            message: message.to_string(),
            code: None,
            data: None,
        }
    }

    pub fn config(message: impl ToString) -> Self {
        BridgeError::Config(message.to_string())
    }

    /// Stable identifier for this error kind, reported as the envelope `code`.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Spawn(_) => "SpawnError",
            BridgeError::Transport(_) => "TransportError",
            BridgeError::NotConnected => "NotConnectedError",
            BridgeError::SessionNotFound(_) => "SessionNotFoundError",
            BridgeError::UnknownMethod(_) => "UnknownMethodError",
            BridgeError::UnknownAction(_) => "UnknownActionError",
            BridgeError::InvalidParams { .. } => "InvalidParamsError",
            BridgeError::Protocol { .. } => "ProtocolError",
            BridgeError::Config(_) => "ConfigError",
        }
    }

    /// Check if this error was caused by the shape of the caller's request
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownMethod(_)
                | BridgeError::UnknownAction(_)
                | BridgeError::InvalidParams { .. }
                | BridgeError::Config(_)
        )
    }

    /// Check if this error refers to a session the registry does not hold
    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::SessionNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BridgeError::spawn("command not found: nonexistent");
        let display = format!("{error}");
        assert!(display.contains("failed to spawn server process"));

        let error = BridgeError::transport("stream closed");
        let display = format!("{error}");
        assert!(display.contains("transport error"));

        let error = BridgeError::invalid_params("callTool", "missing field `name`");
        let display = format!("{error}");
        assert!(display.contains("callTool"));
        assert!(display.contains("missing field `name`"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(BridgeError::spawn("x").kind(), "SpawnError");
        assert_eq!(BridgeError::transport("x").kind(), "TransportError");
        assert_eq!(BridgeError::NotConnected.kind(), "NotConnectedError");
        assert_eq!(
            BridgeError::session_not_found("s1").kind(),
            "SessionNotFoundError"
        );
        assert_eq!(
            BridgeError::UnknownMethod("frobnicate".to_string()).kind(),
            "UnknownMethodError"
        );
        assert_eq!(
            BridgeError::UnknownAction("reboot".to_string()).kind(),
            "UnknownActionError"
        );
        assert_eq!(BridgeError::protocol("x").kind(), "ProtocolError");
    }

    #[test]
    fn test_error_categorization() {
        // Caller-side errors
        assert!(BridgeError::UnknownMethod("x".to_string()).is_request_error());
        assert!(BridgeError::UnknownAction("x".to_string()).is_request_error());
        assert!(BridgeError::invalid_params("callTool", "bad").is_request_error());

        // Everything else is a bridge- or server-side failure
        assert!(!BridgeError::spawn("x").is_request_error());
        assert!(!BridgeError::transport("x").is_request_error());
        assert!(!BridgeError::NotConnected.is_request_error());
        assert!(!BridgeError::session_not_found("s1").is_request_error());

        assert!(BridgeError::session_not_found("s1").is_not_found());
        assert!(!BridgeError::NotConnected.is_not_found());
    }

    #[test]
    fn test_protocol_error_carries_server_detail() {
        let error = BridgeError::Protocol {
            message: "tool not found".to_string(),
            code: Some(-32602),
            data: Some(serde_json::json!({"tool": "subtract"})),
        };
        assert_eq!(error.kind(), "ProtocolError");
        let display = format!("{error}");
        assert!(display.contains("tool not found"));
    }
}
