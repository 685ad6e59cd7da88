//! Client error types.

use mafia_protocol::ProtocolError;
use mafia_transport::TransportError;

/// Errors a client call can fail with.
///
/// Refused joins (`NOT_FOUND`, `FULL`) are not errors: they arrive as
/// rejection snapshots and callers branch on the value.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server could not be reached at all.
    #[error("could not connect to server {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: TransportError,
    },

    /// The server reported a fault for this call.
    #[error("server error {code}: {message}")]
    ServerFault { code: u16, message: String },

    /// A frame from the server could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server answered with a response that doesn't belong to this call.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The connection failed after it was established.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns `true` if the server was never reached.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    /// Returns `true` if the server answered with a fault.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::ServerFault { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_fault_display() {
        let err = ClientError::ServerFault {
            code: 500,
            message: "internal server error".into(),
        };
        assert_eq!(err.to_string(), "server error 500: internal server error");
        assert!(err.is_server_fault());
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_unreachable_names_address() {
        let err = ClientError::Unreachable {
            addr: "localhost:1".into(),
            source: TransportError::Connect {
                url: "ws://localhost:1".into(),
                source: "refused".into(),
            },
        };
        assert!(err.is_unreachable());
        assert!(err.to_string().contains("localhost:1"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ClientError = ProtocolError::RequestTimeout(std::time::Duration::from_secs(5)).into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}
