use std::time::Duration;

/// Wire-level failures.
///
/// `Decode` covers frames that aren't valid envelopes at all. A frame that
/// parses but is the wrong kind for the call is `UnexpectedPayload`.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("cannot encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// Malformed JSON, a missing field, or an unknown enum value.
    #[cfg(feature = "json")]
    #[error("malformed frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("expected a {expected}, got a {got}")]
    UnexpectedPayload {
        expected: &'static str,
        got: &'static str,
    },

    /// The peer opened a call but never sent its request.
    #[error("no request received within {0:?}")]
    RequestTimeout(Duration),
}
