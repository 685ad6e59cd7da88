//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The server and client never call `serde_json` directly; they go through
//! a [`Codec`] so the frame format can be swapped without touching the
//! handlers.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Envelope, Payload, ProtocolError, Request, Response};

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task on the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes an envelope and insists that it carries a request.
    fn decode_request(&self, data: &[u8]) -> Result<Request, ProtocolError> {
        let envelope: Envelope = self.decode(data)?;
        match envelope.payload {
            Payload::Request(request) => Ok(request),
            Payload::Response(_) => Err(ProtocolError::UnexpectedPayload {
                expected: "request",
                got: "response",
            }),
        }
    }

    /// Decodes an envelope and insists that it carries a response.
    fn decode_response(&self, data: &[u8]) -> Result<Response, ProtocolError> {
        let envelope: Envelope = self.decode(data)?;
        match envelope.payload {
            Payload::Response(response) => Ok(response),
            Payload::Request(_) => Err(ProtocolError::UnexpectedPayload {
                expected: "response",
                got: "request",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use mafia_protocol::{Codec, Envelope, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Envelope::request(0, 0, Request::Connect)).unwrap();
/// assert_eq!(codec.decode_request(&bytes).unwrap(), Request::Connect);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
