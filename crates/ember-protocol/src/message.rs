//! Message shapes and the JSON codec.
//!
//! A message is a request, a success response, or an error response. On the
//! wire each is a flat JSON object; the shape is recognised by which fields
//! are present (`method` for requests, `error` for error responses, `result`
//! for success responses). Field order is irrelevant. Outgoing messages carry
//! a `jsonrpc` version marker for completeness; it is ignored on input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Version marker attached to outgoing messages.
pub const PROTOCOL_VERSION: &str = "2.0";

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A call initiated by either side.
    Request(Request),
    /// A successful reply to a previously received request.
    Response(Response),
    /// A failed reply to a previously received request.
    Error(ErrorResponse),
}

impl Message {
    /// Returns the correlation id carried by the message.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Request(request) => request.id,
            Self::Response(response) => response.id,
            Self::Error(error) => error.id,
        }
    }

    /// Serialises the message to its JSON wire payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let wire = match self {
            Self::Request(request) => WireMessage {
                jsonrpc: Some(PROTOCOL_VERSION),
                method: Some(request.method.clone()),
                params: Some(request.params.clone()),
                id: Some(request.id),
                ..WireMessage::default()
            },
            Self::Response(response) => WireMessage {
                jsonrpc: Some(PROTOCOL_VERSION),
                id: Some(response.id),
                result: Some(response.result),
                string: response.string.clone(),
                ..WireMessage::default()
            },
            Self::Error(error) => WireMessage {
                jsonrpc: Some(PROTOCOL_VERSION),
                id: Some(error.id),
                error: Some(WireError {
                    code: Some(error.code),
                    message: Some(error.message.clone()),
                }),
                ..WireMessage::default()
            },
        };
        serde_json::to_vec(&wire)
    }

    /// Parses a JSON wire payload into a message.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the payload is not valid JSON,
    /// [`DecodeError::MissingField`] if a field required by the apparent
    /// shape is absent, and [`DecodeError::UnrecognisedShape`] if the payload
    /// carries none of `method`, `result`, or `error`.
    pub fn from_bytes(payload: &[u8]) -> Result<Self, DecodeError> {
        let wire: WireMessage = serde_json::from_slice(payload)?;

        if let Some(method) = wire.method {
            let params = wire
                .params
                .ok_or(DecodeError::missing("request", "params"))?;
            let id = wire.id.ok_or(DecodeError::missing("request", "id"))?;
            return Ok(Self::Request(Request { method, params, id }));
        }

        if let Some(error) = wire.error {
            let id = wire
                .id
                .ok_or(DecodeError::missing("error response", "id"))?;
            let code = error
                .code
                .ok_or(DecodeError::missing("error response", "error.code"))?;
            let message = error
                .message
                .ok_or(DecodeError::missing("error response", "error.message"))?;
            return Ok(Self::Error(ErrorResponse { id, code, message }));
        }

        if let Some(result) = wire.result {
            let id = wire.id.ok_or(DecodeError::missing("response", "id"))?;
            return Ok(Self::Response(Response {
                id,
                result,
                string: wire.string,
            }));
        }

        Err(DecodeError::UnrecognisedShape)
    }
}

/// A call initiated by one side of the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The method (or command name) to invoke.
    pub method: String,
    /// Method parameters; shapes are defined per method.
    pub params: Value,
    /// Correlation id allocated by the sender.
    pub id: i64,
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Correlation id of the request being answered.
    pub id: i64,
    /// Integer result, conventionally a [`crate::Status`] code.
    pub result: i64,
    /// Optional string payload (property reads, status text).
    pub string: Option<String>,
}

/// A failed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    /// Correlation id of the request being answered.
    pub id: i64,
    /// Non-negative codes are command statuses; negative codes are
    /// protocol-level errors (see [`crate::error_code`]).
    pub code: i64,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Errors raised while decoding a wire payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("malformed message payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload matches a known shape but lacks a required field.
    #[error("{shape} missing required field '{field}'")]
    MissingField {
        /// The apparent message shape.
        shape: &'static str,
        /// The absent field.
        field: &'static str,
    },

    /// The payload carries none of `method`, `result`, or `error`.
    #[error("message has no recognisable shape (no method, result, or error)")]
    UnrecognisedShape,
}

impl DecodeError {
    const fn missing(shape: &'static str, field: &'static str) -> Self {
        Self::MissingField { shape, field }
    }
}

/// Superset of all message fields, used for both directions of the codec.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    // Write-only: inbound version markers are ignored.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    jsonrpc: Option<&'static str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<WireError>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}
