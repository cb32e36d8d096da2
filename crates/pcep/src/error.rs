// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Error types for the two failure tiers.
//!
//! - [`CodecError`]: transport/programming failures. Input that cannot even
//!   be framed, invariant violations, duplicate registrations. These close
//!   the connection locally without necessarily notifying the peer.
//! - Documented errors: an RFC-assigned [`ErrorCode`](crate::codes::ErrorCode)
//!   that must be answered with a PCErr message. Carried as the
//!   `Documented` variant so call sites match explicitly on
//!   "abort decode" vs "substitute placeholder" vs "reply and keep going".

use crate::codes::ErrorCode;

/// Result alias for decode/encode paths.
pub type ParseResult<T> = Result<T, ParseError>;

/// Failure of a message/object/TLV decode or encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A documented protocol error. The caller must reply with a PCErr
    /// carrying this code; for the four unrecognized/unsupported object
    /// codes the decoder substitutes a placeholder instead of aborting.
    Documented(ErrorCode),
    /// Local failure with no assigned code point.
    Codec(CodecError),
}

impl ParseError {
    /// The documented code, if this is the documented tier.
    pub fn documented(&self) -> Option<ErrorCode> {
        match self {
            ParseError::Documented(code) => Some(*code),
            ParseError::Codec(_) => None,
        }
    }
}

impl From<ErrorCode> for ParseError {
    fn from(code: ErrorCode) -> Self {
        ParseError::Documented(code)
    }
}

impl From<CodecError> for ParseError {
    fn from(err: CodecError) -> Self {
        ParseError::Codec(err)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Documented(code) => write!(f, "documented error: {}", code),
            ParseError::Codec(err) => write!(f, "codec error: {}", err),
        }
    }
}

impl std::error::Error for ParseError {}

/// Transport-tier failures: the input could not be framed or an encoding
/// invariant was violated. No PCErr reply is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Declared length exceeds the remaining bytes.
    Truncated {
        /// Bytes the header declared.
        expected: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// A length field below the minimum for its header.
    BadLength(usize),
    /// Message header carried a version other than 1.
    BadVersion(u8),
    /// Value does not fit the wire field it is encoded into.
    FieldOverflow(&'static str),
    /// Duplicate handler registration for a key already taken.
    DuplicateRegistration(&'static str),
    /// No serializer registered for the value being encoded.
    NoSerializer(&'static str),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Truncated { expected, available } => {
                write!(f, "truncated input: need {} bytes, have {}", expected, available)
            }
            CodecError::BadLength(len) => write!(f, "invalid declared length {}", len),
            CodecError::BadVersion(v) => write!(f, "unsupported PCEP version {}", v),
            CodecError::FieldOverflow(field) => write!(f, "value too large for field {}", field),
            CodecError::DuplicateRegistration(what) => {
                write!(f, "duplicate registration: {}", what)
            }
            CodecError::NoSerializer(what) => write!(f, "no serializer registered for {}", what),
        }
    }
}

impl std::error::Error for CodecError {}

/// Why a handshake did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The unified FailTimer fired before the exchange completed.
    Timeout(ErrorCode),
    /// The peer sent something the current state cannot accept.
    ProtocolError(ErrorCode),
    /// The peer reported an error of its own.
    PeerError {
        /// Raw error-type from the peer's ERROR object.
        error_type: u8,
        /// Raw error-value from the peer's ERROR object.
        error_value: u8,
    },
    /// A second connection from the same peer lost the address tiebreak.
    DuplicateConnection,
    /// The channel went away mid-handshake.
    ChannelClosed,
}

impl std::fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationError::Timeout(code) => write!(f, "negotiation timed out: {}", code),
            NegotiationError::ProtocolError(code) => write!(f, "negotiation failed: {}", code),
            NegotiationError::PeerError { error_type, error_value } => {
                write!(f, "peer reported error type {} value {}", error_type, error_value)
            }
            NegotiationError::DuplicateConnection => {
                write!(f, "duplicate connection lost address tiebreak")
            }
            NegotiationError::ChannelClosed => write!(f, "channel closed during negotiation"),
        }
    }
}

impl std::error::Error for NegotiationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_extraction() {
        let err = ParseError::from(ErrorCode::CapabilityNotSupported);
        assert_eq!(err.documented(), Some(ErrorCode::CapabilityNotSupported));

        let err = ParseError::from(CodecError::BadVersion(2));
        assert_eq!(err.documented(), None);
    }

    #[test]
    fn test_display_formats() {
        let err = ParseError::Codec(CodecError::Truncated { expected: 12, available: 4 });
        assert!(err.to_string().contains("need 12 bytes"));

        let err = NegotiationError::PeerError { error_type: 1, error_value: 5 };
        assert!(err.to_string().contains("type 1 value 5"));
    }
}
