// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Protocol-assigned code points: message types, object classes, documented
//! error codes and Close reasons.
//!
//! Sources: RFC 5440 Section 9 (IANA considerations) and RFC 8253 (PCEPS,
//! StartTLS message and error type 25).

/// PCEP protocol version carried in every message header.
pub const PCEP_VERSION: u8 = 1;

// =======================================================================
// Message types (RFC 5440 Sec.9.2, RFC 8253 Sec.3.1)
// =======================================================================

/// Open message type.
pub const MSG_OPEN: u8 = 1;
/// Keepalive message type.
pub const MSG_KEEPALIVE: u8 = 2;
/// Path Computation Request message type.
pub const MSG_PCREQ: u8 = 3;
/// Path Computation Reply message type.
pub const MSG_PCREP: u8 = 4;
/// Notification message type.
pub const MSG_PCNTF: u8 = 5;
/// Error (PCErr) message type.
pub const MSG_PCERR: u8 = 6;
/// Close message type.
pub const MSG_CLOSE: u8 = 7;
/// StartTLS message type (RFC 8253).
pub const MSG_STARTTLS: u8 = 13;

// =======================================================================
// Object classes/types used by the session layer (RFC 5440 Sec.9.4)
// =======================================================================

/// OPEN object class.
pub const CLASS_OPEN: u8 = 1;
/// OPEN object type.
pub const TYPE_OPEN: u8 = 1;
/// PCEP-ERROR object class.
pub const CLASS_ERROR: u8 = 13;
/// PCEP-ERROR object type.
pub const TYPE_ERROR: u8 = 1;
/// CLOSE object class.
pub const CLASS_CLOSE: u8 = 15;
/// CLOSE object type.
pub const TYPE_CLOSE: u8 = 1;

/// STATEFUL-PCE-CAPABILITY TLV type (RFC 8231 Sec.7.1.1).
pub const TLV_STATEFUL_CAPABILITY: u16 = 16;

// =======================================================================
// Documented errors (RFC 5440 Sec.7.15, RFC 8231, RFC 8253)
// =======================================================================

/// A documented PCEP error: an RFC-assigned `(error-type, error-value)` pair.
///
/// These are the codes a peer can be told about in a PCErr message. Local
/// failures that have no assigned code (I/O errors, framing garbage) are
/// *not* represented here; see [`crate::error::CodecError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// 1/1: Reception of an invalid Open message or a non Open message.
    NonOrInvalidOpenMsg,
    /// 1/2: No Open message received before the OpenWait timer expired.
    NoOpenBeforeExpOpenWait,
    /// 1/3: Unacceptable and non-negotiable session characteristics.
    NonAccNonNegSessionChar,
    /// 1/4: Unacceptable but negotiable session characteristics.
    NonAccNegSessionChar,
    /// 1/5: Second Open message received with still unacceptable characteristics.
    SecondOpenMsg,
    /// 1/6: PCErr received proposing unacceptable session characteristics.
    PcerrNonAccSessionChar,
    /// 1/7: No Keepalive or PCErr received before the KeepWait timer expired.
    NoMsgBeforeExpKeepWait,
    /// 2/0: Capability not supported (unrecognized message).
    CapabilityNotSupported,
    /// 3/1: Unrecognized object class.
    UnrecognizedObjClass,
    /// 3/2: Unrecognized object type.
    UnrecognizedObjType,
    /// 4/1: Not supported object class.
    NotSupportedObjClass,
    /// 4/2: Not supported object type.
    NotSupportedObjType,
    /// 6/1: RP object missing.
    RpMissing,
    /// 9/1: Attempt to establish a second PCEP session.
    Attempt2ndSession,
    /// 10/1: Reception of a malformed object.
    MalformedObject,
    /// 25/2: Reception of any message apart from StartTLS, Open or PCErr
    /// while waiting for StartTLS (RFC 8253).
    NonStartTlsMsgRcvd,
    /// 25/3: Failure, connection without TLS is not possible (RFC 8253).
    NotPossibleWithoutTls,
    /// 25/5: No StartTLS received before the StartTLSWait timer expired
    /// (RFC 8253).
    StartTlsTimerExp,
}

impl ErrorCode {
    /// The assigned `(error-type, error-value)` pair.
    pub fn type_value(self) -> (u8, u8) {
        match self {
            ErrorCode::NonOrInvalidOpenMsg => (1, 1),
            ErrorCode::NoOpenBeforeExpOpenWait => (1, 2),
            ErrorCode::NonAccNonNegSessionChar => (1, 3),
            ErrorCode::NonAccNegSessionChar => (1, 4),
            ErrorCode::SecondOpenMsg => (1, 5),
            ErrorCode::PcerrNonAccSessionChar => (1, 6),
            ErrorCode::NoMsgBeforeExpKeepWait => (1, 7),
            ErrorCode::CapabilityNotSupported => (2, 0),
            ErrorCode::UnrecognizedObjClass => (3, 1),
            ErrorCode::UnrecognizedObjType => (3, 2),
            ErrorCode::NotSupportedObjClass => (4, 1),
            ErrorCode::NotSupportedObjType => (4, 2),
            ErrorCode::RpMissing => (6, 1),
            ErrorCode::Attempt2ndSession => (9, 1),
            ErrorCode::MalformedObject => (10, 1),
            ErrorCode::NonStartTlsMsgRcvd => (25, 2),
            ErrorCode::NotPossibleWithoutTls => (25, 3),
            ErrorCode::StartTlsTimerExp => (25, 5),
        }
    }

    /// Reverse lookup from a wire `(error-type, error-value)` pair.
    pub fn from_type_value(error_type: u8, error_value: u8) -> Option<Self> {
        let code = match (error_type, error_value) {
            (1, 1) => ErrorCode::NonOrInvalidOpenMsg,
            (1, 2) => ErrorCode::NoOpenBeforeExpOpenWait,
            (1, 3) => ErrorCode::NonAccNonNegSessionChar,
            (1, 4) => ErrorCode::NonAccNegSessionChar,
            (1, 5) => ErrorCode::SecondOpenMsg,
            (1, 6) => ErrorCode::PcerrNonAccSessionChar,
            (1, 7) => ErrorCode::NoMsgBeforeExpKeepWait,
            (2, _) => ErrorCode::CapabilityNotSupported,
            (3, 1) => ErrorCode::UnrecognizedObjClass,
            (3, 2) => ErrorCode::UnrecognizedObjType,
            (4, 1) => ErrorCode::NotSupportedObjClass,
            (4, 2) => ErrorCode::NotSupportedObjType,
            (6, 1) => ErrorCode::RpMissing,
            (9, 1) => ErrorCode::Attempt2ndSession,
            (10, 1) => ErrorCode::MalformedObject,
            (25, 2) => ErrorCode::NonStartTlsMsgRcvd,
            (25, 3) => ErrorCode::NotPossibleWithoutTls,
            (25, 5) => ErrorCode::StartTlsTimerExp,
            _ => return None,
        };
        Some(code)
    }

    /// True for the four codes that are downgraded to an
    /// [`crate::object::Object::Unknown`] placeholder during decode instead
    /// of aborting the whole message.
    pub fn is_unrecognized_object(self) -> bool {
        matches!(
            self,
            ErrorCode::UnrecognizedObjClass
                | ErrorCode::UnrecognizedObjType
                | ErrorCode::NotSupportedObjClass
                | ErrorCode::NotSupportedObjType
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (t, v) = self.type_value();
        write!(f, "{:?} (type {}, value {})", self, t, v)
    }
}

// =======================================================================
// Close reasons (RFC 5440 Sec.7.17)
// =======================================================================

/// Reason carried in the CLOSE object when a session is torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    /// 1: No explanation provided.
    Unknown,
    /// 2: DeadTimer expired.
    ExpDeadTimer,
    /// 3: Reception of a malformed PCEP message.
    MalformedMsg,
    /// 4: Too many unknown requests/replies.
    TooManyUnknownReqRep,
    /// 5: Too many unrecognized messages.
    TooManyUnknownMsgs,
}

impl TerminationReason {
    /// Wire value for the CLOSE object's Reason field.
    pub fn wire_value(self) -> u8 {
        match self {
            TerminationReason::Unknown => 1,
            TerminationReason::ExpDeadTimer => 2,
            TerminationReason::MalformedMsg => 3,
            TerminationReason::TooManyUnknownReqRep => 4,
            TerminationReason::TooManyUnknownMsgs => 5,
        }
    }

    /// Reverse lookup; unassigned values map to `Unknown`.
    pub fn from_wire(value: u8) -> Self {
        match value {
            2 => TerminationReason::ExpDeadTimer,
            3 => TerminationReason::MalformedMsg,
            4 => TerminationReason::TooManyUnknownReqRep,
            5 => TerminationReason::TooManyUnknownMsgs,
            _ => TerminationReason::Unknown,
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
