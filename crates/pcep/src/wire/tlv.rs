// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! TLV codec with 4-byte padding (RFC 5440 Sec.7.1).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             Type              |            Length             |
//! +-------------------------------+-------------------------------+
//! |                            Value                              |
//! +---------------------------------------------------------------+
//! ```
//!
//! Length counts the value only. On the wire each TLV occupies
//! `4 + length + pad` bytes where pad rounds the total up to a multiple of
//! four; padding is written as zero bytes and never counted in Length.

use crate::error::{CodecError, ParseResult};

/// Size of the TLV header in bytes.
pub const TLV_HEADER_SIZE: usize = 4;

/// A TLV as it appears on the wire, value not yet interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTlv {
    /// TLV type.
    pub tlv_type: u16,
    /// Value bytes, unpadded.
    pub value: Vec<u8>,
}

impl RawTlv {
    /// Bytes this TLV occupies on the wire, padding included.
    pub fn wire_length(&self) -> usize {
        padded_length(TLV_HEADER_SIZE + self.value.len())
    }
}

/// Round `len` up to the next multiple of four.
pub fn padded_length(len: usize) -> usize {
    (len + 3) & !3
}

/// Append one TLV, header plus zero padding, to `out`.
pub fn encode_tlv(tlv_type: u16, value: &[u8], out: &mut Vec<u8>) -> ParseResult<()> {
    if value.len() > u16::MAX as usize {
        return Err(CodecError::FieldOverflow("tlv length").into());
    }
    out.extend_from_slice(&tlv_type.to_be_bytes());
    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
    out.extend_from_slice(value);
    let pad = padded_length(TLV_HEADER_SIZE + value.len()) - TLV_HEADER_SIZE - value.len();
    out.extend_from_slice(&[0u8; 3][..pad]);
    Ok(())
}

/// Decode a run of TLVs from an object body.
///
/// Truncation (declared length past the end of the buffer, or a dangling
/// partial header) is an error. An unrecognized TLV type is not: callers
/// interpret the types, this loop only frames them.
pub fn decode_tlvs(buf: &[u8]) -> ParseResult<Vec<RawTlv>> {
    let mut tlvs = Vec::new();
    let mut rest = buf;
    while !rest.is_empty() {
        if rest.len() < TLV_HEADER_SIZE {
            return Err(CodecError::Truncated { expected: TLV_HEADER_SIZE, available: rest.len() }.into());
        }
        let tlv_type = u16::from_be_bytes([rest[0], rest[1]]);
        let length = u16::from_be_bytes([rest[2], rest[3]]) as usize;
        let occupied = padded_length(TLV_HEADER_SIZE + length);
        if rest.len() < TLV_HEADER_SIZE + length {
            return Err(CodecError::Truncated {
                expected: TLV_HEADER_SIZE + length,
                available: rest.len(),
            }
            .into());
        }
        tlvs.push(RawTlv {
            tlv_type,
            value: rest[TLV_HEADER_SIZE..TLV_HEADER_SIZE + length].to_vec(),
        });
        // Trailing padding of the final TLV may be absent on the wire.
        rest = &rest[occupied.min(rest.len())..];
    }
    Ok(tlvs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn test_padded_length() {
        assert_eq!(padded_length(4), 4);
        assert_eq!(padded_length(5), 8);
        assert_eq!(padded_length(6), 8);
        assert_eq!(padded_length(7), 8);
        assert_eq!(padded_length(8), 8);
        assert_eq!(padded_length(0), 0);
    }

    #[test]
    fn test_encode_alignment() {
        for value_len in 0..12 {
            let value: Vec<u8> = (0..value_len).map(|i| i as u8).collect();
            let mut out = Vec::new();
            encode_tlv(100, &value, &mut out).unwrap();
            assert_eq!(out.len() % 4, 0, "value_len={}", value_len);
        }
    }

    #[test]
    fn test_roundtrip_recovers_unpadded_length() {
        let mut out = Vec::new();
        encode_tlv(16, &[1, 2, 3, 4, 5], &mut out).unwrap();
        encode_tlv(7, &[], &mut out).unwrap();
        encode_tlv(65280, &[0xFF; 8], &mut out).unwrap();

        let tlvs = decode_tlvs(&out).unwrap();
        assert_eq!(tlvs.len(), 3);
        assert_eq!(tlvs[0], RawTlv { tlv_type: 16, value: vec![1, 2, 3, 4, 5] });
        assert_eq!(tlvs[1], RawTlv { tlv_type: 7, value: vec![] });
        assert_eq!(tlvs[2].value.len(), 8);
    }

    #[test]
    fn test_padding_is_zero() {
        let mut out = Vec::new();
        encode_tlv(1, &[0xAB], &mut out).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(&out[5..], &[0, 0, 0]);
    }

    #[test]
    fn test_truncated_value() {
        let mut out = Vec::new();
        encode_tlv(1, &[1, 2, 3, 4, 5, 6], &mut out).unwrap();
        out.truncate(8); // header + 4 of 6 value bytes
        assert!(matches!(
            decode_tlvs(&out),
            Err(ParseError::Codec(CodecError::Truncated { .. }))
        ));
    }

    #[test]
    fn test_dangling_header() {
        assert!(matches!(
            decode_tlvs(&[0, 1]),
            Err(ParseError::Codec(CodecError::Truncated { .. }))
        ));
    }

    #[test]
    fn test_missing_final_padding_tolerated() {
        // 4-byte header + 1 value byte, sender did not pad the last TLV
        let buf = [0x00, 0x01, 0x00, 0x01, 0xAB];
        let tlvs = decode_tlvs(&buf).unwrap();
        assert_eq!(tlvs.len(), 1);
        assert_eq!(tlvs[0].value, vec![0xAB]);
    }

    #[test]
    fn test_roundtrip_random() {
        for _ in 0..100 {
            let value: Vec<u8> = (0..fastrand::usize(0..64)).map(|_| fastrand::u8(..)).collect();
            let tlv_type = fastrand::u16(..);
            let mut out = Vec::new();
            encode_tlv(tlv_type, &value, &mut out).unwrap();
            let tlvs = decode_tlvs(&out).unwrap();
            assert_eq!(tlvs, vec![RawTlv { tlv_type, value }]);
        }
    }
}
