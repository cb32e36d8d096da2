// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Incremental framing of the PCEP byte stream.
//!
//! TCP delivers bytes, not messages. PCEP's common header carries the
//! total message length, so framing is: accumulate until four bytes are
//! available, read `Message-Length` from them, accumulate until that many
//! bytes are available, hand the complete frame up.
//!
//! ```text
//! +--------+--------+----------------+------------------------+
//! | Ver/Fl |  Type  |  Length (2B BE)|  Body (Length-4 bytes) |
//! +--------+--------+----------------+------------------------+
//! ```
//!
//! The framer validates only the length field; version and type checks
//! belong to the message codec. `Message-Length` is 16 bits, so a frame
//! can never exceed 65535 bytes and a hostile length cannot make the
//! buffer grow without bound.

use crate::error::CodecError;
use crate::wire::MESSAGE_HEADER_SIZE;

/// Incremental PCEP frame accumulator.
#[derive(Debug, Default)]
pub struct MessageFramer {
    buffer: Vec<u8>,
    frames_decoded: u64,
    bytes_decoded: u64,
}

impl MessageFramer {
    /// Empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the stream.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Take the next complete frame, if one is buffered.
    ///
    /// Returns `Err` on an impossible declared length; the connection must
    /// be dropped then, since the stream can no longer be delimited.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        if self.buffer.len() < MESSAGE_HEADER_SIZE {
            return Ok(None);
        }
        let declared = usize::from(u16::from_be_bytes([self.buffer[2], self.buffer[3]]));
        if declared < MESSAGE_HEADER_SIZE {
            return Err(CodecError::BadLength(declared));
        }
        if self.buffer.len() < declared {
            return Ok(None);
        }
        let rest = self.buffer.split_off(declared);
        let frame = std::mem::replace(&mut self.buffer, rest);
        self.frames_decoded += 1;
        self.bytes_decoded += frame.len() as u64;
        Ok(Some(frame))
    }

    /// Frames produced so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Bytes handed up in complete frames so far.
    pub fn bytes_decoded(&self) -> u64 {
        self.bytes_decoded
    }

    /// Bytes buffered awaiting a complete frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEEPALIVE: [u8; 4] = [0x20, 0x02, 0x00, 0x04];

    #[test]
    fn test_whole_frame() {
        let mut framer = MessageFramer::new();
        framer.push_bytes(&KEEPALIVE);
        assert_eq!(framer.next_frame().unwrap(), Some(KEEPALIVE.to_vec()));
        assert_eq!(framer.next_frame().unwrap(), None);
        assert_eq!(framer.frames_decoded(), 1);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut framer = MessageFramer::new();
        for &byte in &KEEPALIVE[..3] {
            framer.push_bytes(&[byte]);
            assert_eq!(framer.next_frame().unwrap(), None);
        }
        framer.push_bytes(&KEEPALIVE[3..]);
        assert_eq!(framer.next_frame().unwrap(), Some(KEEPALIVE.to_vec()));
    }

    #[test]
    fn test_two_frames_in_one_read() {
        let mut framer = MessageFramer::new();
        let mut bytes = KEEPALIVE.to_vec();
        // A Close frame directly behind the Keepalive
        let close = [0x20, 0x07, 0x00, 0x0C, 0x0F, 0x10, 0x00, 0x08, 0, 0, 0, 2];
        bytes.extend_from_slice(&close);
        framer.push_bytes(&bytes);

        assert_eq!(framer.next_frame().unwrap(), Some(KEEPALIVE.to_vec()));
        assert_eq!(framer.next_frame().unwrap(), Some(close.to_vec()));
        assert_eq!(framer.next_frame().unwrap(), None);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_partial_body() {
        let mut framer = MessageFramer::new();
        // Declares 12 bytes, deliver 8
        framer.push_bytes(&[0x20, 0x07, 0x00, 0x0C, 0x0F, 0x10, 0x00, 0x08]);
        assert_eq!(framer.next_frame().unwrap(), None);
        assert_eq!(framer.pending(), 8);

        framer.push_bytes(&[0, 0, 0, 2]);
        assert!(framer.next_frame().unwrap().is_some());
    }

    #[test]
    fn test_undersized_length_is_fatal() {
        let mut framer = MessageFramer::new();
        framer.push_bytes(&[0x20, 0x02, 0x00, 0x03]);
        assert!(matches!(framer.next_frame(), Err(CodecError::BadLength(3))));
    }
}
