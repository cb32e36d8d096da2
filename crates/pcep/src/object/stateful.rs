// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! STATEFUL-PCE-CAPABILITY TLV codec (RFC 8231 Sec.7.1.1, sync flags from
//! RFC 8232, instantiation flag from RFC 8281).
//!
//! The value is one 32-bit flags word; bit positions counted from the MSB:
//!
//! ```text
//!  bit 26: F - TRIGGERED-INITIAL-SYNC
//!  bit 27: D - DELTA-LSP-SYNC-CAPABLE
//!  bit 28: T - TRIGGERED-RESYNC
//!  bit 29: I - LSP-INSTANTIATION-CAPABILITY
//!  bit 30: S - INCLUDE-DB-VERSION
//!  bit 31: U - LSP-UPDATE-CAPABILITY
//! ```

use crate::codes::TLV_STATEFUL_CAPABILITY;
use crate::error::{CodecError, ParseResult};
use crate::object::{Tlv, TlvParser, TlvSerializer};
use crate::wire;

const U_FLAG: u32 = 1;
const S_FLAG: u32 = 1 << 1;
const I_FLAG: u32 = 1 << 2;
const T_FLAG: u32 = 1 << 3;
const D_FLAG: u32 = 1 << 4;
const F_FLAG: u32 = 1 << 5;

/// STATEFUL-PCE-CAPABILITY TLV.
///
/// Invariant: `include_db_version` is true whenever `triggered_resync` or
/// `delta_lsp_sync` is set - state synchronization avoidance requires
/// database versioning, so the constructor forces the implication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatefulCapability {
    /// U: the sender can handle PCUpd messages.
    pub updates: bool,
    /// S: LSP-DB-VERSION TLVs will be included.
    pub include_db_version: bool,
    /// I: the sender supports PCInitiate.
    pub instantiation: bool,
    /// T: the sender can trigger re-synchronization.
    pub triggered_resync: bool,
    /// D: the sender can do incremental (delta) state sync.
    pub delta_lsp_sync: bool,
    /// F: the sender can trigger the initial sync.
    pub triggered_initial_sync: bool,
}

impl StatefulCapability {
    /// Build a capability set. `include_db_version` is forced on when
    /// `triggered_resync` or `delta_lsp_sync` is requested.
    pub fn new(
        updates: bool,
        include_db_version: bool,
        instantiation: bool,
        triggered_resync: bool,
        delta_lsp_sync: bool,
    ) -> Self {
        Self {
            updates,
            include_db_version: include_db_version || triggered_resync || delta_lsp_sync,
            instantiation,
            triggered_resync,
            delta_lsp_sync,
            triggered_initial_sync: false,
        }
    }

    /// Same capability set with the F flag raised. Forces
    /// `include_db_version` for the same reason as the sync flags.
    pub fn with_triggered_initial_sync(mut self) -> Self {
        self.triggered_initial_sync = true;
        self.include_db_version = true;
        self
    }

    fn to_flags(self) -> u32 {
        let mut flags = 0;
        if self.updates {
            flags |= U_FLAG;
        }
        if self.include_db_version {
            flags |= S_FLAG;
        }
        if self.instantiation {
            flags |= I_FLAG;
        }
        if self.triggered_resync {
            flags |= T_FLAG;
        }
        if self.delta_lsp_sync {
            flags |= D_FLAG;
        }
        if self.triggered_initial_sync {
            flags |= F_FLAG;
        }
        flags
    }

    fn from_flags(flags: u32) -> Self {
        Self {
            updates: flags & U_FLAG != 0,
            include_db_version: flags & S_FLAG != 0,
            instantiation: flags & I_FLAG != 0,
            triggered_resync: flags & T_FLAG != 0,
            delta_lsp_sync: flags & D_FLAG != 0,
            triggered_initial_sync: flags & F_FLAG != 0,
        }
    }
}

/// Parser/serializer pair for the stateful capability TLV.
pub struct StatefulCapabilityCodec;

impl TlvParser for StatefulCapabilityCodec {
    fn parse(&self, value: &[u8]) -> ParseResult<Tlv> {
        if value.len() < 4 {
            return Err(CodecError::Truncated { expected: 4, available: value.len() }.into());
        }
        let flags = u32::from_be_bytes([value[0], value[1], value[2], value[3]]);
        Ok(Tlv::StatefulCapability(StatefulCapability::from_flags(flags)))
    }
}

impl TlvSerializer for StatefulCapabilityCodec {
    fn serialize(&self, tlv: &Tlv, out: &mut Vec<u8>) -> ParseResult<()> {
        let cap = match tlv {
            Tlv::StatefulCapability(cap) => cap,
            Tlv::Raw(_) => {
                return Err(CodecError::NoSerializer("raw TLV in stateful codec").into())
            }
        };
        wire::encode_tlv(TLV_STATEFUL_CAPABILITY, &cap.to_flags().to_be_bytes(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let cap = StatefulCapability::new(true, false, true, false, false);
        let mut out = Vec::new();
        StatefulCapabilityCodec
            .serialize(&Tlv::StatefulCapability(cap), &mut out)
            .unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(&out[..4], &[0x00, 0x10, 0x00, 0x04]);

        let parsed = StatefulCapabilityCodec.parse(&out[4..8]).unwrap();
        assert_eq!(parsed, Tlv::StatefulCapability(cap));
    }

    #[test]
    fn test_db_version_implication() {
        // Requesting triggered resync or delta sync implies db versioning
        let cap = StatefulCapability::new(true, false, false, true, false);
        assert!(cap.include_db_version);

        let cap = StatefulCapability::new(true, false, false, false, true);
        assert!(cap.include_db_version);

        let cap = StatefulCapability::new(true, false, false, false, false);
        assert!(!cap.include_db_version);

        let cap = cap.with_triggered_initial_sync();
        assert!(cap.include_db_version);
    }

    #[test]
    fn test_flag_bits() {
        let cap = StatefulCapability::new(true, true, false, false, false);
        let mut out = Vec::new();
        StatefulCapabilityCodec
            .serialize(&Tlv::StatefulCapability(cap), &mut out)
            .unwrap();
        // U and S are the two lowest bits of the 32-bit word
        assert_eq!(out[7], 0b0000_0011);
    }

    #[test]
    fn test_short_value() {
        assert!(StatefulCapabilityCodec.parse(&[0, 0]).is_err());
    }
}
