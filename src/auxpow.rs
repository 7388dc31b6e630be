// Copyright 2025. The Shell Reserve Developers
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the
// following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Merge-mining bridge to a SHA-256 parent chain: commitment extraction, Merkle-branch folding,
//! and the five-point acceptance algorithm of a merge-mined block.

use serde::{Deserialize, Serialize};

use crate::difficulty::meets_target;
use crate::error::AuxPowError;
use crate::header::hash256;
use crate::params::ChainParams;

/// A parent chain's 80-byte classic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentHeader {
    pub version: i32,
    pub prev_block: [u8; 32],
    pub merkle_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

pub const PARENT_HEADER_SIZE: usize = 80;

/// Unix timestamp of the Bitcoin genesis block; parent headers older than this cannot be genuine.
const GENESIS_EPOCH_GUARD: u32 = 1_231_006_505;

impl ParentHeader {
    pub fn to_bytes(&self) -> [u8; PARENT_HEADER_SIZE] {
        let mut buf = [0u8; PARENT_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..36].copy_from_slice(&self.prev_block);
        buf[36..68].copy_from_slice(&self.merkle_root);
        buf[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[72..76].copy_from_slice(&self.bits.to_le_bytes());
        buf[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != PARENT_HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: i32::from_le_bytes(buf[0..4].try_into().ok()?),
            prev_block: buf[4..36].try_into().ok()?,
            merkle_root: buf[36..68].try_into().ok()?,
            timestamp: u32::from_le_bytes(buf[68..72].try_into().ok()?),
            bits: u32::from_le_bytes(buf[72..76].try_into().ok()?),
            nonce: u32::from_le_bytes(buf[76..80].try_into().ok()?),
        })
    }

    /// Double SHA-256 of the serialized parent header, interpreted as the parent chain's PoW hash.
    pub fn hash(&self) -> [u8; 32] {
        hash256(&self.to_bytes())
    }
}

/// The merge-mining side-record attached to a Shell block claiming AuxPoW.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxPowRecord {
    pub parent_coinbase: Vec<u8>,
    pub merkle_branch: Vec<[u8; 32]>,
    pub parent_block_tx_count: u32,
    pub parent_header: ParentHeader,
    pub chain_index: u32,
    pub shell_block_hash: [u8; 32],
}

/// Reads a little-endian `u32` at `*cursor`, advancing it by 4 bytes. The sidecar's length
/// prefixes are `u32` LE per `DESIGN.md`'s resolution of §6's unspecified prefix width.
fn read_u32(buf: &[u8], cursor: &mut usize) -> Result<u32, AuxPowError> {
    let end = cursor.checked_add(4).ok_or(AuxPowError::SidecarTruncated {
        expected: usize::MAX,
        actual: buf.len(),
    })?;
    if end > buf.len() {
        return Err(AuxPowError::SidecarTruncated { expected: end, actual: buf.len() });
    }
    let value = u32::from_le_bytes(buf[*cursor..end].try_into().expect("checked 4 bytes above"));
    *cursor = end;
    Ok(value)
}

/// Reads `n` bytes at `*cursor`, advancing it by `n`.
fn read_slice<'a>(buf: &'a [u8], cursor: &mut usize, n: usize) -> Result<&'a [u8], AuxPowError> {
    let end = cursor.checked_add(n).ok_or(AuxPowError::SidecarTruncated {
        expected: usize::MAX,
        actual: buf.len(),
    })?;
    if end > buf.len() {
        return Err(AuxPowError::SidecarTruncated { expected: end, actual: buf.len() });
    }
    let slice = &buf[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn read_hash(buf: &[u8], cursor: &mut usize) -> Result<[u8; 32], AuxPowError> {
    let slice = read_slice(buf, cursor, 32)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(slice);
    Ok(out)
}

impl AuxPowRecord {
    /// Wire format per §6: `u32`-LE-length-prefixed `parent_coinbase`, a `u32`-LE
    /// `merkle_branch` sibling count followed by that many 32-byte hashes,
    /// `parent_block_tx_count`, the 80-byte `parent_header`, `chain_index`, and
    /// `shell_block_hash`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            4 + self.parent_coinbase.len() + 4 + self.merkle_branch.len() * 32 + 4 + PARENT_HEADER_SIZE + 4 + 32,
        );
        buf.extend_from_slice(&(self.parent_coinbase.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.parent_coinbase);
        buf.extend_from_slice(&(self.merkle_branch.len() as u32).to_le_bytes());
        for sibling in &self.merkle_branch {
            buf.extend_from_slice(sibling);
        }
        buf.extend_from_slice(&self.parent_block_tx_count.to_le_bytes());
        buf.extend_from_slice(&self.parent_header.to_bytes());
        buf.extend_from_slice(&self.chain_index.to_le_bytes());
        buf.extend_from_slice(&self.shell_block_hash);
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, AuxPowError> {
        let mut cursor = 0usize;

        let coinbase_len = read_u32(buf, &mut cursor)? as usize;
        let parent_coinbase = read_slice(buf, &mut cursor, coinbase_len)?.to_vec();

        let branch_len = read_u32(buf, &mut cursor)? as usize;
        let mut merkle_branch = Vec::with_capacity(branch_len);
        for _ in 0..branch_len {
            merkle_branch.push(read_hash(buf, &mut cursor)?);
        }

        let parent_block_tx_count = read_u32(buf, &mut cursor)?;

        let parent_header_bytes = read_slice(buf, &mut cursor, PARENT_HEADER_SIZE)?;
        let parent_header = ParentHeader::from_bytes(parent_header_bytes).ok_or(AuxPowError::SidecarTruncated {
            expected: PARENT_HEADER_SIZE,
            actual: parent_header_bytes.len(),
        })?;

        let chain_index = read_u32(buf, &mut cursor)?;
        let shell_block_hash = read_hash(buf, &mut cursor)?;

        Ok(Self {
            parent_coinbase,
            merkle_branch,
            parent_block_tx_count,
            parent_header,
            chain_index,
            shell_block_hash,
        })
    }
}

/// Builds the literal commitment bytes (`TAG ‖ shell_block_hash`) this crate's test fixtures embed
/// inside a parent coinbase; the round-trip partner of [`extract_commitment`].
pub fn create_commitment(tag: &[u8; 6], shell_block_hash: [u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tag.len() + 32);
    out.extend_from_slice(tag);
    out.extend_from_slice(&shell_block_hash);
    out
}

/// Scans `coinbase` for the first occurrence of `tag` and returns the 32 bytes immediately
/// following it. The first occurrence defines the binding: if it is found but truncated (fewer
/// than 32 bytes follow), extraction fails outright rather than searching for a later occurrence.
pub fn extract_commitment(coinbase: &[u8], tag: &[u8; 6]) -> Option<[u8; 32]> {
    let tag_len = tag.len();
    if coinbase.len() < tag_len {
        return None;
    }
    for i in 0..=coinbase.len() - tag_len {
        if &coinbase[i..i + tag_len] == tag {
            let start = i + tag_len;
            return if start + 32 <= coinbase.len() {
                let mut out = [0u8; 32];
                out.copy_from_slice(&coinbase[start..start + 32]);
                Some(out)
            } else {
                None
            };
        }
    }
    None
}

/// Folds `leaf` up to a Merkle root with `branch`, using bit `i` of `index` to choose whether
/// `leaf` (at level `i`) is the left or right child: `0` means `leaf` is on the left.
pub fn fold_merkle_branch(leaf: [u8; 32], branch: &[[u8; 32]], index: u32) -> [u8; 32] {
    let mut acc = leaf;
    for (level, sibling) in branch.iter().enumerate() {
        let bit = (index >> level) & 1;
        acc = if bit == 0 {
            concat_hash(&acc, sibling)
        } else {
            concat_hash(sibling, &acc)
        };
    }
    acc
}

fn concat_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[0..32].copy_from_slice(left);
    buf[32..64].copy_from_slice(right);
    hash256(&buf)
}

/// Runs the five-point acceptance algorithm. `sunset_active` is supplied by the caller (the
/// Sunset Controller), since this module has no knowledge of chain history.
pub fn validate(
    record: &AuxPowRecord,
    shell_block_hash: [u8; 32],
    shell_bits: u32,
    params: &ChainParams,
    sunset_active: bool,
) -> Result<(), AuxPowError> {
    if !params.auxpow_enabled || sunset_active {
        return Err(AuxPowError::Disabled);
    }

    let commitment =
        extract_commitment(&record.parent_coinbase, &params.auxpow_commitment_tag).ok_or(AuxPowError::CommitmentAbsent)?;
    if commitment != shell_block_hash {
        return Err(AuxPowError::ShellCommitmentHashMismatch);
    }

    let coinbase_hash = hash256(&record.parent_coinbase);
    let folded = fold_merkle_branch(coinbase_hash, &record.merkle_branch, record.parent_block_tx_count);
    if folded != record.parent_header.merkle_root {
        return Err(AuxPowError::MerkleFoldMismatch);
    }

    if record.chain_index != params.auxpow_chain_id {
        return Err(AuxPowError::InvalidChainIndex(record.chain_index));
    }
    if record.parent_header.version < 1 {
        return Err(AuxPowError::ParentVersionInvalid(record.parent_header.version));
    }
    if record.parent_header.timestamp <= GENESIS_EPOCH_GUARD {
        return Err(AuxPowError::ParentTimestampTooOld);
    }

    if !meets_target(&record.parent_header.hash(), shell_bits) {
        return Err(AuxPowError::InsufficientWork);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: [u8; 6] = *b"XSLTAG";

    fn sample_parent(bits: u32) -> ParentHeader {
        ParentHeader {
            version: 1,
            prev_block: [0x01; 32],
            merkle_root: [0x02; 32],
            timestamp: GENESIS_EPOCH_GUARD + 1000,
            bits,
            nonce: 0,
        }
    }

    fn record_with_valid_commitment(shell_hash: [u8; 32], parent: ParentHeader) -> AuxPowRecord {
        let coinbase = create_commitment(&TAG, shell_hash);
        let coinbase_hash = hash256(&coinbase);
        AuxPowRecord {
            parent_coinbase: coinbase,
            merkle_branch: vec![],
            parent_block_tx_count: 0,
            parent_header: ParentHeader {
                merkle_root: coinbase_hash,
                ..parent
            },
            chain_index: 0,
            shell_block_hash: shell_hash,
        }
    }

    #[test]
    fn extract_commitment_round_trips_through_create_commitment() {
        let hash = [0x42; 32];
        let commitment = create_commitment(&TAG, hash);
        assert_eq!(extract_commitment(&commitment, &TAG), Some(hash));
    }

    #[test]
    fn extract_commitment_uses_leftmost_occurrence() {
        let first = [0x11; 32];
        let second = [0x22; 32];
        let mut coinbase = create_commitment(&TAG, first);
        coinbase.extend_from_slice(&create_commitment(&TAG, second));
        assert_eq!(extract_commitment(&coinbase, &TAG), Some(first));
    }

    #[test]
    fn truncated_tag_occurrence_fails_extraction() {
        let mut coinbase = TAG.to_vec();
        coinbase.extend_from_slice(&[0u8; 10]);
        assert_eq!(extract_commitment(&coinbase, &TAG), None);
    }

    #[test]
    fn merkle_fold_single_sibling_matches_manual_computation() {
        let leaf = [0x01; 32];
        let sibling = [0x02; 32];
        let left_child = fold_merkle_branch(leaf, &[sibling], 0);
        assert_eq!(left_child, concat_hash(&leaf, &sibling));
        let right_child = fold_merkle_branch(leaf, &[sibling], 1);
        assert_eq!(right_child, concat_hash(&sibling, &leaf));
    }

    #[test]
    fn commitment_mismatch_is_rejected() {
        let params = ChainParams::default();
        let parent = sample_parent(0x1d00_ffff);
        let different_hash = hash256(b"different");
        let coinbase = create_commitment(&TAG, different_hash);
        let record = AuxPowRecord {
            parent_coinbase: coinbase,
            merkle_branch: vec![],
            parent_block_tx_count: 0,
            parent_header: parent,
            chain_index: 0,
            shell_block_hash: [0x99; 32],
        };
        let err = validate(&record, [0x99; 32], parent.bits, &params, false).unwrap_err();
        assert_eq!(err, AuxPowError::ShellCommitmentHashMismatch);
    }

    #[test]
    fn insufficient_parent_work_is_rejected() {
        let params = ChainParams::default();
        let shell_hash = [0x33; 32];
        // Parent bits far harder than required, and an all-0xff fake hash guarantees failure by
        // construction below without needing to mine a real parent header.
        let parent = sample_parent(0x1d7f_ffff);
        let mut record = record_with_valid_commitment(shell_hash, parent);
        record.parent_header.nonce = 0xffff_ffff;
        // Shell's own target is very easy, but we force failure by using a maximally hard parent
        // bits value for the "shell_bits" argument, so the parent hash cannot meet it.
        let err = validate(&record, shell_hash, 0x0100_0001, &params, false).unwrap_err();
        assert_eq!(err, AuxPowError::InsufficientWork);
    }

    #[test]
    fn disabled_gate_rejects_before_any_other_check() {
        let mut params = ChainParams::default();
        params.auxpow_enabled = false;
        let shell_hash = [0x44; 32];
        let record = record_with_valid_commitment(shell_hash, sample_parent(0x1d00_ffff));
        let err = validate(&record, shell_hash, 0x1d00_ffff, &params, false).unwrap_err();
        assert_eq!(err, AuxPowError::Disabled);
    }

    #[test]
    fn sunset_active_disables_auxpow_even_when_feature_flag_is_on() {
        let params = ChainParams::default();
        let shell_hash = [0x55; 32];
        let record = record_with_valid_commitment(shell_hash, sample_parent(0x1d00_ffff));
        let err = validate(&record, shell_hash, 0x1d00_ffff, &params, true).unwrap_err();
        assert_eq!(err, AuxPowError::Disabled);
    }

    #[test]
    fn stale_parent_timestamp_is_rejected() {
        let params = ChainParams::default();
        let shell_hash = [0x66; 32];
        let mut parent = sample_parent(0x1d00_ffff);
        parent.timestamp = 100;
        let record = record_with_valid_commitment(shell_hash, parent);
        let err = validate(&record, shell_hash, parent.bits, &params, false).unwrap_err();
        assert_eq!(err, AuxPowError::ParentTimestampTooOld);
    }

    #[test]
    fn header_round_trip_is_byte_identical() {
        let parent = sample_parent(0x1d00_ffff);
        let bytes = parent.to_bytes();
        let back = ParentHeader::from_bytes(&bytes).unwrap();
        assert_eq!(back, parent);
        assert_eq!(back.to_bytes(), bytes);
    }

    #[test]
    fn auxpow_record_round_trip_is_byte_identical() {
        let shell_hash = [0x77; 32];
        let parent = sample_parent(0x1d00_ffff);
        let mut record = record_with_valid_commitment(shell_hash, parent);
        record.merkle_branch = vec![[0x01; 32], [0x02; 32], [0x03; 32]];
        record.parent_block_tx_count = 5;

        let bytes = record.to_bytes();
        let back = AuxPowRecord::from_bytes(&bytes).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.to_bytes(), bytes);
    }

    #[test]
    fn auxpow_record_from_bytes_rejects_truncated_buffer() {
        let record = record_with_valid_commitment([0x88; 32], sample_parent(0x1d00_ffff));
        let bytes = record.to_bytes();
        let err = AuxPowRecord::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, AuxPowError::SidecarTruncated { .. }));
    }
}
