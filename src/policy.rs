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

//! The consensus-level dispatcher (§4.5): detects which algorithm a header claims, routes it to
//! the matching verifier, and enforces the dual-mining ratio rule across RandomX and MobileX.

use std::collections::VecDeque;

use crate::auxpow::{self, AuxPowRecord};
use crate::error::ConsensusError;
use crate::header::BlockHeader;
use crate::mobilex::MobileXContext;
use crate::params::ChainParams;
use crate::sunset::SunsetController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    RandomX,
    MobileX,
    AuxPoW,
}

/// `aux_data.is_some()` beats `thermal_proof`, which beats the plain-RandomX default.
pub fn detect_algorithm(header: &BlockHeader, aux_data: Option<&AuxPowRecord>) -> Algorithm {
    if aux_data.is_some() {
        Algorithm::AuxPoW
    } else if header.claims_mobilex() {
        Algorithm::MobileX
    } else {
        Algorithm::RandomX
    }
}

/// A fixed-capacity ring of the last `ratio_window` RandomX/MobileX algorithm tags. AuxPoW blocks
/// are excluded: the dual-mining ratio rule governs the RandomX/MobileX split, not AuxPoW, which
/// has its own independent sunset gate (§4.5).
pub struct RatioTracker {
    capacity: usize,
    tags: VecDeque<Algorithm>,
}

impl RatioTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tags: VecDeque::with_capacity(capacity),
        }
    }

    /// Records an accepted block's algorithm. AuxPoW tags are accepted here for bookkeeping
    /// symmetry but never counted by [`RatioTracker::would_violate`].
    pub fn record(&mut self, algo: Algorithm) {
        if self.tags.len() == self.capacity {
            self.tags.pop_front();
        }
        self.tags.push_back(algo);
    }

    fn count(&self, algo: Algorithm) -> usize {
        self.tags.iter().filter(|&&a| a == algo).count()
    }

    /// `true` iff accepting one more block of `algo` would push its trailing-window share strictly
    /// above `max_ratio`. Matches the boundary scenario's literal `>` comparison: at
    /// `ratio_window = 100, max_ratio = 0.7`, 71 consecutive same-algorithm blocks violate, 70 do
    /// not.
    pub fn would_violate(&self, algo: Algorithm, max_ratio: f64) -> bool {
        if matches!(algo, Algorithm::AuxPoW) {
            return false;
        }
        let prospective_count = self.count(algo) as f64 + 1.0;
        let window = self.capacity as f64;
        prospective_count > window * max_ratio
    }
}

/// Bundles everything `validate_header` needs that is not plain data: the MobileX pipeline
/// context and the dual-mining ratio tracker. `SunsetController` is owned by the caller, since its
/// state must be advanced exactly once per connected block regardless of validation outcome.
pub struct MiningPolicy {
    mobilex: MobileXContext,
    ratio: RatioTracker,
}

impl MiningPolicy {
    pub fn new(params: &ChainParams) -> Self {
        Self {
            mobilex: MobileXContext::default(),
            ratio: RatioTracker::new(params.ratio_window),
        }
    }

    /// Validates `header` at `height`, optionally accompanied by an AuxPoW side-record. On
    /// success, records the detected algorithm in the ratio tracker.
    pub fn validate_header(
        &mut self,
        header: &BlockHeader,
        height: u64,
        aux_data: Option<&AuxPowRecord>,
        params: &ChainParams,
        sunset: &SunsetController,
    ) -> Result<Algorithm, ConsensusError> {
        let algo = detect_algorithm(header, aux_data);

        match algo {
            Algorithm::MobileX if !params.mobilex_enabled || height < params.mobilex_activation_height => {
                return Err(ConsensusError::AlgorithmDisabled(algo));
            }
            Algorithm::AuxPoW if !params.auxpow_enabled => {
                return Err(ConsensusError::AlgorithmDisabled(algo));
            }
            _ => {}
        }

        if params.mobilex_enabled && matches!(algo, Algorithm::RandomX | Algorithm::MobileX) {
            let window = params.ratio_window as f64;
            let proposed_ratio = self.ratio.would_violate(algo, params.max_ratio);
            if proposed_ratio {
                return Err(ConsensusError::AlgorithmRatioViolation {
                    algo,
                    max_ratio: params.max_ratio * 100.0,
                    window: window as usize,
                });
            }
        }

        match algo {
            Algorithm::RandomX => {
                self.mobilex
                    .verify_randomx(header, params, height)
                    .map_err(|_| ConsensusError::PoWAboveTarget)?;
            }
            Algorithm::MobileX => {
                self.mobilex.verify(header, params, height)?;
            }
            Algorithm::AuxPoW => {
                let record = aux_data.ok_or(ConsensusError::AuxPow(crate::error::AuxPowError::CommitmentAbsent))?;
                auxpow::validate(record, header.hash(), header.bits, params, sunset.is_sunset_active())?;
            }
        }

        self.ratio.record(algo);
        Ok(algo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_thermal(thermal_proof: u64) -> BlockHeader {
        let mut h = BlockHeader::new(1, [0u8; 32], [0u8; 32], 1_700_000_000, 0x1e0f_fff0);
        h.nonce = 12345;
        h.thermal_proof = thermal_proof;
        h
    }

    #[test]
    fn mobilex_detect_when_thermal_proof_nonzero() {
        let header = header_with_thermal(0x0000_1234_5678_9abc);
        assert_eq!(detect_algorithm(&header, None), Algorithm::MobileX);
    }

    #[test]
    fn zero_thermal_falls_back_to_randomx() {
        let header = header_with_thermal(0);
        assert_eq!(detect_algorithm(&header, None), Algorithm::RandomX);
    }

    #[test]
    fn aux_data_always_wins_detection() {
        let header = header_with_thermal(0x42);
        let record = AuxPowRecord {
            parent_coinbase: vec![],
            merkle_branch: vec![],
            parent_block_tx_count: 0,
            parent_header: crate::auxpow::ParentHeader {
                version: 1,
                prev_block: [0; 32],
                merkle_root: [0; 32],
                timestamp: 1_300_000_000,
                bits: 0x1d00_ffff,
                nonce: 0,
            },
            chain_index: 0,
            shell_block_hash: [0; 32],
        };
        assert_eq!(detect_algorithm(&header, Some(&record)), Algorithm::AuxPoW);
    }

    #[test]
    fn ratio_tracker_rejects_71_of_100_but_accepts_70() {
        let mut tracker = RatioTracker::new(100);
        for _ in 0..69 {
            tracker.record(Algorithm::MobileX);
        }
        // 70th MobileX block: prospective count 70, 70 > 100*0.7 is false.
        assert!(!tracker.would_violate(Algorithm::MobileX, 0.7));
        tracker.record(Algorithm::MobileX);
        // 71st: prospective count 71, 71 > 70 is true.
        assert!(tracker.would_violate(Algorithm::MobileX, 0.7));
    }

    #[test]
    fn auxpow_blocks_never_violate_the_ratio() {
        let mut tracker = RatioTracker::new(5);
        for _ in 0..10 {
            tracker.record(Algorithm::AuxPoW);
        }
        assert!(!tracker.would_violate(Algorithm::AuxPoW, 0.7));
    }
}
