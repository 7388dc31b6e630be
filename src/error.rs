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

//! Consensus-fatal error taxonomy for the block-validation pipeline.

use crate::policy::Algorithm;

/// Errors produced while (de)serializing the 92-byte header wire format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("header buffer too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

/// Sub-kinds of a failed thermal-compliance check (`spec` §7 `ThermalProofInvalid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ThermalError {
    #[error("thermal proof is zero on a header that claims MobileX")]
    Zero,
    #[error("thermal proof {actual:#018x} outside expected range [{low:#018x}, {high:#018x}]")]
    OutOfRange { actual: u64, low: u64, high: u64 },
    #[error("thermal spot-check outlier: {sigma:.2} standard deviations from the monitoring window")]
    SpotCheckOutlier { sigma: f64 },
}

/// A failed MobileX pipeline check. Deliberately narrow per §4.2: `verify` returns one error only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MobileXError {
    #[error("hash does not meet target")]
    HashAboveTarget,
    #[error(transparent)]
    Thermal(#[from] ThermalError),
}

/// Sub-kinds of a malformed or insufficiently-worked AuxPoW record (`spec` §7 `AuxPoWMalformed` /
/// `AuxPoWInsufficientWork`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuxPowError {
    #[error("parent coinbase does not contain the commitment tag")]
    CommitmentAbsent,
    #[error("commitment hash in parent coinbase does not match this chain's header hash")]
    ShellCommitmentHashMismatch,
    #[error("folding the coinbase hash with the merkle branch did not reproduce the parent merkle root")]
    MerkleFoldMismatch,
    #[error("chain_index {0} is not the reserved Shell slot")]
    InvalidChainIndex(u32),
    #[error("parent header timestamp predates the genesis epoch guard")]
    ParentTimestampTooOld,
    #[error("parent header version {0} is not a positive version")]
    ParentVersionInvalid(i32),
    #[error("parent header's proof of work does not satisfy the Shell target")]
    InsufficientWork,
    #[error("AuxPoW is disabled (feature-gated off or sunset has activated)")]
    Disabled,
    #[error("AuxPoW sidecar buffer too short: expected at least {expected} bytes, got {actual}")]
    SidecarTruncated { expected: usize, actual: usize },
}

/// Top-level consensus verdict error, unifying every component per §7's propagation policy:
/// every variant is fatal for the block, there is no local recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    #[error("{0:?} is disabled at this height")]
    AlgorithmDisabled(Algorithm),
    #[error("hash does not meet target")]
    PoWAboveTarget,
    #[error(transparent)]
    Thermal(#[from] ThermalError),
    #[error(transparent)]
    AuxPow(#[from] AuxPowError),
    #[error("{algo:?} exceeded the {max_ratio:.0}% ratio cap over the trailing {window} blocks")]
    AlgorithmRatioViolation {
        algo: Algorithm,
        max_ratio: f64,
        window: usize,
    },
}

impl From<MobileXError> for ConsensusError {
    fn from(e: MobileXError) -> Self {
        match e {
            MobileXError::HashAboveTarget => ConsensusError::PoWAboveTarget,
            MobileXError::Thermal(t) => ConsensusError::Thermal(t),
        }
    }
}
