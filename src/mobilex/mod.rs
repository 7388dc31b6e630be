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

//! The MobileX hasher (§4.2): RandomX inner hash -> vector pre-mix -> gated NPU convolution ->
//! heterogeneous core fold -> SHA-256 digest, plus the embedded thermal-compliance check that
//! makes a MobileX header's proof of work inseparable from its thermal proof.

pub mod core_fold;
pub mod npu;
pub mod randomx;
pub mod vector_mix;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::difficulty::meets_target;
use crate::error::MobileXError;
use crate::header::BlockHeader;
use crate::params::ChainParams;
use crate::thermal::{self, ThermalSample};

use self::npu::{CpuConvolution, NpuBackend, TENSOR_BYTES};
use self::randomx::{Epoch, MemoryMode, RandomXEpochCache};

const LOG_TARGET: &str = "shell_core::mobilex";

pub const STATE_BYTES: usize = 32;

/// `true` iff the NPU convolution stage fires for this nonce. Keyed off the nonce itself, rather
/// than a stateful mining-loop counter, so a lone header can be re-evaluated by `verify` without
/// replaying the search that produced it.
fn npu_gate(nonce: u32, interval: u64) -> bool {
    if interval == 0 {
        return true;
    }
    (nonce as u64) % interval == 0
}

/// Expands the 32-byte working state into the 32x32x3 tensor the NPU stage operates on, via
/// counter-mode SHA-256 expansion.
fn expand_state(state: &[u8; STATE_BYTES]) -> [u8; TENSOR_BYTES] {
    let mut tensor = [0u8; TENSOR_BYTES];
    let mut offset = 0usize;
    let mut counter: u32 = 0;
    while offset < TENSOR_BYTES {
        let mut hasher = Sha256::new();
        hasher.update(state);
        hasher.update(counter.to_le_bytes());
        let block = hasher.finalize();
        let take = (TENSOR_BYTES - offset).min(block.len());
        tensor[offset..offset + take].copy_from_slice(&block[..take]);
        offset += take;
        counter += 1;
    }
    tensor
}

/// Folds the convolved tensor back down to a 32-byte state.
fn fold_tensor(tensor: &[u8; TENSOR_BYTES]) -> [u8; STATE_BYTES] {
    let digest = Sha256::digest(tensor);
    let mut out = [0u8; STATE_BYTES];
    out.copy_from_slice(&digest);
    out
}

/// Runs the pre-mix, optional NPU convolution, and core fold stages over a RandomX inner hash,
/// returning the final 32-byte digest that gets compared against the target.
pub fn pipeline_hash(randomx_output: [u8; 32], apply_npu: bool, npu: &dyn NpuBackend) -> [u8; 32] {
    let mixed = vector_mix::premix(randomx_output);
    let state = if apply_npu {
        let tensor = expand_state(&mixed);
        let convolved = npu.run_convolution(&tensor);
        fold_tensor(&convolved)
    } else {
        mixed
    };
    let folded = core_fold::fold(state);
    let digest = Sha256::digest(folded);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// The report returned by a successful [`MobileXContext::solve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningReport {
    pub header: BlockHeader,
}

/// Owns the RandomX epoch cache and the NPU backend for one process. Long-lived: constructed once
/// at node start-up and shared by every validation/mining call.
pub struct MobileXContext {
    epochs: RandomXEpochCache,
    npu: Box<dyn NpuBackend>,
}

impl Default for MobileXContext {
    fn default() -> Self {
        Self {
            epochs: RandomXEpochCache::new(),
            npu: Box::new(CpuConvolution),
        }
    }
}

impl MobileXContext {
    pub fn new(npu: Box<dyn NpuBackend>) -> Self {
        Self {
            epochs: RandomXEpochCache::new(),
            npu,
        }
    }

    fn epoch_for(&self, height: u64, params: &ChainParams, mode: MemoryMode) -> Result<Arc<Epoch>, MobileXError> {
        let seed = randomx::seed_for_height(height, params.mobilex_seed_rotation);
        self.epochs
            .get_or_create(seed, mode)
            .map_err(|_| MobileXError::HashAboveTarget)
    }

    /// Verifies that `header` satisfies both the MobileX proof of work and its embedded thermal
    /// compliance proof. A hardware failure while computing the RandomX inner hash is treated as
    /// "does not meet target" rather than surfaced as a distinct error (§7): a validator that
    /// cannot compute the hash cannot prove the block valid, so it must reject.
    pub fn verify(&self, header: &BlockHeader, params: &ChainParams, height: u64) -> Result<(), MobileXError> {
        let preimage = header.pow_preimage();
        let epoch = self.epoch_for(height, params, MemoryMode::Light)?;
        let inner = randomx::inner_hash(&epoch, &preimage).ok_or(MobileXError::HashAboveTarget)?;
        let apply_npu = npu_gate(header.nonce, params.mobilex_npu_interval);
        let digest = pipeline_hash(inner, apply_npu, self.npu.as_ref());

        trace!(target: LOG_TARGET, nonce = header.nonce, apply_npu, "mobilex digest computed");

        if !meets_target(&digest, header.bits) {
            return Err(MobileXError::HashAboveTarget);
        }
        thermal::validate_proof(header, params.mobilex_base_freq_mhz, params.mobilex_thermal_tolerance_percent)?;
        Ok(())
    }

    /// Verifies a plain RandomX header (`thermal_proof == 0`): the raw RandomX inner hash
    /// compared directly against the target, with none of the MobileX pipeline's later stages and
    /// no thermal proof requirement.
    pub fn verify_randomx(&self, header: &BlockHeader, params: &ChainParams, height: u64) -> Result<(), MobileXError> {
        let preimage = header.pow_preimage();
        let epoch = self.epoch_for(height, params, MemoryMode::Light)?;
        let inner = randomx::inner_hash(&epoch, &preimage).ok_or(MobileXError::HashAboveTarget)?;
        if !meets_target(&inner, header.bits) {
            return Err(MobileXError::HashAboveTarget);
        }
        Ok(())
    }

    /// Searches for a nonce that satisfies both the target and the thermal proof, fanning the
    /// search out across `worker_count` threads via stride/offset nonce partitioning. `tick` is
    /// polled once per pipeline evaluation alongside `cancel`, matching §4.2's
    /// `solve(header_mut, target_bits, tick, cancel)` contract: it carries no meaning to the
    /// search itself, but gives the caller a heartbeat to drive progress reporting or its own
    /// deadline. Returns `None` if `cancel` is set before a solution is found.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &self,
        header: BlockHeader,
        params: &ChainParams,
        height: u64,
        recent_samples: &[ThermalSample],
        worker_count: usize,
        tick: &(dyn Fn() + Send + Sync),
        cancel: Arc<AtomicBool>,
    ) -> Option<MiningReport> {
        let epoch = self.epoch_for(height, params, MemoryMode::Fast).ok()?;
        let worker_count = if worker_count == 0 { num_cpus::get() } else { worker_count };
        let found: Mutex<Option<BlockHeader>> = Mutex::new(None);
        let npu = self.npu.as_ref();

        debug!(target: LOG_TARGET, height, worker_count, "starting mobilex search");

        std::thread::scope(|scope| {
            for worker_id in 0..worker_count {
                let epoch = epoch.clone();
                let cancel = cancel.clone();
                let found = &found;
                let mut candidate = header;
                scope.spawn(move || {
                    let mut nonce = worker_id as u32;
                    loop {
                        tick();
                        if cancel.load(Ordering::Relaxed) {
                            return;
                        }
                        if found.lock().expect("search result lock poisoned").is_some() {
                            return;
                        }

                        candidate.nonce = nonce;
                        let preimage = candidate.pow_preimage();
                        if let Some(inner) = randomx::inner_hash(&epoch, &preimage) {
                            let apply_npu = npu_gate(candidate.nonce, params.mobilex_npu_interval);
                            let digest = pipeline_hash(inner, apply_npu, npu);
                            if meets_target(&digest, candidate.bits) {
                                let thermal_proof = thermal::generate_proof(&preimage, recent_samples);
                                if thermal_proof != 0 {
                                    candidate.thermal_proof = thermal_proof;
                                    let mut slot = found.lock().expect("search result lock poisoned");
                                    if slot.is_none() {
                                        *slot = Some(candidate);
                                    }
                                    return;
                                }
                            }
                        }

                        nonce = nonce.wrapping_add(worker_count as u32);
                    }
                });
            }
        });

        found
            .into_inner()
            .expect("search result lock poisoned")
            .map(|header| MiningReport { header })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npu_gate_fires_on_multiples_of_interval() {
        assert!(npu_gate(0, 150));
        assert!(npu_gate(150, 150));
        assert!(!npu_gate(151, 150));
    }

    #[test]
    fn npu_gate_always_fires_when_interval_is_zero() {
        assert!(npu_gate(1, 0));
        assert!(npu_gate(7, 0));
    }

    #[test]
    fn pipeline_hash_is_deterministic_with_and_without_npu() {
        let npu = CpuConvolution;
        let input = [0x24u8; 32];
        assert_eq!(pipeline_hash(input, false, &npu), pipeline_hash(input, false, &npu));
        assert_eq!(pipeline_hash(input, true, &npu), pipeline_hash(input, true, &npu));
    }

    #[test]
    fn npu_stage_changes_the_digest() {
        let npu = CpuConvolution;
        let input = [0x24u8; 32];
        assert_ne!(pipeline_hash(input, false, &npu), pipeline_hash(input, true, &npu));
    }

    #[test]
    fn expand_and_fold_tensor_round_trip_deterministically() {
        let state = [0x77u8; STATE_BYTES];
        let tensor_a = expand_state(&state);
        let tensor_b = expand_state(&state);
        assert_eq!(tensor_a, tensor_b);
        assert_eq!(fold_tensor(&tensor_a), fold_tensor(&tensor_b));
    }

    #[test]
    fn verify_rejects_when_hardware_path_unavailable_without_mobilex_feature() {
        #[cfg(not(feature = "mobilex"))]
        {
            let ctx = MobileXContext::default();
            let header = BlockHeader::new(1, [0u8; 32], [0u8; 32], 0, 0x207f_ffff);
            let params = ChainParams::default();
            assert!(ctx.verify(&header, &params, 0).is_err());
        }
    }
}
