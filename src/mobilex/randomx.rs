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

//! The RandomX inner hash stage of the MobileX pipeline (`spec` §4.2 step 1), and the
//! epoch-scoped cache/dataset sharing that keeps at most two RandomX epochs alive during a seed
//! rotation (`spec` §5).

use std::sync::{Arc, RwLock};

use sha2::{Digest, Sha256};
use tracing::debug;

const LOG_TARGET: &str = "shell_core::mobilex::randomx";

/// Light mode keeps only the 256 MiB cache; fast mode also builds the 2 GiB dataset. Both
/// produce identical hashes (`spec` §4.2); they are a speed/memory trade-off only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMode {
    Light,
    Fast,
}

/// `floor(height / seed_rotation)`'s seed, derived deterministically so every node agrees on the
/// dataset key for a given height without needing to exchange it out of band.
pub fn seed_for_height(height: u64, seed_rotation: u64) -> [u8; 32] {
    let epoch = if seed_rotation == 0 { 0 } else { height / seed_rotation };
    let digest = Sha256::digest(epoch.to_le_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

#[cfg(feature = "mobilex")]
mod native {
    use randomx_rs::{RandomXCache, RandomXDataset, RandomXFlag, RandomXVM};

    use super::*;

    pub struct Epoch {
        pub seed: [u8; 32],
        pub flags: RandomXFlag,
        pub cache: RandomXCache,
        pub dataset: Option<RandomXDataset>,
    }

    // The underlying `RandomXCache`/`RandomXDataset` wrap raw FFI pointers into memory that, once
    // built, is only ever read from concurrently. Mirrors the source style's `SharedDataset`
    // unsafe impls for the same reason.
    unsafe impl Send for Epoch {}
    unsafe impl Sync for Epoch {}

    /// Shared, keyed-by-seed epoch cache. At most two epochs (`current` and `previous`) are kept
    /// alive at once; inserting a third evicts the oldest, matching the "old + new, then release"
    /// rule from `spec` §5. Mirrors the source style's `SharedDataset` read-then-write-lock
    /// double-check pattern.
    pub struct RandomXEpochCache {
        current: RwLock<Option<Arc<Epoch>>>,
        previous: RwLock<Option<Arc<Epoch>>>,
    }

    impl Default for RandomXEpochCache {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RandomXEpochCache {
        pub fn new() -> Self {
            Self {
                current: RwLock::new(None),
                previous: RwLock::new(None),
            }
        }

        pub fn get_or_create(&self, seed: [u8; 32], mode: MemoryMode) -> Result<Arc<Epoch>, randomx_rs::RandomXError> {
            if let Some(epoch) = self.find(seed) {
                return Ok(epoch);
            }

            let mut write_guard = self.current.write().expect("randomx epoch cache lock poisoned");
            if let Some(existing) = write_guard.as_ref() {
                if existing.seed == seed {
                    return Ok(existing.clone());
                }
            }

            let flags = match mode {
                MemoryMode::Light => RandomXFlag::get_recommended_flags(),
                MemoryMode::Fast => RandomXFlag::get_recommended_flags() | RandomXFlag::FLAG_FULL_MEM,
            };
            let cache = RandomXCache::new(flags, &seed)?;
            let dataset = match mode {
                MemoryMode::Fast => Some(RandomXDataset::new(flags, cache.clone(), 0)?),
                MemoryMode::Light => None,
            };
            let epoch = Arc::new(Epoch {
                seed,
                flags,
                cache,
                dataset,
            });

            if let Some(old) = write_guard.take() {
                *self.previous.write().expect("randomx epoch cache lock poisoned") = Some(old);
            }
            *write_guard = Some(epoch.clone());
            debug!(target: LOG_TARGET, "rotated to new randomx epoch, seed {}", hex::encode(seed));
            Ok(epoch)
        }

        fn find(&self, seed: [u8; 32]) -> Option<Arc<Epoch>> {
            if let Some(e) = self.current.read().expect("randomx epoch cache lock poisoned").as_ref() {
                if e.seed == seed {
                    return Some(e.clone());
                }
            }
            if let Some(e) = self.previous.read().expect("randomx epoch cache lock poisoned").as_ref() {
                if e.seed == seed {
                    return Some(e.clone());
                }
            }
            None
        }
    }

    /// Single-shot RandomX hash of `preimage` under `epoch`. A VM-construction or hashing failure
    /// is an operational hardware fault, not a consensus outcome (`spec` §7: hardware errors never
    /// surface as a distinct verify error), callers fold a `None` into `ErrHashAboveTarget`.
    pub fn inner_hash(epoch: &Epoch, preimage: &[u8]) -> Option<[u8; 32]> {
        let vm = RandomXVM::new(epoch.flags, Some(epoch.cache.clone()), epoch.dataset.clone()).ok()?;
        let hash = vm.calculate_hash(preimage).ok()?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        Some(out)
    }
}

#[cfg(feature = "mobilex")]
pub use native::{inner_hash, Epoch, RandomXEpochCache};

/// Built without the `mobilex` feature: no native RandomX library is linked, so the epoch cache
/// is present for API compatibility but every hash attempt reports a hardware fault.
#[cfg(not(feature = "mobilex"))]
pub struct Epoch {
    pub seed: [u8; 32],
}

#[cfg(not(feature = "mobilex"))]
#[derive(Default)]
pub struct RandomXEpochCache;

#[cfg(not(feature = "mobilex"))]
impl RandomXEpochCache {
    pub fn new() -> Self {
        Self
    }

    pub fn get_or_create(&self, seed: [u8; 32], _mode: MemoryMode) -> Result<Arc<Epoch>, &'static str> {
        Ok(Arc::new(Epoch { seed }))
    }
}

#[cfg(not(feature = "mobilex"))]
pub fn inner_hash(_epoch: &Epoch, _preimage: &[u8]) -> Option<[u8; 32]> {
    None
}
