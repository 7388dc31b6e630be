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

//! Process-wide chain parameters (`spec` §3/§6). Immutable after construction; every validator
//! borrows these, never owns them.

/// The 6-byte marker that precedes a Shell header hash inside a parent-chain coinbase.
pub const DEFAULT_AUXPOW_TAG: [u8; 6] = *b"XSLTAG";

#[derive(Debug, Clone, PartialEq)]
pub struct ChainParams {
    pub mobilex_enabled: bool,
    pub mobilex_activation_height: u64,
    pub mobilex_seed_rotation: u64,
    pub mobilex_memory_light: u64,
    pub mobilex_memory_fast: u64,
    pub mobilex_npu_interval: u64,
    pub mobilex_thermal_tolerance_percent: u8,
    pub mobilex_base_freq_mhz: u32,

    pub ratio_window: usize,
    pub max_ratio: f64,

    pub auxpow_enabled: bool,
    pub auxpow_chain_id: u32,
    pub auxpow_commitment_tag: [u8; 6],
    pub auxpow_sunset_hashrate_threshold: u64,
    pub auxpow_monitoring_window: u64,
    pub auxpow_sunset_notice_blocks: u64,
    /// Wall-clock seconds assumed between blocks, used only to convert accumulated work in a
    /// monitoring window into a TH/s estimate (§4.4).
    pub block_interval_seconds: u64,

    pub thermal_ring_capacity: usize,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            mobilex_enabled: true,
            mobilex_activation_height: 0,
            mobilex_seed_rotation: 2048,
            mobilex_memory_light: 256 * 1024 * 1024,
            mobilex_memory_fast: 2 * 1024 * 1024 * 1024,
            mobilex_npu_interval: 150,
            mobilex_thermal_tolerance_percent: 5,
            mobilex_base_freq_mhz: 2_000,

            ratio_window: 100,
            max_ratio: 0.70,

            auxpow_enabled: true,
            auxpow_chain_id: 0,
            auxpow_commitment_tag: DEFAULT_AUXPOW_TAG,
            auxpow_sunset_hashrate_threshold: 50,
            auxpow_monitoring_window: 1008,
            auxpow_sunset_notice_blocks: 25_920,
            block_interval_seconds: 60,

            thermal_ring_capacity: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChainParamsError {
    #[error("mobilex_thermal_tolerance_percent must be in (0, 100], got {0}")]
    ThermalTolerance(u8),
    #[error("max_ratio must be in (0.0, 1.0], got {0}")]
    MaxRatio(String),
    #[error("mobilex_memory_light ({light}) must be <= mobilex_memory_fast ({fast})")]
    MemoryOrdering { light: u64, fast: u64 },
    #[error("ratio_window and auxpow_monitoring_window must be non-zero")]
    ZeroWindow,
}

impl ChainParams {
    /// Defensive construction-time validation. This is boundary validation of an external
    /// configuration input, not a consensus rule (`spec` §1 keeps configuration out of scope
    /// for the validators themselves), but a misconfigured node should fail loudly at start-up
    /// rather than mis-validate blocks silently.
    pub fn validate(&self) -> Result<(), ChainParamsError> {
        if self.mobilex_thermal_tolerance_percent == 0 || self.mobilex_thermal_tolerance_percent > 100 {
            return Err(ChainParamsError::ThermalTolerance(self.mobilex_thermal_tolerance_percent));
        }
        if !(self.max_ratio > 0.0 && self.max_ratio <= 1.0) {
            return Err(ChainParamsError::MaxRatio(self.max_ratio.to_string()));
        }
        if self.mobilex_memory_light > self.mobilex_memory_fast {
            return Err(ChainParamsError::MemoryOrdering {
                light: self.mobilex_memory_light,
                fast: self.mobilex_memory_fast,
            });
        }
        if self.ratio_window == 0 || self.auxpow_monitoring_window == 0 {
            return Err(ChainParamsError::ZeroWindow);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ChainParamsBuilder {
    params: ChainParams,
}

impl ChainParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: ChainParams::default(),
        }
    }

    pub fn mobilex_enabled(mut self, v: bool) -> Self {
        self.params.mobilex_enabled = v;
        self
    }

    pub fn mobilex_activation_height(mut self, v: u64) -> Self {
        self.params.mobilex_activation_height = v;
        self
    }

    pub fn auxpow_enabled(mut self, v: bool) -> Self {
        self.params.auxpow_enabled = v;
        self
    }

    pub fn ratio_window(mut self, v: usize) -> Self {
        self.params.ratio_window = v;
        self
    }

    pub fn max_ratio(mut self, v: f64) -> Self {
        self.params.max_ratio = v;
        self
    }

    pub fn auxpow_monitoring_window(mut self, v: u64) -> Self {
        self.params.auxpow_monitoring_window = v;
        self
    }

    pub fn auxpow_sunset_notice_blocks(mut self, v: u64) -> Self {
        self.params.auxpow_sunset_notice_blocks = v;
        self
    }

    pub fn auxpow_sunset_hashrate_threshold(mut self, v: u64) -> Self {
        self.params.auxpow_sunset_hashrate_threshold = v;
        self
    }

    pub fn build(self) -> Result<ChainParams, ChainParamsError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
