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

//! The hashrate-tracking state machine that permanently disables AuxPoW once native (RandomX or
//! MobileX) hashrate dominates (§4.4). A pure function of the ordered sequence of connected
//! blocks; reorgs unwind it via [`SunsetController::restore`] rather than in place.

use tracing::{info, trace};

use crate::difficulty::work_from_bits;
use crate::params::ChainParams;

const LOG_TARGET: &str = "shell_core::sunset";

fn saturating_u64(v: primitive_types::U256) -> u64 {
    if v > primitive_types::U256::from(u64::MAX) {
        u64::MAX
    } else {
        v.as_u64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunsetState {
    Enabled,
    NoticeIssued { sunset_height: u64 },
    SunsetActive,
}

/// Whether the block just connected was produced by a native algorithm or by AuxPoW.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedBlockKind {
    Native { bits: u32 },
    Aux,
}

/// A cheap, `Copy` snapshot of controller state taken at every connected height, enabling
/// reorg-safe restoration instead of an undo-log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunsetSnapshot {
    state: SunsetState,
    native_blocks: u64,
    aux_blocks: u64,
    native_hashrate_estimate: u64,
    window_native_work: primitive_types::U256,
    window_blocks: u64,
}

pub struct SunsetController {
    state: SunsetState,
    native_blocks: u64,
    aux_blocks: u64,
    native_hashrate_estimate: u64,
    window_native_work: primitive_types::U256,
    window_blocks: u64,
}

impl Default for SunsetController {
    fn default() -> Self {
        Self::new()
    }
}

impl SunsetController {
    pub fn new() -> Self {
        Self {
            state: SunsetState::Enabled,
            native_blocks: 0,
            aux_blocks: 0,
            native_hashrate_estimate: 0,
            window_native_work: primitive_types::U256::zero(),
            window_blocks: 0,
        }
    }

    pub fn state(&self) -> SunsetState {
        self.state
    }

    pub fn is_sunset_active(&self) -> bool {
        matches!(self.state, SunsetState::SunsetActive)
    }

    pub fn snapshot(&self) -> SunsetSnapshot {
        SunsetSnapshot {
            state: self.state,
            native_blocks: self.native_blocks,
            aux_blocks: self.aux_blocks,
            native_hashrate_estimate: self.native_hashrate_estimate,
            window_native_work: self.window_native_work,
            window_blocks: self.window_blocks,
        }
    }

    pub fn restore(&mut self, snapshot: SunsetSnapshot) {
        self.state = snapshot.state;
        self.native_blocks = snapshot.native_blocks;
        self.aux_blocks = snapshot.aux_blocks;
        self.native_hashrate_estimate = snapshot.native_hashrate_estimate;
        self.window_native_work = snapshot.window_native_work;
        self.window_blocks = snapshot.window_blocks;
    }

    /// Advances the state machine by one connected block at `height`. Ordering matters: callers
    /// MUST invoke this in canonical chain order, since the controller's transitions are not
    /// commutative.
    pub fn on_block_connect(&mut self, height: u64, kind: ConnectedBlockKind, params: &ChainParams) {
        match kind {
            ConnectedBlockKind::Native { bits } => {
                self.native_blocks += 1;
                self.window_native_work = self.window_native_work.saturating_add(work_from_bits(bits));
            }
            ConnectedBlockKind::Aux => {
                self.aux_blocks += 1;
            }
        }
        self.window_blocks += 1;

        if let SunsetState::NoticeIssued { sunset_height } = self.state {
            if height >= sunset_height {
                self.state = SunsetState::SunsetActive;
                info!(target: LOG_TARGET, height, "auxpow sunset activated");
            }
        }

        if matches!(self.state, SunsetState::Enabled) && self.window_blocks >= params.auxpow_monitoring_window {
            let window_seconds = self.window_blocks.saturating_mul(params.block_interval_seconds).max(1);
            // hashes/sec -> TH/s
            let hashes_per_second = self.window_native_work / primitive_types::U256::from(window_seconds);
            let th_per_second = hashes_per_second / primitive_types::U256::from(1_000_000_000_000u64);
            self.native_hashrate_estimate = saturating_u64(th_per_second);

            trace!(
                target: LOG_TARGET,
                height,
                native_hashrate_th = self.native_hashrate_estimate,
                "sunset monitoring window evaluated"
            );

            if self.native_hashrate_estimate >= params.auxpow_sunset_hashrate_threshold {
                let sunset_height = height + params.auxpow_sunset_notice_blocks;
                self.state = SunsetState::NoticeIssued { sunset_height };
                info!(target: LOG_TARGET, height, sunset_height, "auxpow sunset notice issued");
            }

            self.window_native_work = primitive_types::U256::zero();
            self.window_blocks = 0;
        }
    }
}
