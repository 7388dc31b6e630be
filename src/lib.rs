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

//! Consensus core for a mobile-first proof-of-work chain: dual-algorithm (RandomX/MobileX) block
//! validation, a thermal-compliance proof embedded in MobileX headers, a merge-mining bridge to a
//! SHA-256 parent chain, and the deterministic sunset that retires that bridge once native
//! hashrate dominates.
//!
//! This crate is a pure validation/mining library: no network, storage, or wallet code lives
//! here. A node binary embeds it and supplies block headers, chain-tip state, and transaction
//! data from its own collaborators.

pub mod auxpow;
pub mod difficulty;
pub mod error;
pub mod header;
pub mod mobilex;
pub mod params;
pub mod policy;
pub mod sunset;
pub mod thermal;

pub use error::{AuxPowError, ConsensusError, HeaderError, MobileXError, ThermalError};
pub use header::BlockHeader;
pub use params::{ChainParams, ChainParamsBuilder};
pub use policy::{Algorithm, MiningPolicy};
