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

//! Vector pre-mix stage (§4.2 step 2): a fixed rotate/XOR schedule over the 256-bit working state,
//! chosen to map cleanly onto either a 128-bit NEON lane or four 64-bit scalar lanes. Unlike the
//! NPU stage, there is no capability trait here: the scalar form below is the one and only
//! consensus definition, and is cheap enough that no platform needs an accelerated substitute.

const ROTATIONS: [u32; 3] = [7, 13, 17];

/// Per-lane round constants, breaking the all-zero fixed point and giving each lane a distinct
/// identity independent of the rotation schedule.
const ROUND_CONSTANTS: [u64; 4] = [
    0x9e37_79b9_7f4a_7c15,
    0xbf58_476d_1ce4_e5b9,
    0x94d0_49bb_1331_11eb,
    0xff51_afd7_ed55_8ccd,
];

/// Mixes the 32-byte state in place, treating it as four little-endian `u64` lanes. Each output
/// lane XORs its own 7-bit rotation with the 13-bit rotation of its neighbour, the 17-bit rotation
/// of the lane two steps ahead, and a fixed per-lane constant, so a single-bit change in any input
/// lane propagates into every output lane and the all-zero state is not a fixed point.
pub fn premix(state: [u8; 32]) -> [u8; 32] {
    let mut words = [0u64; 4];
    for (i, word) in words.iter_mut().enumerate() {
        let mut lane = [0u8; 8];
        lane.copy_from_slice(&state[i * 8..i * 8 + 8]);
        *word = u64::from_le_bytes(lane);
    }

    let mut out_words = [0u64; 4];
    for i in 0..4 {
        let a = words[i].rotate_left(ROTATIONS[0]);
        let b = words[(i + 1) % 4].rotate_left(ROTATIONS[1]);
        let c = words[(i + 2) % 4].rotate_left(ROTATIONS[2]);
        out_words[i] = a ^ b ^ c ^ ROUND_CONSTANTS[i];
    }

    let mut out = [0u8; 32];
    for (i, word) in out_words.iter().enumerate() {
        out[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premix_is_deterministic() {
        let state = [0x5a; 32];
        assert_eq!(premix(state), premix(state));
    }

    #[test]
    fn premix_changes_every_output_lane_on_single_bit_flip() {
        let mut a = [0u8; 32];
        a[0] = 1;
        let b = [0u8; 32];
        let out_a = premix(a);
        let out_b = premix(b);
        for chunk in 0..4 {
            let lane_a = &out_a[chunk * 8..chunk * 8 + 8];
            let lane_b = &out_b[chunk * 8..chunk * 8 + 8];
            assert_ne!(lane_a, lane_b, "lane {chunk} unaffected by input bit flip");
        }
    }

    #[test]
    fn zero_state_is_not_a_fixed_point() {
        let state = [0u8; 32];
        assert_ne!(premix(state), state);
    }
}
