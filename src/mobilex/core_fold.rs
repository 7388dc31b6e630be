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

//! Heterogeneous-core fold stage (§4.2 step 4): simulates splitting the working state across a
//! "big" and a "little" core partition with different rotation constants, then merges the halves
//! back together. This is a pure function of the state; no actual thread/core affinity is
//! involved, since the point is only to make the final digest depend on work that two different
//! core classes would have computed differently, not to schedule real hardware.

const BIG_ROTATION: u32 = 11;
const LITTLE_ROTATION: u32 = 19;

/// Folds the high and low 16-byte halves of `state` through distinct rotation constants and
/// merges the results with XOR, producing a new 32-byte state.
pub fn fold(state: [u8; 32]) -> [u8; 32] {
    let mut big = [0u8; 16];
    big.copy_from_slice(&state[0..16]);
    let mut little = [0u8; 16];
    little.copy_from_slice(&state[16..32]);

    let big_folded = rotate_block(big, BIG_ROTATION);
    let little_folded = rotate_block(little, LITTLE_ROTATION);

    let mut out = [0u8; 32];
    for i in 0..16 {
        out[i] = big_folded[i] ^ little_folded[i];
        out[i + 16] = big_folded[i].rotate_left(3) ^ little_folded[i].rotate_left(5);
    }
    out
}

/// Rotates a 16-byte block by `bits`, treating it as two 64-bit little-endian lanes.
fn rotate_block(block: [u8; 16], bits: u32) -> [u8; 16] {
    let mut lo = [0u8; 8];
    lo.copy_from_slice(&block[0..8]);
    let mut hi = [0u8; 8];
    hi.copy_from_slice(&block[8..16]);

    let lo = u64::from_le_bytes(lo).rotate_left(bits);
    let hi = u64::from_le_bytes(hi).rotate_left(bits);

    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(&lo.to_le_bytes());
    out[8..16].copy_from_slice(&hi.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_is_deterministic() {
        let state = [0x42; 32];
        assert_eq!(fold(state), fold(state));
    }

    #[test]
    fn fold_depends_on_both_halves() {
        let mut a = [0u8; 32];
        a[0] = 1;
        let mut b = [0u8; 32];
        b[31] = 1;
        assert_ne!(fold(a), fold(b));
        assert_ne!(fold([0u8; 32]), fold(a));
        assert_ne!(fold([0u8; 32]), fold(b));
    }

    #[test]
    fn fold_is_not_the_identity() {
        let state = [0xab; 32];
        assert_ne!(fold(state), state);
    }
}
