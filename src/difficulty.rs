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

//! Bitcoin-style compact-bits <-> 256-bit target conversion, and the two's-complement-free "work"
//! measure used by the sunset hashrate estimator.

use primitive_types::U256;

/// Convert a compact `bits` value to a 256-bit target, honoring Bitcoin's mantissa/exponent
/// encoding including the sign-bit quirk: if the mantissa's high bit is set the target is
/// negative and therefore unsatisfiable, so we report it as zero (nothing can meet a zero
/// target, which is the conservative and correct behaviour for a degenerate `bits` value).
pub fn target_from_bits(bits: u32) -> U256 {
    let exponent = (bits >> 24) as u32;
    let mantissa = bits & 0x007f_ffff;
    let is_negative = bits & 0x0080_0000 != 0;

    if is_negative || mantissa == 0 {
        return U256::zero();
    }

    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        U256::from(mantissa) << (8 * (exponent.saturating_sub(3)))
    }
}

/// Interpret a 32-byte hash as a big-endian 256-bit integer.
pub fn hash_to_u256(hash: &[u8; 32]) -> U256 {
    U256::from_big_endian(hash)
}

/// `true` iff `hash`, read as a big-endian 256-bit integer, is less than or equal to the target
/// implied by `bits`.
pub fn meets_target(hash: &[u8; 32], bits: u32) -> bool {
    let target = target_from_bits(bits);
    if target.is_zero() {
        return false;
    }
    hash_to_u256(hash) <= target
}

/// The Bitcoin-style "work" representation of a target: `2**256 / (target + 1)`. Used only by
/// the Sunset Controller's hashrate estimate (§4.4); never by consensus target comparisons,
/// which always operate directly on the target via [`meets_target`].
pub fn work_from_bits(bits: u32) -> U256 {
    let target = target_from_bits(bits);
    if target.is_zero() {
        return U256::zero();
    }
    // (2**256 - 1) / (target + 1) + 1, computed without overflowing U256::MAX + 1.
    let denom = target + U256::one();
    (U256::max_value() / denom) + U256::one()
}

#[cfg(test)]
mod quickcheck_tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[quickcheck]
    fn a_hash_equal_to_the_target_always_meets_it(bits: u32) -> bool {
        let target = target_from_bits(bits);
        if target.is_zero() {
            return true;
        }
        let mut bytes = [0u8; 32];
        target.to_big_endian(&mut bytes);
        meets_target(&bytes, bits)
    }

    #[quickcheck]
    fn work_is_zero_exactly_when_target_is_zero(bits: u32) -> bool {
        target_from_bits(bits).is_zero() == work_from_bits(bits).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_conversion_matches_known_vectors() {
        // 0x1d00ffff is Bitcoin genesis difficulty-1; target high byte is 0x00, exponent 0x1d.
        let target = target_from_bits(0x1d00_ffff);
        let expected = U256::from(0x00ffffu32) << (8 * (0x1d - 3));
        assert_eq!(target, expected);
    }

    #[test]
    fn zero_mantissa_is_unsatisfiable() {
        assert!(target_from_bits(0x0400_0000).is_zero());
        assert!(!meets_target(&[0u8; 32], 0x0400_0000));
    }

    #[test]
    fn negative_sign_bit_yields_zero_target() {
        assert!(target_from_bits(0x0180_0000).is_zero());
    }

    #[test]
    fn small_exponent_shifts_right() {
        // exponent < 3 shifts the mantissa down instead of up.
        let target = target_from_bits(0x0200_8000);
        assert_eq!(target, U256::from(0x80u32));
    }

    #[test]
    fn harder_bits_have_more_work() {
        let easy = work_from_bits(0x1d00_ffff);
        let hard = work_from_bits(0x1c00_ffff);
        assert!(hard > easy);
    }

    #[test]
    fn all_zero_hash_meets_any_nonzero_target() {
        assert!(meets_target(&[0u8; 32], 0x1d00_ffff));
    }

    #[test]
    fn max_hash_fails_typical_target() {
        assert!(!meets_target(&[0xffu8; 32], 0x1d00_ffff));
    }
}
