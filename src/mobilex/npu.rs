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

//! The NPU convolution stage (§4.2 step 3), run once every `mobilex_npu_interval` pipeline
//! iterations. This is the one stage of the pipeline where runtime polymorphism is warranted: a
//! device may expose a hardware NPU backend for speed, but every backend, hardware or not, must
//! reproduce [`CpuConvolution`] bit-for-bit, because validators that lack the hardware still have
//! to verify blocks mined with it.
//!
//! Arithmetic is entirely fixed-point (`i32`) rather than floating point so that "bit-identical
//! across backends" is a property of integer arithmetic, not of a particular FPU's rounding mode.

/// Width/height of each of the three channels the mixing state is reshaped into.
pub const TENSOR_DIM: usize = 32;
pub const TENSOR_CHANNELS: usize = 3;
pub const TENSOR_BYTES: usize = TENSOR_DIM * TENSOR_DIM * TENSOR_CHANNELS;

/// The single consensus-defined 3x3 kernel, applied depthwise (independently per channel) with
/// zero padding at the borders. Convolution output is divided by 9 and then clamped to `[0, 255]`
/// (ReLU at the low end, saturation at the high end).
const KERNEL: [[i32; 3]; 3] = [[-1, -1, -1], [-1, 8, -1], [-1, -1, -1]];
const KERNEL_NORMALIZER: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpuMetrics {
    pub available: bool,
    pub backend_name: &'static str,
}

/// A source of the NPU convolution stage. Implementations other than [`CpuConvolution`] exist
/// only to go faster; `run_convolution` must return exactly what [`CpuConvolution`] would for the
/// same input, or validators running on different hardware would disagree about whether a block
/// is valid.
pub trait NpuBackend: Send + Sync {
    fn is_available(&self) -> bool;
    fn run_convolution(&self, tensor: &[u8; TENSOR_BYTES]) -> [u8; TENSOR_BYTES];
    fn metrics(&self) -> NpuMetrics;
}

/// The reference implementation. Always available, and the only implementation this crate ships,
/// since no accelerated backend has yet been written against it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuConvolution;

impl NpuBackend for CpuConvolution {
    fn is_available(&self) -> bool {
        true
    }

    fn run_convolution(&self, tensor: &[u8; TENSOR_BYTES]) -> [u8; TENSOR_BYTES] {
        convolve(tensor)
    }

    fn metrics(&self) -> NpuMetrics {
        NpuMetrics {
            available: true,
            backend_name: "cpu-fixed-point",
        }
    }
}

fn channel_at(tensor: &[u8; TENSOR_BYTES], channel: usize, row: i32, col: i32) -> i32 {
    if row < 0 || col < 0 || row as usize >= TENSOR_DIM || col as usize >= TENSOR_DIM {
        return 0;
    }
    let idx = channel * TENSOR_DIM * TENSOR_DIM + row as usize * TENSOR_DIM + col as usize;
    tensor[idx] as i32
}

fn convolve(tensor: &[u8; TENSOR_BYTES]) -> [u8; TENSOR_BYTES] {
    let mut out = [0u8; TENSOR_BYTES];
    for channel in 0..TENSOR_CHANNELS {
        for row in 0..TENSOR_DIM {
            for col in 0..TENSOR_DIM {
                let mut acc: i32 = 0;
                for (kr, krow) in KERNEL.iter().enumerate() {
                    for (kc, weight) in krow.iter().enumerate() {
                        let sample_row = row as i32 + kr as i32 - 1;
                        let sample_col = col as i32 + kc as i32 - 1;
                        acc += weight * channel_at(tensor, channel, sample_row, sample_col);
                    }
                }
                let normalized = acc / KERNEL_NORMALIZER;
                let clamped = normalized.clamp(0, 255) as u8;
                let idx = channel * TENSOR_DIM * TENSOR_DIM + row * TENSOR_DIM + col;
                out[idx] = clamped;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_channel_is_a_fixed_point_under_the_edge_kernel() {
        // Every interior tap sees the same constant value, so (8 - 8) / 9 = 0 with ReLU.
        // Border pixels see zero padding and go negative, clamping to 0.
        let tensor = [7u8; TENSOR_BYTES];
        let out = convolve(&tensor);
        assert_eq!(out[TENSOR_DIM + 1], 0);
    }

    #[test]
    fn convolution_is_deterministic() {
        let mut tensor = [0u8; TENSOR_BYTES];
        for (i, b) in tensor.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        assert_eq!(convolve(&tensor), convolve(&tensor));
    }

    #[test]
    fn cpu_backend_reports_always_available() {
        let backend = CpuConvolution;
        assert!(backend.is_available());
        assert_eq!(backend.metrics().backend_name, "cpu-fixed-point");
    }

    #[test]
    fn output_never_exceeds_input_byte_range() {
        let tensor = [255u8; TENSOR_BYTES];
        let out = convolve(&tensor);
        assert!(out.iter().all(|&b| b <= 255));
    }
}
