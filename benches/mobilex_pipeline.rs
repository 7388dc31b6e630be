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

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shell_reserve_core::mobilex::npu::{CpuConvolution, NpuBackend, TENSOR_BYTES};
use shell_reserve_core::mobilex::{core_fold, pipeline_hash, vector_mix};

fn bench_vector_premix(c: &mut Criterion) {
    let state = [0x5au8; 32];
    c.bench_function("vector_mix::premix", |b| b.iter(|| vector_mix::premix(black_box(state))));
}

fn bench_core_fold(c: &mut Criterion) {
    let state = [0x42u8; 32];
    c.bench_function("core_fold::fold", |b| b.iter(|| core_fold::fold(black_box(state))));
}

fn bench_npu_convolution(c: &mut Criterion) {
    let mut tensor = [0u8; TENSOR_BYTES];
    for (i, b) in tensor.iter_mut().enumerate() {
        *b = (i % 256) as u8;
    }
    let backend = CpuConvolution;
    c.bench_function("npu::run_convolution", |b| {
        b.iter(|| backend.run_convolution(black_box(&tensor)))
    });
}

fn bench_pipeline_hash(c: &mut Criterion) {
    let input = [0x24u8; 32];
    let backend = CpuConvolution;
    c.bench_function("pipeline_hash (with npu)", |b| {
        b.iter(|| pipeline_hash(black_box(input), true, &backend))
    });
    c.bench_function("pipeline_hash (without npu)", |b| {
        b.iter(|| pipeline_hash(black_box(input), false, &backend))
    });
}

criterion_group!(
    benches,
    bench_vector_premix,
    bench_core_fold,
    bench_npu_convolution,
    bench_pipeline_hash
);
criterion_main!(benches);
