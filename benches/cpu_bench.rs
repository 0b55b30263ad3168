// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{criterion_group, criterion_main, Criterion};
use oxidestation::core::bus::Bus;
use std::hint::black_box;

fn cpu_step_benchmark(c: &mut Criterion) {
    c.bench_function("cpu_step_nop", |b| {
        // The zeroed BIOS decodes as an endless stream of NOPs
        let mut bus = Bus::new();
        let cpu = bus.cpu();

        b.iter(|| {
            cpu.borrow_mut().set_pc(0xBFC0_0000);
            for _ in 0..1000 {
                black_box(cpu.borrow_mut().step(&mut bus).unwrap());
            }
        });
    });
}

fn bus_dispatch_benchmark(c: &mut Criterion) {
    c.bench_function("bus_read32_ram", |b| {
        let mut bus = Bus::new();
        bus.write32(0x0000_1000, 0x1234_5678).unwrap();
        b.iter(|| black_box(bus.read32(black_box(0x8000_1000)).unwrap()));
    });

    c.bench_function("bus_execute_batch", |b| {
        let mut bus = Bus::new();
        b.iter(|| bus.execute(black_box(Bus::BATCH_CYCLES)).unwrap());
    });
}

fn gpu_fill_benchmark(c: &mut Criterion) {
    c.bench_function("gpu_vram_fill_256x256", |b| {
        let mut bus = Bus::new();
        let gpu = bus.gpu();
        b.iter(|| {
            let mut gpu = gpu.borrow_mut();
            gpu.write_gp0(0x0200_00FF);
            gpu.write_gp0(0x0000_0000);
            gpu.write_gp0(0x0100_0100);
        });
    });
}

criterion_group!(
    benches,
    cpu_step_benchmark,
    bus_dispatch_benchmark,
    gpu_fill_benchmark
);
criterion_main!(benches);
