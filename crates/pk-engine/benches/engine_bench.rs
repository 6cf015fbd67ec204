//! Benchmarks for the clock and per-sample paths.
//!
//! Run with: cargo bench -p pk-engine
//!
//! A 64-sample block at 48 kHz has a 1.33 ms deadline.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pk_engine::Sequencer;
use pk_ir::{Edit, RunMode};

const BLOCK_SIZES: &[usize] = &[64, 256];
const SAMPLE_RATE: f32 = 48_000.0;

fn busy_sequencer(mode: RunMode) -> Box<Sequencer> {
    let mut seq = Box::new(Sequencer::with_seed(4, 3));
    for edit in [
        Edit::RandomizeSequence { multi: true },
        Edit::SetSeqRunMode { mode, multi: true },
        Edit::ToggleGateProb { multi: true },
    ] {
        seq.apply_edit(&edit);
    }
    seq.reset(false);
    seq
}

fn bench_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/clock_all");
    for mode in [RunMode::Forward, RunMode::Pendulum, RunMode::Random] {
        let mut seq = busy_sequencer(mode);
        group.bench_function(mode.short_name(), |b| {
            b.iter(|| black_box(seq.clock_all(false)))
        });
    }
    group.finish();
}

fn bench_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/block");
    for &size in BLOCK_SIZES {
        let mut seq = busy_sequencer(RunMode::Forward);
        group.bench_with_input(BenchmarkId::new("frames", size), &size, |b, &size| {
            b.iter(|| {
                // one clock per block
                seq.clock_all(false);
                for i in 0..size {
                    seq.process();
                    black_box(seq.frame(false, i < size / 2, SAMPLE_RATE));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clock, bench_block);
criterion_main!(benches);
