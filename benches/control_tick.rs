//! Control Tick Benchmarks
//!
//! The whole control path runs inside the ADC timer interrupt, so a tick has
//! to finish in a small fraction of the timer period:
//!
//! ```text
//! time_budget = 1 / tick_rate
//! ```
//!
//! | Tick Rate | Period   |
//! |-----------|----------|
//! | 2 kHz     | 500 us   |
//! | 4 kHz     | 250 us   |
//! | 8 kHz     | 125 us   |
//!
//! These benchmarks measure a full tick in its cheapest and busiest states,
//! plus the individual stages.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sampler_controls::conditioning::{CvConditioner, PotConditioner};
use sampler_controls::detent::{detent, detent_antihys};
use sampler_controls::pitch::{apply_tracking_compensation, quantized_semitone_voct};
use sampler_controls::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

/// Collaborators that accept every call and report a full library
struct NullHost;

impl SamplerEngine for NullHost {
    fn start_playing(&mut self, _chan: PlayChannel) {}
    fn toggle_playing(&mut self, _chan: PlayChannel) {}
    fn toggle_reverse(&mut self, _chan: PlayChannel) {}
    fn play_state(&self, _chan: PlayChannel) -> PlayState {
        PlayState::Playing
    }
}

impl Recorder for NullHost {
    fn toggle_recording(&mut self) {}
    fn stop_recording(&mut self) {}
    fn set_recording_enabled(&mut self, _enabled: bool) {}
}

impl SampleLibrary for NullHost {
    fn is_bank_enabled(&self, _bank: u8) -> bool {
        true
    }
    fn has_sample(&self, _bank: u8, _slot: u8) -> bool {
        true
    }
}

impl TrimEditor for NullHost {
    fn nudge_trim_size(&mut self, _bank: u8, _slot: u8, _delta: i32) {}
    fn nudge_trim_start(&mut self, _bank: u8, _slot: u8, _delta: i32) {}
    fn set_sample_gain(&mut self, _bank: u8, _slot: u8, _gain: f32) {}
}

fn new_engine() -> ControlEngine {
    ControlEngine::new(EngineConfig::default(), SystemCalibrations::default()).unwrap()
}

/// A frame that sweeps every input a little each tick
fn sweep_frame(step: u32) -> AdcFrame {
    let value = ((step * 37) % 4096) as u16;
    let mut frame = AdcFrame::at_rest();
    frame.pots.fill(value);
    frame.cvs.fill(4095 - value);
    frame
}

// ============================================================================
// Full Tick
// ============================================================================

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/tick");
    group.throughput(Throughput::Elements(1));

    group.bench_function("at_rest", |b| {
        let mut engine = new_engine();
        let mut host = NullHost;
        let frame = AdcFrame::at_rest();
        b.iter(|| engine.tick(black_box(&frame), &mut host));
    });

    group.bench_function("sweeping", |b| {
        let mut engine = new_engine();
        let mut host = NullHost;
        let mut step = 0u32;
        b.iter(|| {
            step = step.wrapping_add(1);
            engine.tick(black_box(&sweep_frame(step)), &mut host)
        });
    });

    group.bench_function("gestures_held", |b| {
        let mut engine = new_engine();
        let mut host = NullHost;
        for button in [
            Button::Bank(PlayChannel::One),
            Button::Reverse(PlayChannel::Two),
            Button::RecBank,
        ] {
            engine.press(button);
        }
        engine.set_quantize(PlayChannel::One, true);
        let mut step = 0u32;
        b.iter(|| {
            step = step.wrapping_add(1);
            engine.tick(black_box(&sweep_frame(step)), &mut host)
        });
    });

    group.bench_function("edit_mode", |b| {
        let mut engine = new_engine();
        let mut host = NullHost;
        engine.set_edit_mode(true);
        let mut step = 0u32;
        b.iter(|| {
            step = step.wrapping_add(1);
            engine.tick(black_box(&sweep_frame(step)), &mut host)
        });
    });

    group.finish();
}

// ============================================================================
// Stages
// ============================================================================

fn bench_conditioning(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/conditioning");
    let config = EngineConfig::default();
    let cal = SystemCalibrations::default();

    group.bench_function("pots", |b| {
        let mut pots = PotConditioner::new(&config);
        let mut step = 0u32;
        b.iter(|| {
            step = step.wrapping_add(1);
            pots.process(black_box(&sweep_frame(step).pots));
        });
    });

    for (name, config) in [
        ("fast_adc", EngineConfig::fast_adc()),
        ("classic_adc", EngineConfig::classic_adc()),
    ] {
        group.bench_with_input(BenchmarkId::new("cvs", name), &config, |b, config| {
            let mut cvs = CvConditioner::new(config);
            let mut step = 0u32;
            b.iter(|| {
                step = step.wrapping_add(1);
                cvs.process(black_box(&sweep_frame(step).cvs), &cal, false);
            });
        });
    }

    group.finish();
}

fn bench_quantizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/quantizers");
    group.throughput(Throughput::Elements(4096));

    group.bench_function("detent", |b| {
        b.iter(|| (0..4096).map(|adc| detent(black_box(adc)) as u32).sum::<u32>());
    });

    group.bench_function("detent_antihys", |b| {
        b.iter(|| {
            let mut current = 0;
            for adc in 0..4096 {
                current = detent_antihys(black_box(adc), current);
            }
            current
        });
    });

    group.bench_function("quantized_semitone_voct", |b| {
        b.iter(|| (0..4096).map(|adc| quantized_semitone_voct(black_box(adc))).sum::<f32>());
    });

    group.bench_function("tracking_compensation", |b| {
        b.iter(|| {
            (0..4096)
                .map(|adc| apply_tracking_compensation(black_box(adc), 1.013))
                .sum::<i32>()
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(tick_benches, bench_tick);

criterion_group!(stage_benches, bench_conditioning, bench_quantizers);

criterion_main!(tick_benches, stage_benches);
