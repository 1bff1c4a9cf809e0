//! # Control Tick Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use comms_if::eqpt::{
    mcu::Orientation,
    vision::{LineSignal, TurnMarker},
};
use rescue_lib::{
    bus::Bus,
    clock::SimClock,
    mixer::{Mixer, MixerParams, MotionCmd},
    scheduler::Scheduler,
};

fn tick_benchmark(c: &mut Criterion) {
    // ---- Build a bus with fresh perception and telemetry ----

    let clock = SimClock::new(0.0);
    let bus = Bus::new();

    bus.vision_port().set_line(LineSignal {
        found: true,
        lateral_error: 0.3,
        turn_marker: TurnMarker::Straight,
    });
    let telemetry = bus.telemetry_port(Arc::new(clock.clone()));

    let mut scheduler = Scheduler::with_defaults(&bus, Arc::new(clock.clone())).unwrap();

    c.bench_function("Scheduler::tick", |b| {
        b.iter(|| {
            clock.advance(0.02);
            telemetry.set_orientation(Orientation::default());
            black_box(scheduler.tick())
        })
    });

    let mixer = Mixer::new(MixerParams::default()).unwrap();
    let cmd = MotionCmd::new(0.2, 0.8, -0.4);

    c.bench_function("Mixer::mix_to_wheels", |b| {
        b.iter(|| mixer.mix_to_wheels(black_box(&cmd)))
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
