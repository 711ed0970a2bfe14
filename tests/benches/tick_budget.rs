//! Per-interrupt cost of the stopwatch tick and the packet read path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use watch_core::hal::mock::{MockRadio, MockWatchHal};
use watch_core::*;

fn stopwatch_tick(c: &mut Criterion) {
    let mut hal = MockWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);
    engine.keypress(Key::Plus);

    c.bench_function("stopwatch_draw_tick", |b| {
        b.iter(|| engine.draw(black_box(false), &mut hal))
    });

    c.bench_function("stopwatch_forced_redraw", |b| {
        b.iter(|| engine.render(black_box(true), &mut hal.display))
    });
}

fn packet_receive(c: &mut Criterion) {
    let payload = [0xA5u8; PACKET_LEN];
    let mut hal = MockRadio::new();
    let mut radio = PacketRadio::new(default_radio_config());
    if radio.start_receive(&mut hal).is_err() {
        return;
    }

    c.bench_function("packet_receive_full_length", |b| {
        b.iter(|| {
            hal.deliver(black_box(&payload), 0xEC, 0xAD);
            radio.on_interrupt(&mut hal)
        })
    });
}

criterion_group!(benches, stopwatch_tick, packet_receive);
criterion_main!(benches);
