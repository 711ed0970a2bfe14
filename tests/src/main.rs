// Host-side walkthrough of the stopwatch and packet radio engines

use watch_core::hal::mock::MockWatchHal;
use watch_core::test_utils::display::snapshot;
use watch_core::test_utils::radio_link::Link;
use watch_core::test_utils::scenario::{enter_alarm, press, run_seconds, run_ticks};
use watch_core::*;

fn main() {
    println!("🧪 Watch Integration Walkthrough (core v{})", VERSION);

    // Scenario 1: count, stop, clear
    stopwatch_session();

    // Scenario 2: alarm entry and melody
    alarm_session();

    // Scenario 3: one packet over a mock link
    radio_session();

    println!("✅ All walkthrough scenarios passed!");
    println!();
    println!("📝 Run the full suite with: cargo test");
}

fn stopwatch_session() {
    println!("⏱️ Stopwatch session...");

    let mut hal = MockWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);
    println!("  start    {}", snapshot(&hal.display));

    press(&mut engine, &mut hal, Key::Plus);
    run_ticks(&mut engine, &mut hal, 250);
    println!("  62.5 s   {}", snapshot(&hal.display));
    assert_eq!(engine.elapsed(), HmsTime { hours: 0, minutes: 1, seconds: 2 });

    run_seconds(&mut engine, &mut hal, 3_600);
    println!("  +1 h     {}", snapshot(&hal.display));
    assert_eq!(engine.elapsed().hours, 1);

    press(&mut engine, &mut hal, Key::Plus);
    press(&mut engine, &mut hal, Key::Digit(0));
    println!("  cleared  {}", snapshot(&hal.display));
    assert_eq!(engine.elapsed(), HmsTime::ZERO);

    println!("  ✅ Counting, stop and clear working");
}

fn alarm_session() {
    println!("🔔 Alarm session...");

    let mut hal = MockWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);

    enter_alarm(&mut engine, &mut hal, [0, 0, 0, 0, 0, 5]);
    press(&mut engine, &mut hal, Key::Digit(4));
    println!("  alarm    {:?} enabled={}", engine.alarm(), engine.is_alarm_enabled());

    press(&mut engine, &mut hal, Key::Plus);
    run_seconds(&mut engine, &mut hal, 6);
    assert_eq!(hal.buzzer.played.len(), DEFAULT_ALARM_TONES.len());

    for tone in hal.buzzer.played.iter() {
        println!("    {} Hz x {}", tone.frequency_hz, tone.duration);
    }
    println!("  ✅ Alarm melody played once");
}

fn radio_session() {
    println!("📡 Radio session...");

    let mut link = Link::new(
        PacketRadio::new(default_radio_config()),
        PacketRadio::new(default_radio_config()),
    );

    if let Err(e) = link.b.engine.start_receive(&mut link.b.hal) {
        panic!("receiver did not start: {}", e);
    }
    if let Err(e) = link.a.engine.transmit(b"73 de watch", &mut link.a.hal) {
        panic!("transmit refused: {}", e);
    }

    match link.air_a_to_b(0xEC, 0xAD) {
        Ok((at_a, at_b)) => println!("  A: {:?}  B: {:?}", at_a, at_b),
        Err(e) => panic!("link failed: {}", e),
    }

    match link.b.engine.received() {
        Some(packet) => {
            println!(
                "  payload {:?} rssi {} dBm lqi {} crc {}",
                core::str::from_utf8(packet.payload()).unwrap_or("<binary>"),
                packet.rssi_dbm(),
                packet.lqi(),
                if packet.crc_ok() { "ok" } else { "bad" },
            );
            assert_eq!(packet.payload(), b"73 de watch");
        }
        None => panic!("nothing received"),
    }

    println!("  ✅ Packet crossed the link");
}
