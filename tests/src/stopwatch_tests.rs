//! Stopwatch behaviour driven through the scripted scenario helpers

use proptest::prelude::*;
use rstest::rstest;
use watch_core::hal::mock::MockWatchHal;
use watch_core::test_utils::display::snapshot;
use watch_core::test_utils::scenario::{enter_alarm, press, run_seconds, run_ticks};
use watch_core::*;

fn started() -> (StopwatchEngine, MockWatchHal) {
    let mut hal = MockWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);
    press(&mut engine, &mut hal, Key::Plus);
    (engine, hal)
}

#[rstest]
#[case(3, HmsTime { hours: 0, minutes: 0, seconds: 0 })]
#[case(4, HmsTime { hours: 0, minutes: 0, seconds: 1 })]
#[case(240, HmsTime { hours: 0, minutes: 1, seconds: 0 })]
#[case(14_399, HmsTime { hours: 0, minutes: 59, seconds: 59 })]
#[case(14_400, HmsTime { hours: 1, minutes: 0, seconds: 0 })]
#[case(14_404, HmsTime { hours: 1, minutes: 0, seconds: 1 })]
fn test_elapsed_after_ticks(#[case] ticks: u32, #[case] expected: HmsTime) {
    let (mut engine, mut hal) = started();
    run_ticks(&mut engine, &mut hal, ticks);
    assert_eq!(engine.elapsed(), expected);
}

#[test]
fn test_display_reads_minutes_seconds_hundredths() {
    let (mut engine, mut hal) = started();
    run_ticks(&mut engine, &mut hal, 250);

    // 62.5 s; quarter count 250 has the colon phase on
    assert_eq!(snapshot(&hal.display), "01:02.50");
}

#[test]
fn test_display_switches_to_hours_layout() {
    let (mut engine, mut hal) = started();
    run_seconds(&mut engine, &mut hal, 3_723);

    // 1:02:03, quarter count a multiple of four so the colon is off
    assert_eq!(snapshot(&hal.display), "01 02.03");
}

#[rstest]
#[case(vec![Key::Divide, Key::Release, Key::Divide, Key::Release])]
#[case(vec![Key::Digit(4), Key::Release, Key::Digit(4), Key::Release])]
#[case(vec![Key::Minus, Key::Dot, Key::Other(b'x')])]
fn test_keys_never_advance_the_count(#[case] keys: Vec<Key>) {
    let (mut engine, mut hal) = started();
    run_ticks(&mut engine, &mut hal, 6);

    for key in keys {
        press(&mut engine, &mut hal, key);
    }
    assert_eq!(engine.quarter_ticks(), 6);
    assert!(engine.is_counting());
}

#[test]
fn test_default_config_loads_three_minute_alarm() {
    let config = default_stopwatch_config();
    assert_eq!(config.default_alarm, DEFAULT_ALARM);
    assert_eq!(config.default_alarm, HmsTime { hours: 0, minutes: 3, seconds: 0 });

    let engine = StopwatchEngine::new(config);
    assert_eq!(engine.alarm(), DEFAULT_ALARM);
    assert!(!engine.is_alarm_enabled());
}

#[test]
fn test_stop_freezes_the_count() {
    let (mut engine, mut hal) = started();
    run_seconds(&mut engine, &mut hal, 5);
    assert_eq!(press(&mut engine, &mut hal, Key::Plus), KeyOutcome::Redraw);

    run_seconds(&mut engine, &mut hal, 5);
    assert_eq!(engine.elapsed().total_seconds(), 5);
    assert!(!engine.is_counting());
}

#[test]
fn test_alarm_plays_the_configured_melody() {
    let mut hal = MockWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);

    enter_alarm(&mut engine, &mut hal, [0, 0, 0, 0, 1, 0]);
    press(&mut engine, &mut hal, Key::Digit(4));
    press(&mut engine, &mut hal, Key::Plus);
    run_seconds(&mut engine, &mut hal, 11);

    assert!(engine.is_alarm_enabled());
    assert_eq!(hal.buzzer.played.as_slice(), &DEFAULT_ALARM_TONES[..]);
}

#[test]
fn test_entry_shows_alarm_then_restores_elapsed() {
    let mut hal = MockWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);

    press(&mut engine, &mut hal, Key::Equals);
    assert_eq!(engine.cursor(), DigitCursor::Hour1);
    // First entry frame blanks the digit under the cursor
    assert_eq!(hal.display.digit(7), None);
    assert_eq!(hal.display.pair(4, 3), Some(3));

    press(&mut engine, &mut hal, Key::Equals);
    assert_eq!(engine.cursor(), DigitCursor::Off);
    assert_eq!(snapshot(&hal.display), "00 00.00");
}

proptest! {
    #[test]
    fn prop_elapsed_tracks_quarter_ticks(ticks in 0u32..20_000) {
        let (mut engine, mut hal) = started();
        run_ticks(&mut engine, &mut hal, ticks);
        prop_assert_eq!(engine.elapsed().total_seconds(), ticks / 4);
        prop_assert_eq!(engine.quarter_ticks() as u32, ticks);
    }

    #[test]
    fn prop_entered_alarm_is_always_a_valid_time(digits in prop::array::uniform6(0u8..10)) {
        let mut hal = MockWatchHal::new();
        let mut engine = StopwatchEngine::new(default_stopwatch_config());
        engine.init(&mut hal);
        enter_alarm(&mut engine, &mut hal, digits);

        let alarm = engine.alarm();
        prop_assert!(alarm.minutes <= 59);
        prop_assert!(alarm.seconds <= 59);
        prop_assert_eq!(alarm.hours, digits[0] as u16 * 10 + digits[1] as u16);
        if digits[2] <= 5 && digits[4] <= 5 {
            prop_assert_eq!(alarm.minutes, digits[2] * 10 + digits[3]);
            prop_assert_eq!(alarm.seconds, digits[4] * 10 + digits[5]);
        }
        prop_assert_eq!(engine.cursor(), DigitCursor::Off);
    }
}
