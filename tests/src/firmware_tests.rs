//! Async hand-off from the radio interrupt to the foreground

use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::spsc::Queue;
use watch_core::hal::mock::MockRadio;
use watch_core::*;
use watch_firmware::{frame_queue, service_radio_interrupt, BringupRadio, BringupWatchHal, Frame};

fn listening() -> (PacketRadio, MockRadio) {
    let mut hal = MockRadio::new();
    let mut radio = PacketRadio::new(default_radio_config());
    radio.start_receive(&mut hal).unwrap();
    (radio, hal)
}

#[tokio::test]
async fn test_received_packet_is_queued() {
    let signal = Signal::<CriticalSectionRawMutex, ()>::new();
    let mut queue: Queue<Frame, 4> = Queue::new();
    let (mut producer, mut consumer) = queue.split();
    let (mut radio, mut hal) = listening();

    hal.deliver(b"tick", 0xEC, 0xAD);
    signal.signal(());
    let outcome = service_radio_interrupt(&signal, &mut radio, &mut hal, &mut producer)
        .await
        .unwrap();

    assert_eq!(outcome, InterruptOutcome::Received { length: 4 });
    let frame = consumer.dequeue().unwrap();
    assert_eq!(frame.payload.as_slice(), b"tick");
    assert_eq!(frame.rssi_dbm, -84);
    assert_eq!(frame.lqi, 0x2D);
    assert!(frame.crc_ok);
    assert!(consumer.dequeue().is_none());
}

#[tokio::test]
async fn test_service_waits_for_the_interrupt() {
    let signal = Signal::<CriticalSectionRawMutex, ()>::new();
    let mut queue: Queue<Frame, 4> = Queue::new();
    let (mut producer, mut consumer) = queue.split();
    let (mut radio, mut hal) = listening();
    hal.deliver(b"late", 0x00, 0x80);

    let raise = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.signal(());
    };
    let serviced = service_radio_interrupt(&signal, &mut radio, &mut hal, &mut producer);
    let ((), outcome) = tokio::join!(raise, serviced);

    assert_eq!(outcome.unwrap(), InterruptOutcome::Received { length: 4 });
    assert_eq!(consumer.dequeue().unwrap().payload.as_slice(), b"late");
}

#[tokio::test]
async fn test_full_queue_drops_frame_but_reports_outcome() {
    let signal = Signal::<CriticalSectionRawMutex, ()>::new();
    // heapless spsc keeps one slot free
    let mut queue: Queue<Frame, 2> = Queue::new();
    let (mut producer, mut consumer) = queue.split();
    let (mut radio, mut hal) = listening();

    for payload in [&b"one"[..], &b"two"[..]] {
        hal.deliver(payload, 0x00, 0x80);
        signal.signal(());
        let outcome = service_radio_interrupt(&signal, &mut radio, &mut hal, &mut producer)
            .await
            .unwrap();
        assert_eq!(outcome, InterruptOutcome::Received { length: 3 });
    }

    assert_eq!(consumer.dequeue().unwrap().payload.as_slice(), b"one");
    assert!(consumer.dequeue().is_none());
}

#[tokio::test]
async fn test_transmit_completion_queues_nothing() {
    let signal = Signal::<CriticalSectionRawMutex, ()>::new();
    let mut queue: Queue<Frame, 4> = Queue::new();
    let (mut producer, mut consumer) = queue.split();
    let mut hal = MockRadio::new();
    let mut radio = PacketRadio::new(default_radio_config());

    radio.transmit(b"out", &mut hal).unwrap();
    hal.raise(PACKET_IRQ_FLAG);
    signal.signal(());
    let outcome = service_radio_interrupt(&signal, &mut radio, &mut hal, &mut producer)
        .await
        .unwrap();

    assert_eq!(outcome, InterruptOutcome::Transmitted);
    assert!(consumer.dequeue().is_none());
}

#[test]
fn test_bringup_radio_reports_stray_interrupt() {
    let mut hal = BringupRadio::new();
    let mut radio = PacketRadio::new(default_radio_config());

    hal.latch_packet_irq();
    assert_eq!(radio.on_interrupt(&mut hal).unwrap(), InterruptOutcome::Unexpected);
    assert_eq!(hal.sleep_resumes(), 1);

    // Vector was consumed
    assert!(matches!(
        radio.on_interrupt(&mut hal).unwrap(),
        InterruptOutcome::Ignored(IrqSource::None)
    ));
}

#[test]
fn test_bringup_watch_paints_zeroes() {
    let mut hal = BringupWatchHal::new();
    let mut engine = StopwatchEngine::new(default_stopwatch_config());
    engine.init(&mut hal);

    for position in [0u8, 1, 3, 4, 6, 7] {
        assert_eq!(hal.display.digit(position), Some(0));
    }
    assert!(!hal.display.colon());
    assert_eq!(hal.idle_clears, 1);
}

#[test]
fn test_bringup_buzzer_never_blocks() {
    let mut config = default_stopwatch_config();
    config.default_alarm = HmsTime { hours: 0, minutes: 0, seconds: 1 };
    let mut hal = BringupWatchHal::new();
    let mut engine = StopwatchEngine::new(config);
    engine.init(&mut hal);
    engine.keypress(Key::Digit(4));
    engine.keypress(Key::Plus);
    for _ in 0..4 {
        engine.draw(false, &mut hal);
    }

    assert_eq!(hal.buzzer.played(), 4);
}

#[test]
fn test_static_frame_queue_splits_once() {
    let (mut producer, mut consumer) = frame_queue().unwrap();
    assert!(frame_queue().is_none());

    let frame = Frame {
        payload: heapless::Vec::from_slice(b"hi").unwrap(),
        rssi_dbm: -74,
        lqi: 0,
        crc_ok: true,
    };
    producer.enqueue(frame.clone()).unwrap();
    assert_eq!(consumer.dequeue(), Some(frame));
}
