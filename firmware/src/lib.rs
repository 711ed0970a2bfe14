#![no_std]

//! Firmware library exposing bring-up hardware and embassy tasks

pub use embassy_executor::Spawner;
pub use embassy_time::Duration;
pub use heapless::spsc::Queue;
pub use static_cell::StaticCell;

pub use watch_core::*;

pub use crate::bringup_hardware::*;
pub use crate::radio_link::*;
pub use crate::tasks::*;

/// Stand-in hardware that logs instead of driving pins.
///
/// Used while bringing up a board whose LCD, buzzer or radio driver is
/// not wired in yet, and by the host-side tests.
pub mod bringup_hardware {
    use watch_core::hal::{
        Edge, HalError, RadioCore, RadioHal, RadioInterrupt, SegmentDisplay, ToneGenerator,
        WatchHal,
    };
    use watch_core::types::{Strobe, PACKET_IRQ_FLAG};

    /// LCD stand-in
    #[derive(Debug, Default)]
    pub struct LogDisplay {
        digits: [Option<u8>; 8],
        colon: bool,
        plus: bool,
    }

    impl LogDisplay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn digit(&self, position: u8) -> Option<u8> {
            self.digits.get(position as usize).copied().flatten()
        }

        pub fn colon(&self) -> bool {
            self.colon
        }

        pub fn plus(&self) -> bool {
            self.plus
        }
    }

    impl SegmentDisplay for LogDisplay {
        fn set_digit(&mut self, position: u8, value: u8) {
            if let Some(slot) = self.digits.get_mut(position as usize) {
                *slot = Some(value & 0x0F);
            }
            #[cfg(feature = "defmt")]
            defmt::trace!("lcd[{}] = {}", position, value);
        }

        fn clear_digit(&mut self, position: u8) {
            if let Some(slot) = self.digits.get_mut(position as usize) {
                *slot = None;
            }
        }

        fn set_colon(&mut self, on: bool) {
            self.colon = on;
        }

        fn set_plus(&mut self, on: bool) {
            self.plus = on;
        }

        fn zero(&mut self) {
            self.digits = [None; 8];
            self.colon = false;
            self.plus = false;
        }
    }

    /// Buzzer stand-in; every tone finishes on the first poll
    #[derive(Debug, Default)]
    pub struct LogBuzzer {
        played: u32,
    }

    impl LogBuzzer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn played(&self) -> u32 {
            self.played
        }
    }

    impl ToneGenerator for LogBuzzer {
        fn tone(&mut self, frequency_hz: u16, duration: u16) -> bool {
            #[cfg(feature = "defmt")]
            defmt::info!("🔔 Tone {} Hz for {}", frequency_hz, duration);
            #[cfg(not(feature = "defmt"))]
            let _ = (frequency_hz, duration);
            self.played = self.played.wrapping_add(1);
            false
        }
    }

    /// Watch host stand-in
    #[derive(Debug, Default)]
    pub struct BringupWatchHal {
        pub display: LogDisplay,
        pub buzzer: LogBuzzer,
        pub idle_clears: u32,
    }

    impl BringupWatchHal {
        pub fn new() -> Self {
            #[cfg(feature = "defmt")]
            defmt::info!("🧪 Using bring-up watch hardware");
            Self::default()
        }
    }

    impl WatchHal for BringupWatchHal {
        type Display = LogDisplay;
        type Buzzer = LogBuzzer;

        fn display(&mut self) -> &mut LogDisplay {
            &mut self.display
        }

        fn buzzer(&mut self) -> &mut LogBuzzer {
            &mut self.buzzer
        }

        fn clear_idle_timer(&mut self) {
            self.idle_clears = self.idle_clears.wrapping_add(1);
        }

        fn draw_time_of_day(&mut self, _forced: bool) {
            #[cfg(feature = "defmt")]
            defmt::debug!("🕒 Time of day");
        }
    }

    /// Radio stand-in with an empty FIFO.
    ///
    /// Interrupt vectors are latched with [`BringupRadio::latch_packet_irq`].
    #[derive(Debug, Default)]
    pub struct BringupRadio {
        vector: u16,
        enabled: bool,
        sleep_resumes: u32,
    }

    impl BringupRadio {
        pub fn new() -> Self {
            #[cfg(feature = "defmt")]
            defmt::info!("🧪 Using bring-up radio (no transceiver attached)");
            Self::default()
        }

        /// Latch the packet-boundary interrupt as the pending vector
        pub fn latch_packet_irq(&mut self) {
            self.vector = (PACKET_IRQ_FLAG as u16 + 1) * 2;
        }

        pub fn is_enabled(&self) -> bool {
            self.enabled
        }

        pub fn sleep_resumes(&self) -> u32 {
            self.sleep_resumes
        }
    }

    impl RadioCore for BringupRadio {
        fn strobe(&mut self, strobe: Strobe) -> Result<(), HalError> {
            #[cfg(feature = "defmt")]
            defmt::debug!("📻 Strobe {:?}", strobe);
            #[cfg(not(feature = "defmt"))]
            let _ = strobe;
            Ok(())
        }

        fn read_register(&mut self, _addr: u8) -> Result<u8, HalError> {
            Ok(0)
        }

        fn read_burst(&mut self, _addr: u8, buffer: &mut [u8]) -> Result<(), HalError> {
            buffer.fill(0);
            Ok(())
        }

        fn write_burst(&mut self, _addr: u8, data: &[u8]) -> Result<(), HalError> {
            #[cfg(feature = "defmt")]
            defmt::debug!("📡 TX FIFO <- {} bytes", data.len());
            #[cfg(not(feature = "defmt"))]
            let _ = data;
            Ok(())
        }
    }

    impl RadioInterrupt for BringupRadio {
        fn set_edge(&mut self, _edge: Edge) -> Result<(), HalError> {
            Ok(())
        }

        fn clear_pending(&mut self) -> Result<(), HalError> {
            Ok(())
        }

        fn enable(&mut self, enable: bool) -> Result<(), HalError> {
            self.enabled = enable;
            Ok(())
        }

        fn take_vector(&mut self) -> u16 {
            core::mem::take(&mut self.vector)
        }

        fn resume_low_power(&mut self) {
            self.sleep_resumes = self.sleep_resumes.wrapping_add(1);
        }
    }

    impl RadioHal for BringupRadio {
        type Core = BringupRadio;
        type Irq = BringupRadio;

        fn core(&mut self) -> &mut BringupRadio {
            self
        }

        fn irq(&mut self) -> &mut BringupRadio {
            self
        }
    }
}

/// Hand-off from the radio interrupt vector to the foreground
pub mod radio_link {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::signal::Signal;
    use heapless::spsc::Producer;
    use watch_core::hal::RadioHal;
    use watch_core::packet::{PacketRadio, RadioError};
    use watch_core::types::{InterruptOutcome, PACKET_LEN};

    /// Raised by the radio interrupt vector
    pub static RADIO_IRQ: Signal<CriticalSectionRawMutex, ()> = Signal::new();

    /// Call from the radio interrupt handler
    pub fn on_radio_irq() {
        RADIO_IRQ.signal(());
    }

    /// A received packet copied out of the engine's buffer
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Frame {
        pub payload: heapless::Vec<u8, PACKET_LEN>,
        pub rssi_dbm: i16,
        pub lqi: u8,
        pub crc_ok: bool,
    }

    /// Wait for one radio interrupt and service it.
    ///
    /// A completed reception is copied into `frames`; when the queue is
    /// full the frame is dropped and the outcome still reported.
    pub async fn service_radio_interrupt<H: RadioHal, const N: usize>(
        signal: &Signal<CriticalSectionRawMutex, ()>,
        radio: &mut PacketRadio,
        hal: &mut H,
        frames: &mut Producer<'_, Frame, N>,
    ) -> Result<InterruptOutcome, RadioError> {
        signal.wait().await;
        let outcome = radio.on_interrupt(hal)?;

        if let InterruptOutcome::Received { .. } = outcome {
            if let Some(packet) = radio.received() {
                let frame = Frame {
                    payload: heapless::Vec::from_slice(packet.payload()).unwrap_or_default(),
                    rssi_dbm: packet.rssi_dbm(),
                    lqi: packet.lqi(),
                    crc_ok: packet.crc_ok(),
                };
                if frames.enqueue(frame).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Frame queue full, packet dropped");
                }
            }
        }

        Ok(outcome)
    }
}

/// Embassy tasks module
pub mod tasks {
    use heapless::spsc::{Consumer, Producer, Queue};
    use static_cell::StaticCell;
    use watch_core::controller::KeypadInput;
    use watch_core::packet::PacketRadio;
    use watch_core::stopwatch::StopwatchEngine;

    use crate::bringup_hardware::{BringupRadio, BringupWatchHal};
    use crate::radio_link::{service_radio_interrupt, Frame, RADIO_IRQ};

    /// Depth of the received-frame queue
    pub const FRAME_QUEUE_LEN: usize = 4;

    static FRAME_QUEUE: StaticCell<Queue<Frame, FRAME_QUEUE_LEN>> = StaticCell::new();

    /// Split the static frame queue. Returns `None` after the first call.
    pub fn frame_queue() -> Option<(
        Producer<'static, Frame, FRAME_QUEUE_LEN>,
        Consumer<'static, Frame, FRAME_QUEUE_LEN>,
    )> {
        FRAME_QUEUE.try_init(Queue::new()).map(|queue| queue.split())
    }

    /// Stopwatch tick task wrapper
    #[embassy_executor::task]
    pub async fn stopwatch_task(keypad: &'static KeypadInput, hal: &'static mut BringupWatchHal) {
        #[cfg(feature = "defmt")]
        defmt::info!("⏱️ Stopwatch task started");

        let mut engine = StopwatchEngine::new(watch_core::default_stopwatch_config());
        watch_core::stopwatch::tick_task(keypad, &mut engine, hal).await;
    }

    /// Radio receive loop
    #[embassy_executor::task]
    pub async fn radio_task(
        hal: &'static mut BringupRadio,
        mut frames: Producer<'static, Frame, FRAME_QUEUE_LEN>,
    ) {
        #[cfg(feature = "defmt")]
        defmt::info!("📻 Radio task started");

        let mut radio = PacketRadio::new(watch_core::default_radio_config());
        if let Err(_e) = radio.start_receive(hal) {
            #[cfg(feature = "defmt")]
            defmt::error!("Receiver did not start: {:?}", _e);
        }

        loop {
            match service_radio_interrupt(&RADIO_IRQ, &mut radio, hal, &mut frames).await {
                Ok(_outcome) => {
                    #[cfg(feature = "defmt")]
                    if _outcome.is_anomaly() {
                        defmt::warn!("Radio anomaly: {:?}", _outcome);
                    } else {
                        defmt::trace!("Radio: {:?}", _outcome);
                    }
                }
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Radio service failed: {:?}", _e);
                }
            }

            // Back to listening once a transmission has completed
            if radio.mode() == watch_core::types::RadioMode::Idle {
                if let Err(_e) = radio.start_receive(hal) {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Receiver did not restart: {:?}", _e);
                }
            }
        }
    }
}
