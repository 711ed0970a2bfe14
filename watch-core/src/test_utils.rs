//! Test utilities for the stopwatch and packet radio engines

#[cfg(feature = "test-utils")]
pub mod scenario {
    //! Scripted stopwatch sessions

    use crate::hal::WatchHal;
    use crate::stopwatch::StopwatchEngine;
    use crate::types::{Key, KeyOutcome, TICKS_PER_SECOND};

    /// Deliver a key the way the host dispatcher does: redraw when asked
    pub fn press<H: WatchHal>(engine: &mut StopwatchEngine, hal: &mut H, key: Key) -> KeyOutcome {
        let outcome = engine.keypress(key);
        if outcome.needs_redraw() {
            engine.repaint(hal);
        }
        outcome
    }

    /// Run `n` periodic (unforced) display ticks
    pub fn run_ticks<H: WatchHal>(engine: &mut StopwatchEngine, hal: &mut H, n: u32) {
        for _ in 0..n {
            engine.draw(false, hal);
        }
    }

    /// Run whole seconds worth of ticks
    pub fn run_seconds<H: WatchHal>(engine: &mut StopwatchEngine, hal: &mut H, seconds: u32) {
        run_ticks(engine, hal, seconds * TICKS_PER_SECOND as u32);
    }

    /// Program the alarm with six digits (hhmmss) from a stopped stopwatch
    pub fn enter_alarm<H: WatchHal>(engine: &mut StopwatchEngine, hal: &mut H, digits: [u8; 6]) {
        press(engine, hal, Key::Equals);
        for d in digits {
            press(engine, hal, Key::Digit(d));
        }
    }
}

#[cfg(feature = "test-utils")]
pub mod display {
    //! Human-readable LCD snapshots

    use crate::hal::mock::MockDisplay;
    use std::string::String;

    /// Render the mock LCD as text, highest position first.
    ///
    /// Blank digits show as `_`; the colon sits between positions 5 and 4.
    pub fn snapshot(display: &MockDisplay) -> String {
        let mut out = String::new();
        for position in (0..8u8).rev() {
            match position {
                2 | 5 => {}
                _ => match display.digit(position) {
                    Some(v) => out.push(char::from(b'0' + v)),
                    None => out.push('_'),
                },
            }
            if position == 5 {
                out.push(if display.colon { ':' } else { ' ' });
            }
            if position == 2 {
                out.push('.');
            }
        }
        out
    }
}

#[cfg(feature = "test-utils")]
pub mod radio_link {
    //! Two mock radios wired back to back

    use crate::hal::mock::MockRadio;
    use crate::packet::PacketRadio;
    use crate::types::{InterruptOutcome, RadioMode, Strobe};
    use crate::RadioError;

    /// One end of the link
    pub struct Station {
        pub engine: PacketRadio,
        pub hal: MockRadio,
    }

    impl Station {
        pub fn new(engine: PacketRadio) -> Self {
            Self { engine, hal: MockRadio::new() }
        }
    }

    /// Carries whatever one station puts on air to the other
    pub struct Link {
        pub a: Station,
        pub b: Station,
    }

    impl Link {
        pub fn new(a: PacketRadio, b: PacketRadio) -> Self {
            Self { a: Station::new(a), b: Station::new(b) }
        }

        /// Put the packet in A's TX FIFO on air.
        ///
        /// Returns the interrupt outcomes at A (end of TX) and at B
        /// (end of RX, only when B is listening).
        pub fn air_a_to_b(
            &mut self,
            rssi: u8,
            lqi: u8,
        ) -> Result<(InterruptOutcome, Option<InterruptOutcome>), RadioError> {
            let keyed = self.a.hal.strobes.last() == Some(&Strobe::Tx);
            let payload = self.a.hal.tx_fifo.clone();

            let mut at_b = None;
            if keyed && self.b.engine.mode() == RadioMode::Receiving {
                self.b.hal.deliver(&payload, rssi, lqi);
                at_b = Some(self.b.engine.on_interrupt(&mut self.b.hal)?);
            }

            self.a.hal.raise(crate::types::PACKET_IRQ_FLAG);
            let at_a = self.a.engine.on_interrupt(&mut self.a.hal)?;
            Ok((at_a, at_b))
        }
    }
}
