//! Quarter-second stopwatch with a settable alarm

use crate::hal::{SegmentDisplay, ToneGenerator, WatchHal};
use crate::types::{
    Bcd, Command, DigitCursor, HmsTime, Key, KeyOutcome, StopwatchConfig, SUBSECOND_BCD,
    TICKS_PER_SECOND,
};

/// What a single tick did to the decomposed time
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TickReport {
    /// A second was carried on this tick
    pub second: bool,
    /// Seconds rolled over into minutes
    pub minute: bool,
    /// Minutes rolled over into hours
    pub hour: bool,
    /// The alarm target was hit on this tick
    pub alarm: bool,
}

/// Stopwatch app state.
///
/// Time is counted by the display tick itself, four times per second, in a
/// 16-bit quarter-second counter that wraps after about 4.5 hours. Hours,
/// minutes and seconds are kept separately so rendering never divides the
/// counter, and their BCD forms are only refreshed when a unit rolls over.
pub struct StopwatchEngine {
    config: StopwatchConfig,
    quarter_ticks: u16,
    elapsed: HmsTime,
    hours_bcd: Bcd,
    minutes_bcd: Bcd,
    seconds_bcd: Bcd,
    counting: bool,
    show_time_of_day: bool,
    alarm_enabled: bool,
    alarm: HmsTime,
    cursor: DigitCursor,
    flicker: bool,
    force_pending: bool,
}

impl StopwatchEngine {
    /// Create a stopped, zeroed stopwatch
    pub fn new(config: StopwatchConfig) -> Self {
        Self {
            config,
            quarter_ticks: 0,
            elapsed: HmsTime::ZERO,
            hours_bcd: Bcd::ZERO,
            minutes_bcd: Bcd::ZERO,
            seconds_bcd: Bcd::ZERO,
            counting: false,
            show_time_of_day: false,
            alarm_enabled: false,
            alarm: config.default_alarm,
            cursor: DigitCursor::Off,
            flicker: false,
            force_pending: false,
        }
    }

    /// App entry: zero everything and paint the whole display
    pub fn init<H: WatchHal>(&mut self, hal: &mut H) {
        *self = Self::new(self.config);
        self.draw(true, hal);
    }

    /// App exit. The stopwatch never holds on to the foreground.
    pub fn exit(&mut self) -> bool {
        false
    }

    /// Handle a key press or release
    pub fn keypress(&mut self, key: Key) -> KeyOutcome {
        if self.cursor.is_active() {
            return self.entry_keypress(key);
        }

        match Command::from_key(key) {
            Some(Command::StartStop) => self.counting = !self.counting,
            Some(Command::Clear) => {
                self.zero_count();
                self.show_time_of_day = false;
            }
            Some(Command::Peek) => self.show_time_of_day = true,
            Some(Command::EnterSet) => {
                if !self.counting {
                    self.cursor = DigitCursor::Hour1;
                    #[cfg(feature = "defmt")]
                    defmt::debug!("alarm entry started");
                }
            }
            Some(Command::ToggleAlarm) => self.alarm_enabled = !self.alarm_enabled,
            None => {
                self.show_time_of_day = false;
                return KeyOutcome::Redraw;
            }
        }

        // While counting, the tick redraws on its own cadence
        if self.counting {
            KeyOutcome::Deferred
        } else {
            KeyOutcome::Redraw
        }
    }

    fn entry_keypress(&mut self, key: Key) -> KeyOutcome {
        let digit = match key {
            Key::Equals => {
                self.finish_entry();
                return KeyOutcome::Redraw;
            }
            Key::Digit(d) if d <= 9 => d,
            _ => return KeyOutcome::Ignored,
        };

        let alarm = &mut self.alarm;
        match self.cursor {
            DigitCursor::Hour1 => alarm.hours = digit as u16 * 10 + alarm.hours % 10,
            DigitCursor::Hour2 => alarm.hours = alarm.hours - alarm.hours % 10 + digit as u16,
            DigitCursor::Min1 => alarm.minutes = (digit * 10 + alarm.minutes % 10).min(59),
            DigitCursor::Min2 => alarm.minutes = (alarm.minutes - alarm.minutes % 10 + digit).min(59),
            DigitCursor::Sec1 => alarm.seconds = (digit * 10 + alarm.seconds % 10).min(59),
            DigitCursor::Sec2 => alarm.seconds = (alarm.seconds - alarm.seconds % 10 + digit).min(59),
            DigitCursor::Off => {}
        }

        self.cursor = self.cursor.next();
        if !self.cursor.is_active() {
            self.finish_entry();
        }
        KeyOutcome::Redraw
    }

    fn finish_entry(&mut self) {
        self.cursor = DigitCursor::Off;
        self.refresh_bcd();
        self.force_pending = true;
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "alarm set to {}:{}:{}",
            self.alarm.hours,
            self.alarm.minutes,
            self.alarm.seconds
        );
    }

    /// Periodic display tick; also the time base while counting.
    pub fn draw<H: WatchHal>(&mut self, forced: bool, hal: &mut H) {
        // Counting must never be cut short by the platform idle timeout
        hal.clear_idle_timer();

        let pending = core::mem::take(&mut self.force_pending);
        let forced = forced || pending;

        if !self.cursor.is_active() {
            if !forced && !self.counting {
                return;
            }

            let report = self.on_tick();
            if report.alarm {
                self.sound_alarm(hal.buzzer());
            }

            if self.show_time_of_day {
                hal.draw_time_of_day(true);
                return;
            }
        }

        self.render(forced, hal.display());
    }

    /// Key-driven forced repaint.
    ///
    /// Unlike `draw`, never advances the count: only the periodic tick is
    /// a time base.
    pub fn repaint<H: WatchHal>(&mut self, hal: &mut H) {
        hal.clear_idle_timer();
        self.force_pending = false;

        if !self.cursor.is_active() && self.show_time_of_day {
            hal.draw_time_of_day(true);
            return;
        }

        self.render(true, hal.display());
    }

    /// Advance the count if running and carry into the decomposed time.
    ///
    /// Relies on the tick cadence: at most one carry per unit per call.
    pub fn on_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.counting {
            return report;
        }

        self.quarter_ticks = self.quarter_ticks.wrapping_add(1);
        if self.quarter_ticks % TICKS_PER_SECOND != 0 {
            return report;
        }

        report.second = true;
        self.elapsed.seconds += 1;
        self.seconds_bcd = Bcd::from_decimal(self.elapsed.seconds as u16);

        if self.elapsed.seconds >= 60 {
            self.elapsed.seconds -= 60;
            self.seconds_bcd = Bcd::from_decimal(self.elapsed.seconds as u16);
            self.elapsed.minutes += 1;
            self.minutes_bcd = Bcd::from_decimal(self.elapsed.minutes as u16);
            report.minute = true;
        }

        if self.elapsed.minutes >= 60 {
            self.elapsed.minutes -= 60;
            self.minutes_bcd = Bcd::from_decimal(self.elapsed.minutes as u16);
            self.elapsed.hours = self.elapsed.hours.wrapping_add(1);
            self.hours_bcd = Bcd::from_decimal(self.elapsed.hours);
            report.hour = true;
        }

        report.alarm = self.alarm_enabled && self.elapsed == self.alarm;
        report
    }

    /// Play the alarm melody, blocking until every tone has finished
    fn sound_alarm<B: ToneGenerator>(&self, buzzer: &mut B) {
        #[cfg(feature = "defmt")]
        defmt::info!("alarm at {}:{}:{}", self.alarm.hours, self.alarm.minutes, self.alarm.seconds);
        for tone in self.config.alarm_tones.iter() {
            while buzzer.tone(tone.frequency_hz, tone.duration) {}
        }
    }

    /// Paint the display from current state.
    ///
    /// Outside digit entry only the cells that can have changed are
    /// rewritten, unless `forced`.
    pub fn render<D: SegmentDisplay>(&mut self, forced: bool, display: &mut D) {
        if forced {
            display.zero();
        }

        display.set_plus(self.alarm_enabled);
        display.set_colon((self.quarter_ticks >> 1) & 1 == 1);

        if self.cursor.is_active() {
            self.render_entry(display);
            return;
        }

        if self.elapsed.hours != 0 {
            // hh:mm:ss
            put_pair(display, 1, self.seconds_bcd);
            if self.elapsed.seconds == 0 || forced {
                put_pair(display, 4, self.minutes_bcd);
                put_pair(display, 7, self.hours_bcd);
            }
        } else {
            // mm:ss.ss
            let sub = SUBSECOND_BCD[(self.quarter_ticks & 3) as usize];
            put_pair(display, 1, sub);
            if sub == Bcd::ZERO || self.quarter_ticks == 1 || forced {
                put_pair(display, 4, self.seconds_bcd);
                if self.elapsed.seconds == 0 || forced {
                    put_pair(display, 7, self.minutes_bcd);
                }
            }
        }
    }

    fn render_entry<D: SegmentDisplay>(&mut self, display: &mut D) {
        self.flicker = !self.flicker;

        put_pair(display, 1, Bcd::from_decimal(self.alarm.seconds as u16));
        put_pair(display, 4, Bcd::from_decimal(self.alarm.minutes as u16));
        put_pair(display, 7, Bcd::from_decimal(self.alarm.hours));

        if self.flicker {
            if let Some(position) = self.cursor.display_position() {
                display.clear_digit(position);
            }
        }
    }

    fn zero_count(&mut self) {
        self.quarter_ticks = 0;
        self.elapsed = HmsTime::ZERO;
        self.refresh_bcd();
    }

    fn refresh_bcd(&mut self) {
        self.hours_bcd = Bcd::from_decimal(self.elapsed.hours);
        self.minutes_bcd = Bcd::from_decimal(self.elapsed.minutes as u16);
        self.seconds_bcd = Bcd::from_decimal(self.elapsed.seconds as u16);
    }

    pub fn is_counting(&self) -> bool {
        self.counting
    }

    pub fn is_showing_time_of_day(&self) -> bool {
        self.show_time_of_day
    }

    pub fn quarter_ticks(&self) -> u16 {
        self.quarter_ticks
    }

    /// Decomposed elapsed time
    pub fn elapsed(&self) -> HmsTime {
        self.elapsed
    }

    /// Cached (hours, minutes, seconds) display renderings
    pub fn cached_bcd(&self) -> (Bcd, Bcd, Bcd) {
        (self.hours_bcd, self.minutes_bcd, self.seconds_bcd)
    }

    pub fn alarm(&self) -> HmsTime {
        self.alarm
    }

    pub fn is_alarm_enabled(&self) -> bool {
        self.alarm_enabled
    }

    pub fn cursor(&self) -> DigitCursor {
        self.cursor
    }

    pub fn config(&self) -> &StopwatchConfig {
        &self.config
    }
}

/// Write a BCD pair with its tens digit at `high` and ones at `high - 1`
fn put_pair<D: SegmentDisplay>(display: &mut D, high: u8, value: Bcd) {
    display.set_digit(high, value.tens());
    display.set_digit(high - 1, value.ones());
}

/// Drive the stopwatch from a 4 Hz ticker, feeding it keys from the keypad latch
#[cfg(feature = "embassy-time")]
pub async fn tick_task<H: WatchHal>(
    keypad: &crate::controller::KeypadInput,
    engine: &mut StopwatchEngine,
    hal: &mut H,
) {
    use embassy_time::{Duration, Ticker};

    let mut ticker = Ticker::every(Duration::from_millis(crate::types::TICK_PERIOD_MS));
    engine.init(hal);

    loop {
        if let Some(key) = keypad.take() {
            let outcome = engine.keypress(key);
            #[cfg(feature = "defmt")]
            defmt::trace!("key {:?} -> {:?}", key, outcome);
            if outcome.needs_redraw() {
                engine.repaint(hal);
            }
        }

        ticker.next().await;
        engine.draw(false, hal);
    }
}
