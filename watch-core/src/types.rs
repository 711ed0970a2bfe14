//! Core data types for the stopwatch and packet radio engines

/// Maximum payload carried by one packet; one packet must fit the radio FIFO.
pub const PACKET_LEN: usize = 60;

/// RSSI and LQI bytes appended by the radio after every received payload.
pub const RX_TRAILER_LEN: usize = 2;

/// Receive buffer size: payload plus status trailer.
pub const RX_BUFFER_LEN: usize = PACKET_LEN + RX_TRAILER_LEN;

/// Number of display ticks per elapsed second.
pub const TICKS_PER_SECOND: u16 = 4;

/// Nominal tick period driven by the real-time clock.
pub const TICK_PERIOD_MS: u64 = 250;

/// Physical keys on the watch keypad, decoded at the input boundary.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Numeric key 0-9
    Digit(u8),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Times,
    /// `/`
    Divide,
    /// `=`
    Equals,
    /// `.`
    Dot,
    /// Key-up event after any key
    Release,
    /// Any other scan code
    Other(u8),
}

impl Key {
    /// Decode a raw keypad code.
    ///
    /// The scanner reports digits with both bits 4 and 5 set and the value
    /// in the low nibble; a zero code is the key-up event.
    pub const fn from_ascii(ch: u8) -> Self {
        if (ch & 0x30) == 0x30 && (ch & 0x0F) <= 9 {
            return Key::Digit(ch & 0x0F);
        }
        match ch {
            0 => Key::Release,
            b'+' => Key::Plus,
            b'-' => Key::Minus,
            b'*' => Key::Times,
            b'/' => Key::Divide,
            b'=' => Key::Equals,
            b'.' => Key::Dot,
            other => Key::Other(other),
        }
    }

    /// Raw keypad code; inverse of `from_ascii`
    pub const fn to_ascii(&self) -> u8 {
        match self {
            Key::Digit(d) => 0x30 | (*d & 0x0F),
            Key::Plus => b'+',
            Key::Minus => b'-',
            Key::Times => b'*',
            Key::Divide => b'/',
            Key::Equals => b'=',
            Key::Dot => b'.',
            Key::Release => 0,
            Key::Other(ch) => *ch,
        }
    }

    /// Numeric key, if `value` is a single decimal digit
    pub const fn from_digit(value: u8) -> Option<Self> {
        if value <= 9 {
            Some(Key::Digit(value))
        } else {
            None
        }
    }

    /// False for a `Digit` outside 0-9, which no keypad can produce
    pub const fn is_valid(&self) -> bool {
        match self {
            Key::Digit(d) => *d <= 9,
            _ => true,
        }
    }

    /// Digit value, if this is a numeric key
    pub const fn digit(&self) -> Option<u8> {
        match self {
            Key::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

/// Logical stopwatch commands available outside digit entry
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Pause or resume the count
    StartStop,
    /// Zero the count
    Clear,
    /// Show the wall clock while held
    Peek,
    /// Enter alarm digit entry
    EnterSet,
    /// Arm or disarm the alarm
    ToggleAlarm,
}

impl Command {
    /// Map a physical key to a command in normal mode.
    pub const fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Plus => Some(Command::StartStop),
            Key::Digit(0) => Some(Command::Clear),
            Key::Divide => Some(Command::Peek),
            Key::Equals => Some(Command::EnterSet),
            Key::Digit(4) => Some(Command::ToggleAlarm),
            _ => None,
        }
    }
}

/// Result of handing a key to an app
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyOutcome {
    /// Key handled, caller should redraw now
    Redraw,
    /// Key handled, the running tick will redraw on its own cadence
    Deferred,
    /// Key not valid in the current mode; nothing changed
    Ignored,
}

impl KeyOutcome {
    /// Whether the host must issue a forced draw.
    ///
    /// Ignored keys still redraw so the entry cursor keeps flickering.
    pub const fn needs_redraw(&self) -> bool {
        match self {
            KeyOutcome::Redraw | KeyOutcome::Ignored => true,
            KeyOutcome::Deferred => false,
        }
    }
}

/// Two decimal digits packed into nibbles
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bcd(u8);

impl Bcd {
    pub const ZERO: Bcd = Bcd(0);

    /// Pack the two low decimal digits of `value`
    pub const fn from_decimal(value: u16) -> Self {
        let v = value % 100;
        Bcd((((v / 10) as u8) << 4) | (v % 10) as u8)
    }

    pub const fn tens(&self) -> u8 {
        self.0 >> 4
    }

    pub const fn ones(&self) -> u8 {
        self.0 & 0x0F
    }

    pub const fn raw(&self) -> u8 {
        self.0
    }
}

/// Fractional-second display digits indexed by `quarter_ticks % 4`
pub const SUBSECOND_BCD: [Bcd; 4] = [Bcd(0x00), Bcd(0x25), Bcd(0x50), Bcd(0x75)];

/// Hours, minutes and seconds; minutes and seconds stay within 0..=59
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HmsTime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
}

impl HmsTime {
    pub const ZERO: HmsTime = HmsTime { hours: 0, minutes: 0, seconds: 0 };

    /// Build a time, rejecting minutes or seconds above 59
    pub const fn new(hours: u16, minutes: u8, seconds: u8) -> Option<Self> {
        if minutes > 59 || seconds > 59 {
            return None;
        }
        Some(Self { hours, minutes, seconds })
    }

    /// Decompose a count of whole seconds
    pub const fn from_total_seconds(total: u32) -> Self {
        Self {
            hours: (total / 3600) as u16,
            minutes: ((total / 60) % 60) as u8,
            seconds: (total % 60) as u8,
        }
    }

    pub const fn total_seconds(&self) -> u32 {
        self.hours as u32 * 3600 + self.minutes as u32 * 60 + self.seconds as u32
    }
}

/// Cursor over the six alarm digits during entry
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigitCursor {
    /// Not entering digits
    Off,
    Hour1,
    Hour2,
    Min1,
    Min2,
    Sec1,
    Sec2,
}

impl DigitCursor {
    /// Next cursor position; `Sec2` wraps to `Off`
    pub const fn next(&self) -> Self {
        match self {
            DigitCursor::Off => DigitCursor::Off,
            DigitCursor::Hour1 => DigitCursor::Hour2,
            DigitCursor::Hour2 => DigitCursor::Min1,
            DigitCursor::Min1 => DigitCursor::Min2,
            DigitCursor::Min2 => DigitCursor::Sec1,
            DigitCursor::Sec1 => DigitCursor::Sec2,
            DigitCursor::Sec2 => DigitCursor::Off,
        }
    }

    pub const fn is_active(&self) -> bool {
        !matches!(self, DigitCursor::Off)
    }

    /// LCD position of the digit under the cursor
    pub const fn display_position(&self) -> Option<u8> {
        match self {
            DigitCursor::Off => None,
            DigitCursor::Hour1 => Some(7),
            DigitCursor::Hour2 => Some(6),
            DigitCursor::Min1 => Some(4),
            DigitCursor::Min2 => Some(3),
            DigitCursor::Sec1 => Some(1),
            DigitCursor::Sec2 => Some(0),
        }
    }
}

/// One step of the alarm melody
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    pub frequency_hz: u16,
    pub duration: u16,
}

impl Tone {
    pub const fn new(frequency_hz: u16, duration: u16) -> Self {
        Self { frequency_hz, duration }
    }
}

/// Descending four-tone alarm
pub const DEFAULT_ALARM_TONES: [Tone; 4] = [
    Tone::new(2048, 250),
    Tone::new(1024, 250),
    Tone::new(512, 250),
    Tone::new(256, 250),
];

/// Stopwatch configuration parameters
#[derive(Copy, Clone, Debug)]
pub struct StopwatchConfig {
    /// Melody played when the alarm target is reached
    pub alarm_tones: [Tone; 4],
    /// Alarm target loaded at app entry
    pub default_alarm: HmsTime,
}

/// Alarm target loaded at app entry unless configured otherwise
pub const DEFAULT_ALARM: HmsTime = HmsTime { hours: 0, minutes: 3, seconds: 0 };

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            alarm_tones: DEFAULT_ALARM_TONES,
            default_alarm: DEFAULT_ALARM,
        }
    }
}

impl StopwatchConfig {
    /// Create a new configuration with validation
    pub fn new(alarm_tones: [Tone; 4], default_alarm: HmsTime) -> Result<Self, &'static str> {
        if default_alarm.minutes > 59 || default_alarm.seconds > 59 {
            return Err("Alarm minutes and seconds must be <= 59");
        }
        if default_alarm.hours > 99 {
            return Err("Alarm hours must fit two digits");
        }
        if alarm_tones.iter().any(|t| t.duration == 0) {
            return Err("Alarm tones need a non-zero duration");
        }
        Ok(Self { alarm_tones, default_alarm })
    }
}

/// Half-duplex radio mode; receiving and transmitting never overlap
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioMode {
    Idle,
    Receiving,
    Transmitting,
}

/// What `transmit` does when the radio is listening
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxDuringRx {
    /// Refuse with `RadioError::Busy`
    Reject,
    /// Abandon reception and transmit straight away
    Preempt,
}

/// Packet radio configuration parameters
#[derive(Copy, Clone, Debug)]
pub struct RadioConfig {
    pub tx_during_rx: TxDuringRx,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self { tx_during_rx: TxDuringRx::Reject }
    }
}

/// Radio core command strobes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Strobe {
    /// Reset chip
    Reset = 0x30,
    /// Enable and calibrate synthesizer
    FastTxOn = 0x31,
    /// Crystal off
    XtalOff = 0x32,
    /// Calibrate synthesizer
    Calibrate = 0x33,
    /// Enter receive
    Rx = 0x34,
    /// Enter transmit
    Tx = 0x35,
    /// Exit RX/TX, back to idle
    Idle = 0x36,
    /// Wake-on-radio polling
    WakeOnRadio = 0x38,
    /// Power down
    PowerDown = 0x39,
    /// Flush the RX FIFO
    FlushRx = 0x3A,
    /// Flush the TX FIFO
    FlushTx = 0x3B,
    /// Reset the wake-on-radio timer
    WorReset = 0x3C,
    /// No operation, returns status
    Nop = 0x3D,
}

impl Strobe {
    pub const fn command(&self) -> u8 {
        *self as u8
    }
}

/// Radio register addresses used by the packet engine
pub mod reg {
    /// RX FIFO byte count; bit 7 flags overflow
    pub const RXBYTES: u8 = 0x3B;
    /// TX FIFO byte count
    pub const TXBYTES: u8 = 0x3A;
    /// Burst write port into the TX FIFO
    pub const TXFIFO: u8 = 0x3F;
    /// Burst read port out of the RX FIFO
    pub const RXFIFO: u8 = 0x3F;
    /// Overflow flag in RXBYTES
    pub const RXBYTES_OVERFLOW: u8 = 0x80;
    /// Byte-count mask in RXBYTES
    pub const RXBYTES_COUNT: u8 = 0x7F;
}

/// Interrupt flag signalling RX FIFO threshold / end of packet
pub const PACKET_IRQ_FLAG: u8 = 9;

/// Source decoded from the radio core interrupt vector
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSource {
    /// No radio interrupt pending
    None,
    /// Interrupt flag 0-15
    Flag(u8),
}

impl IrqSource {
    /// Decode a vector value; each flag occupies an even step starting at 2.
    pub const fn from_vector(vector: u16) -> Self {
        let v = vector & !1;
        if v == 0 || v > 32 {
            IrqSource::None
        } else {
            IrqSource::Flag((v / 2 - 1) as u8)
        }
    }

    pub const fn is_packet(&self) -> bool {
        matches!(self, IrqSource::Flag(PACKET_IRQ_FLAG))
    }
}

/// What an interrupt turned out to be
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptOutcome {
    /// A packet of the given payload length now sits in the receive buffer
    Received { length: u8 },
    /// The in-flight packet has left the radio
    Transmitted,
    /// RX FIFO overflowed or held more than one packet; flushed and re-armed
    Overflow,
    /// Packet interrupt with neither receive nor transmit armed
    Unexpected,
    /// A source this engine does not service
    Ignored(IrqSource),
}

impl InterruptOutcome {
    /// Diagnostic-only anomalies, reported but not escalated
    pub const fn is_anomaly(&self) -> bool {
        matches!(self, InterruptOutcome::Unexpected | InterruptOutcome::Overflow)
    }
}
