//! Hardware Abstraction Layer for the watch apps and the packet radio

use embedded_hal::spi::{Operation, SpiDevice};
use crate::types::{reg, Strobe};

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Register or FIFO access failed
    BusError,
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::BusError => write!(f, "Register or FIFO access failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Eight-digit segment LCD with colon and "+" indicators.
///
/// Positions run right to left: 0-1 lowest pair, 3-4 middle pair,
/// 6-7 highest pair; 2 and 5 are spacer cells.
pub trait SegmentDisplay {
    /// Show a 4-bit value at a digit position
    fn set_digit(&mut self, position: u8, value: u8);

    /// Blank one digit position
    fn clear_digit(&mut self, position: u8);

    fn set_colon(&mut self, on: bool);

    fn set_plus(&mut self, on: bool);

    /// Blank the whole display
    fn zero(&mut self);
}

/// Piezo tone output
pub trait ToneGenerator {
    /// Play (or keep playing) a tone. Returns true while the tone is
    /// still sounding and the caller should poll again.
    fn tone(&mut self, frequency_hz: u16, duration: u16) -> bool;
}

/// Everything the stopwatch app touches on the host platform
pub trait WatchHal {
    type Display: SegmentDisplay;
    type Buzzer: ToneGenerator;

    /// Access to the LCD
    fn display(&mut self) -> &mut Self::Display;

    /// Access to the buzzer
    fn buzzer(&mut self) -> &mut Self::Buzzer;

    /// Postpone the platform's auto-sleep timeout
    fn clear_idle_timer(&mut self);

    /// Render the wall clock in place of the app
    fn draw_time_of_day(&mut self, forced: bool);
}

/// Register-level access to the radio core
pub trait RadioCore {
    /// Issue a command strobe
    fn strobe(&mut self, strobe: Strobe) -> Result<(), HalError>;

    /// Read a single configuration or status register
    fn read_register(&mut self, addr: u8) -> Result<u8, HalError>;

    /// Read `buffer.len()` bytes starting at `addr`
    fn read_burst(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), HalError>;

    /// Write all of `data` starting at `addr`
    fn write_burst(&mut self, addr: u8, data: &[u8]) -> Result<(), HalError>;
}

/// Edge selection for the packet interrupt line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// The single interrupt line shared by receive and transmit
pub trait RadioInterrupt {
    fn set_edge(&mut self, edge: Edge) -> Result<(), HalError>;

    /// Drop any pending flag
    fn clear_pending(&mut self) -> Result<(), HalError>;

    fn enable(&mut self, enable: bool) -> Result<(), HalError>;

    /// Read (and acknowledge) the interrupt vector
    fn take_vector(&mut self) -> u16;

    /// Let the processor drop back to low-power sleep on ISR exit
    fn resume_low_power(&mut self);
}

/// Complete radio HAL interface
pub trait RadioHal {
    type Core: RadioCore;
    type Irq: RadioInterrupt;

    /// Access to the radio registers
    fn core(&mut self) -> &mut Self::Core;

    /// Access to the interrupt line
    fn irq(&mut self) -> &mut Self::Irq;
}

/// Pairs any register transport with any interrupt line
pub struct SplitRadio<C, I> {
    pub core: C,
    pub irq: I,
}

impl<C, I> SplitRadio<C, I> {
    pub fn new(core: C, irq: I) -> Self {
        Self { core, irq }
    }
}

impl<C, I> RadioHal for SplitRadio<C, I>
where
    C: RadioCore,
    I: RadioInterrupt,
{
    type Core = C;
    type Irq = I;

    fn core(&mut self) -> &mut C {
        &mut self.core
    }

    fn irq(&mut self) -> &mut I {
        &mut self.irq
    }
}

const SPI_READ: u8 = 0x80;
const SPI_BURST: u8 = 0x40;
/// Status registers live at and above this address
const STATUS_REG_BASE: u8 = 0x30;

/// Register transport for an external transceiver over embedded-hal SPI
pub struct SpiRadio<SPI> {
    spi: SPI,
}

impl<SPI> SpiRadio<SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Release the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> RadioCore for SpiRadio<SPI>
where
    SPI: SpiDevice,
{
    fn strobe(&mut self, strobe: Strobe) -> Result<(), HalError> {
        self.spi
            .write(&[strobe.command()])
            .map_err(|_| HalError::BusError)
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, HalError> {
        // Status registers share addresses with strobes; the burst bit selects them
        let header = if addr >= STATUS_REG_BASE {
            addr | SPI_READ | SPI_BURST
        } else {
            addr | SPI_READ
        };
        let mut value = [0u8; 1];
        self.spi
            .transaction(&mut [Operation::Write(&[header]), Operation::Read(&mut value)])
            .map_err(|_| HalError::BusError)?;
        Ok(value[0])
    }

    fn read_burst(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), HalError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let header = (addr & reg::RXFIFO) | SPI_READ | SPI_BURST;
        self.spi
            .transaction(&mut [Operation::Write(&[header]), Operation::Read(buffer)])
            .map_err(|_| HalError::BusError)
    }

    fn write_burst(&mut self, addr: u8, data: &[u8]) -> Result<(), HalError> {
        if data.is_empty() {
            return Ok(());
        }
        let header = (addr & reg::TXFIFO) | SPI_BURST;
        self.spi
            .transaction(&mut [Operation::Write(&[header]), Operation::Write(data)])
            .map_err(|_| HalError::BusError)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Recording mock implementations for testing

    use super::*;
    use crate::types::{Tone, PACKET_IRQ_FLAG};
    use heapless::{Deque, Vec};

    /// LCD model holding what each position currently shows
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct MockDisplay {
        pub digits: [Option<u8>; 8],
        pub colon: bool,
        pub plus: bool,
        pub zero_count: u32,
        pub writes: u32,
    }

    impl Default for MockDisplay {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockDisplay {
        pub fn new() -> Self {
            Self {
                digits: [None; 8],
                colon: false,
                plus: false,
                zero_count: 0,
                writes: 0,
            }
        }

        /// Value shown at a position, None when blank
        pub fn digit(&self, position: u8) -> Option<u8> {
            self.digits[position as usize]
        }

        /// Two-digit value shown by a (tens, ones) position pair
        pub fn pair(&self, tens: u8, ones: u8) -> Option<u8> {
            Some(self.digit(tens)? * 10 + self.digit(ones)?)
        }
    }

    impl SegmentDisplay for MockDisplay {
        fn set_digit(&mut self, position: u8, value: u8) {
            self.digits[position as usize] = Some(value);
            self.writes += 1;
        }

        fn clear_digit(&mut self, position: u8) {
            self.digits[position as usize] = None;
            self.writes += 1;
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
            self.zero_count += 1;
        }
    }

    /// Buzzer that records each tone started and stays busy for a
    /// configurable number of polls
    #[derive(Default)]
    pub struct MockBuzzer {
        pub played: Vec<Tone, 32>,
        pub polls: u32,
        busy_polls: u8,
        polls_left: u8,
        sounding: Option<Tone>,
    }

    impl MockBuzzer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Report busy for `polls` extra calls per tone
        pub fn with_busy_polls(polls: u8) -> Self {
            Self {
                busy_polls: polls,
                ..Self::default()
            }
        }
    }

    impl ToneGenerator for MockBuzzer {
        fn tone(&mut self, frequency_hz: u16, duration: u16) -> bool {
            let tone = Tone::new(frequency_hz, duration);
            self.polls += 1;
            if self.sounding != Some(tone) {
                self.played.push(tone).ok();
                self.sounding = Some(tone);
                self.polls_left = self.busy_polls;
            }
            if self.polls_left > 0 {
                self.polls_left -= 1;
                true
            } else {
                self.sounding = None;
                false
            }
        }
    }

    /// Watch platform mock
    #[derive(Default)]
    pub struct MockWatchHal {
        pub display: MockDisplay,
        pub buzzer: MockBuzzer,
        pub idle_clears: u32,
        pub time_of_day_draws: u32,
    }

    impl MockWatchHal {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl WatchHal for MockWatchHal {
        type Display = MockDisplay;
        type Buzzer = MockBuzzer;

        fn display(&mut self) -> &mut MockDisplay {
            &mut self.display
        }

        fn buzzer(&mut self) -> &mut MockBuzzer {
            &mut self.buzzer
        }

        fn clear_idle_timer(&mut self) {
            self.idle_clears += 1;
        }

        fn draw_time_of_day(&mut self, _forced: bool) {
            self.time_of_day_draws += 1;
        }
    }

    /// Radio core and interrupt line mock with a scripted RX FIFO
    pub struct MockRadio {
        pub strobes: Vec<Strobe, 64>,
        pub registers: [u8; 64],
        pub rx_fifo: Deque<u8, 128>,
        pub tx_fifo: Vec<u8, 128>,
        pub edge: Option<Edge>,
        pub pending: bool,
        pub enabled: bool,
        pub vector: u16,
        pub sleep_resumes: u32,
        pub fail_bus: bool,
    }

    impl Default for MockRadio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockRadio {
        pub fn new() -> Self {
            Self {
                strobes: Vec::new(),
                registers: [0; 64],
                rx_fifo: Deque::new(),
                tx_fifo: Vec::new(),
                edge: None,
                pending: false,
                enabled: false,
                vector: 0,
                sleep_resumes: 0,
                fail_bus: false,
            }
        }

        /// Queue a packet in the RX FIFO and raise the packet interrupt
        pub fn deliver(&mut self, payload: &[u8], rssi: u8, lqi: u8) {
            for byte in payload.iter().chain([rssi, lqi].iter()) {
                self.rx_fifo.push_back(*byte).ok();
            }
            self.registers[reg::RXBYTES as usize] = payload.len() as u8;
            self.raise(PACKET_IRQ_FLAG);
        }

        /// Mark an interrupt flag pending
        pub fn raise(&mut self, flag: u8) {
            self.vector = (flag as u16 + 1) * 2;
            self.pending = true;
        }

        pub fn clear_log(&mut self) {
            self.strobes.clear();
        }
    }

    impl RadioCore for MockRadio {
        fn strobe(&mut self, strobe: Strobe) -> Result<(), HalError> {
            if self.fail_bus {
                return Err(HalError::BusError);
            }
            if strobe == Strobe::FlushRx {
                self.rx_fifo.clear();
            }
            self.strobes.push(strobe).ok();
            Ok(())
        }

        fn read_register(&mut self, addr: u8) -> Result<u8, HalError> {
            if self.fail_bus {
                return Err(HalError::BusError);
            }
            Ok(self.registers[addr as usize & 0x3F])
        }

        fn read_burst(&mut self, _addr: u8, buffer: &mut [u8]) -> Result<(), HalError> {
            if self.fail_bus {
                return Err(HalError::BusError);
            }
            for slot in buffer.iter_mut() {
                *slot = self.rx_fifo.pop_front().ok_or(HalError::BusError)?;
            }
            Ok(())
        }

        fn write_burst(&mut self, _addr: u8, data: &[u8]) -> Result<(), HalError> {
            if self.fail_bus {
                return Err(HalError::BusError);
            }
            self.tx_fifo.clear();
            self.tx_fifo
                .extend_from_slice(data)
                .map_err(|_| HalError::BusError)
        }
    }

    impl RadioInterrupt for MockRadio {
        fn set_edge(&mut self, edge: Edge) -> Result<(), HalError> {
            self.edge = Some(edge);
            Ok(())
        }

        fn clear_pending(&mut self) -> Result<(), HalError> {
            self.pending = false;
            Ok(())
        }

        fn enable(&mut self, enable: bool) -> Result<(), HalError> {
            self.enabled = enable;
            Ok(())
        }

        fn take_vector(&mut self) -> u16 {
            let vector = self.vector;
            self.vector = 0;
            self.pending = false;
            vector
        }

        fn resume_low_power(&mut self) {
            self.sleep_resumes += 1;
        }
    }

    impl RadioHal for MockRadio {
        type Core = MockRadio;
        type Irq = MockRadio;

        fn core(&mut self) -> &mut MockRadio {
            self
        }

        fn irq(&mut self) -> &mut MockRadio {
            self
        }
    }
}
