//! Half-duplex packet transceiver on a single shared interrupt line
//!
//! One packet is in flight at a time, in one direction. Packets never
//! exceed the radio FIFO, so each transfer is a single burst.

use crate::hal::{Edge, HalError, RadioCore, RadioHal, RadioInterrupt};
use crate::types::{
    reg, InterruptOutcome, IrqSource, RadioConfig, RadioMode, Strobe, TxDuringRx, PACKET_LEN,
    RX_BUFFER_LEN, RX_TRAILER_LEN,
};

/// Packet engine errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Caller handed over more than one FIFO worth of payload
    LengthExceedsCapacity { length: usize, capacity: usize },
    /// A packet is already in flight in the given direction
    Busy(RadioMode),
    /// Platform primitive failed
    Hal(HalError),
}

impl From<HalError> for RadioError {
    fn from(err: HalError) -> Self {
        RadioError::Hal(err)
    }
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RadioError::LengthExceedsCapacity { length, capacity } => {
                write!(f, "Packet of {} bytes exceeds {} byte capacity", length, capacity)
            }
            RadioError::Busy(mode) => write!(f, "Radio busy ({:?})", mode),
            RadioError::Hal(err) => write!(f, "Radio HAL error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RadioError {}

/// A received packet and its status trailer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RxPacket<'a> {
    payload: &'a [u8],
    rssi: u8,
    lqi: u8,
}

impl<'a> RxPacket<'a> {
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Raw RSSI byte as appended by the radio
    pub fn rssi_raw(&self) -> u8 {
        self.rssi
    }

    /// Signal strength in dBm (half-dB steps, fixed 74 dB offset)
    pub fn rssi_dbm(&self) -> i16 {
        (self.rssi as i8) as i16 / 2 - 74
    }

    /// Link quality indicator
    pub fn lqi(&self) -> u8 {
        self.lqi & 0x7F
    }

    pub fn crc_ok(&self) -> bool {
        self.lqi & 0x80 != 0
    }
}

/// Packet transceiver state
pub struct PacketRadio {
    config: RadioConfig,
    mode: RadioMode,
    rx_buffer: [u8; RX_BUFFER_LEN],
    rx_len: u8,
    rx_valid: bool,
    tx_buffer: [u8; PACKET_LEN],
    tx_len: u8,
}

impl PacketRadio {
    pub fn new(config: RadioConfig) -> Self {
        Self {
            config,
            mode: RadioMode::Idle,
            rx_buffer: [0; RX_BUFFER_LEN],
            rx_len: 0,
            rx_valid: false,
            tx_buffer: [0; PACKET_LEN],
            tx_len: 0,
        }
    }

    /// Arm the radio for reception. Safe to call when already receiving.
    pub fn start_receive<H: RadioHal>(&mut self, hal: &mut H) -> Result<(), RadioError> {
        let irq = hal.irq();
        irq.set_edge(Edge::Falling)?;
        irq.clear_pending()?;
        irq.enable(true)?;

        // Idle first so the RX strobe is honoured from any state
        let core = hal.core();
        core.strobe(Strobe::Idle)?;
        core.strobe(Strobe::Rx)?;

        self.mode = RadioMode::Receiving;
        Ok(())
    }

    /// Stop listening, dropping any partial packet in the FIFO
    pub fn stop_receive<H: RadioHal>(&mut self, hal: &mut H) -> Result<(), RadioError> {
        self.mode = RadioMode::Idle;

        let irq = hal.irq();
        irq.enable(false)?;
        irq.clear_pending()?;

        let core = hal.core();
        core.strobe(Strobe::Idle)?;
        core.strobe(Strobe::FlushRx)?;
        Ok(())
    }

    /// Load `data` into the TX FIFO and send it.
    ///
    /// Completion is reported later by `on_interrupt`.
    pub fn transmit<H: RadioHal>(&mut self, data: &[u8], hal: &mut H) -> Result<(), RadioError> {
        if data.len() > PACKET_LEN {
            return Err(RadioError::LengthExceedsCapacity {
                length: data.len(),
                capacity: PACKET_LEN,
            });
        }
        match (self.mode, self.config.tx_during_rx) {
            (RadioMode::Transmitting, _) => return Err(RadioError::Busy(RadioMode::Transmitting)),
            (RadioMode::Receiving, TxDuringRx::Reject) => {
                return Err(RadioError::Busy(RadioMode::Receiving))
            }
            (RadioMode::Receiving, TxDuringRx::Preempt) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("transmit preempts reception");
            }
            (RadioMode::Idle, _) => {}
        }

        let len = data.len();
        self.tx_buffer[..len].copy_from_slice(data);
        self.tx_len = len as u8;

        let irq = hal.irq();
        irq.set_edge(Edge::Falling)?;
        irq.clear_pending()?;
        irq.enable(true)?;

        let core = hal.core();
        core.write_burst(reg::TXFIFO, &self.tx_buffer[..len])?;
        core.strobe(Strobe::Tx)?;

        self.mode = RadioMode::Transmitting;
        Ok(())
    }

    /// Radio interrupt entry point.
    ///
    /// Always hands the processor back to low-power sleep, even when a
    /// register access fails.
    pub fn on_interrupt<H: RadioHal>(&mut self, hal: &mut H) -> Result<InterruptOutcome, RadioError> {
        let result = self.service(hal);
        hal.irq().resume_low_power();
        result
    }

    fn service<H: RadioHal>(&mut self, hal: &mut H) -> Result<InterruptOutcome, RadioError> {
        let source = IrqSource::from_vector(hal.irq().take_vector());
        if !source.is_packet() {
            return Ok(InterruptOutcome::Ignored(source));
        }

        match self.mode {
            RadioMode::Receiving => self.read_packet(hal.core()),
            RadioMode::Transmitting => {
                hal.irq().enable(false)?;
                self.mode = RadioMode::Idle;
                #[cfg(feature = "defmt")]
                defmt::info!("Transmitted {} byte packet", self.tx_len);
                Ok(InterruptOutcome::Transmitted)
            }
            RadioMode::Idle => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Unexpected packet interrupt");
                Ok(InterruptOutcome::Unexpected)
            }
        }
    }

    fn read_packet<C: RadioCore>(&mut self, core: &mut C) -> Result<InterruptOutcome, RadioError> {
        let status = core.read_register(reg::RXBYTES)?;
        let count = (status & reg::RXBYTES_COUNT) as usize;

        if status & reg::RXBYTES_OVERFLOW != 0 || count > PACKET_LEN {
            #[cfg(feature = "defmt")]
            defmt::warn!("RX FIFO overflow ({} bytes), flushing", count);
            core.strobe(Strobe::Idle)?;
            core.strobe(Strobe::FlushRx)?;
            core.strobe(Strobe::Rx)?;
            return Ok(InterruptOutcome::Overflow);
        }

        core.read_burst(reg::RXFIFO, &mut self.rx_buffer[..count + RX_TRAILER_LEN])?;
        self.rx_len = count as u8;
        self.rx_valid = true;

        #[cfg(feature = "defmt")]
        defmt::info!("Received {} byte packet", count);
        Ok(InterruptOutcome::Received { length: count as u8 })
    }

    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    /// Raw receive buffer: payload followed by RSSI and LQI
    pub fn rx_buffer(&self) -> &[u8; RX_BUFFER_LEN] {
        &self.rx_buffer
    }

    /// Payload length of the last received packet
    pub fn rx_len(&self) -> u8 {
        self.rx_len
    }

    /// The last received packet, if any
    pub fn received(&self) -> Option<RxPacket<'_>> {
        if !self.rx_valid {
            return None;
        }
        let len = self.rx_len as usize;
        Some(RxPacket {
            payload: &self.rx_buffer[..len],
            rssi: self.rx_buffer[len],
            lqi: self.rx_buffer[len + 1],
        })
    }

    /// Payload of the last packet handed to `transmit`
    pub fn tx_payload(&self) -> &[u8] {
        &self.tx_buffer[..self.tx_len as usize]
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }
}
