//! Command/data framing onto the serial bus.

use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::spi::{Error as _, SpiDevice};

use crate::{Error, TransportFault};

/// Byte-level transport to the controller.
///
/// Every call is one complete bus transaction: the peripheral is selected, the
/// command/data-select line is set, the bytes go out most-significant byte first and the
/// peripheral is deselected again. Nothing else may use the bus in between.
pub trait Bus {
    /// Send one command byte (command/data-select low)
    fn write_command(&mut self, opcode: u8) -> Result<(), Error>;

    /// Send one data byte (command/data-select high)
    fn write_data8(&mut self, value: u8) -> Result<(), Error>;

    /// Send a 16-bit data value as two bytes, high byte first
    fn write_data16(&mut self, value: u16) -> Result<(), Error>;

    /// Send a block of data bytes in a single transaction
    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Error>;
}

impl<T: Bus + ?Sized> Bus for &mut T {
    fn write_command(&mut self, opcode: u8) -> Result<(), Error> {
        T::write_command(self, opcode)
    }

    fn write_data8(&mut self, value: u8) -> Result<(), Error> {
        T::write_data8(self, value)
    }

    fn write_data16(&mut self, value: u16) -> Result<(), Error> {
        T::write_data16(self, value)
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Error> {
        T::write_data(self, bytes)
    }
}

/// [`Bus`] over an `embedded-hal` [`SpiDevice`] plus a command/data-select pin.
///
/// Chip-select is owned by the `SpiDevice`, which asserts it for the duration of each
/// `write`.
pub struct SpiBus<SPI, DC> {
    pub spi: SPI,
    pub dc: DC,
}

impl<SPI, DC> SpiBus<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    /// Create new bus from the SPI device and the command/data-select pin
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Give back the SPI device and pin
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }

    fn command_mode(&mut self) -> Result<(), Error> {
        self.dc
            .set_low()
            .map_err(|e| Error::Transport(TransportFault::Pin(e.kind())))
    }

    fn data_mode(&mut self) -> Result<(), Error> {
        self.dc
            .set_high()
            .map_err(|e| Error::Transport(TransportFault::Pin(e.kind())))
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.spi
            .write(bytes)
            .map_err(|e| Error::Transport(TransportFault::Spi(e.kind())))
    }
}

impl<SPI, DC> Bus for SpiBus<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    fn write_command(&mut self, opcode: u8) -> Result<(), Error> {
        self.command_mode()?;
        self.send(&[opcode])
    }

    fn write_data8(&mut self, value: u8) -> Result<(), Error> {
        self.data_mode()?;
        self.send(&[value])
    }

    fn write_data16(&mut self, value: u16) -> Result<(), Error> {
        self.data_mode()?;
        self.send(&value.to_be_bytes())
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.data_mode()?;
        self.send(bytes)
    }
}
