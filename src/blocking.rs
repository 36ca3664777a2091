use crate::constants::*;
use crate::display::Lcd;
use crate::interface::SpiBus;
use crate::{Config, Error, TransportFault};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// ST7735S driver: the draw surface plus the reset line and a delay for bring-up
pub struct St7735s<SPI, DC, RESET, DELAY> {
    lcd: Lcd<SpiBus<SPI, DC>>,
    pub reset_pin: RESET,
    pub delay: DELAY,
}

impl<SPI, DC, RESET, DELAY> St7735s<SPI, DC, RESET, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RESET: OutputPin,
    DELAY: DelayNs,
{
    /// Create new ST7735S instance from the given SPI device and GPIO pins
    pub fn new(spi: SPI, dc: DC, reset_pin: RESET, delay: DELAY) -> Self {
        Self {
            lcd: Lcd::new(SpiBus::new(spi, dc)),
            reset_pin,
            delay,
        }
    }

    /// Hardware reset: hold the reset line low, release it and let the controller settle
    pub fn reset(&mut self) -> Result<(), Error> {
        self.reset_pin.set_low().map_err(pin_fault)?;
        self.delay.delay_ms(RESET_LOW_MS);
        self.reset_pin.set_high().map_err(pin_fault)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Reset and configure the controller, switch the panel on, rotate it and clear it
    pub fn init(&mut self, config: Config) -> Result<(), Error> {
        self.reset()?;

        self.lcd.command(Instruction::SLPOUT, &[])?;
        self.delay.delay_ms(SLEEP_OUT_DELAY_MS);

        for &(reg, data) in INIT_SEQUENCE {
            self.lcd.command(reg, data)?;
        }
        self.lcd.command(Instruction::DISPON, &[])?;

        self.lcd.set_orientation(config.orientation)?;
        let _path = self.lcd.fill_screen_bulk(config.background)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "st7735s ready, {}x{}, cleared via {}",
            self.lcd.width(),
            self.lcd.height(),
            _path
        );
        Ok(())
    }

    /// The draw surface
    pub fn lcd(&self) -> &Lcd<SpiBus<SPI, DC>> {
        &self.lcd
    }

    /// The draw surface, for drawing
    pub fn lcd_mut(&mut self) -> &mut Lcd<SpiBus<SPI, DC>> {
        &mut self.lcd
    }

    /// Keep only the draw surface, handing back the reset line and delay
    pub fn into_lcd(self) -> (Lcd<SpiBus<SPI, DC>>, RESET, DELAY) {
        (self.lcd, self.reset_pin, self.delay)
    }

    /// Give back all the parts
    pub fn release(self) -> (SPI, DC, RESET, DELAY) {
        let (spi, dc) = self.lcd.release().release();
        (spi, dc, self.reset_pin, self.delay)
    }
}

fn pin_fault<E: embedded_hal::digital::Error>(e: E) -> Error {
    Error::Transport(TransportFault::Pin(e.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeDelay, FakePin, FakeResetPin, FakeSpi, Transfer, Wire, WireEvent};
    use crate::{Color, Orientation};
    use embedded_hal::spi::ErrorKind;
    use std::vec::Vec;

    type Driver = St7735s<FakeSpi, FakePin, FakeResetPin, FakeDelay>;

    fn driver(wire: &Wire) -> Driver {
        St7735s::new(
            FakeSpi::new(wire),
            FakePin::new(wire),
            FakeResetPin::new(wire),
            FakeDelay::new(wire),
        )
    }

    fn commands(transfers: &[Transfer]) -> Vec<u8> {
        transfers
            .iter()
            .filter(|t| !t.dc_high)
            .map(|t| t.bytes[0])
            .collect()
    }

    /// Data bytes following the `nth` occurrence of command `opcode`
    fn params(transfers: &[Transfer], opcode: u8, nth: usize) -> Vec<u8> {
        let start = transfers
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Transfer::command(opcode))
            .nth(nth)
            .map(|(i, _)| i + 1)
            .unwrap();
        transfers[start..]
            .iter()
            .take_while(|t| t.dc_high)
            .flat_map(|t| t.bytes.iter().copied())
            .collect()
    }

    #[test]
    fn reset_timing() {
        let wire = Wire::default();
        driver(&wire).reset().unwrap();
        assert_eq!(
            wire.events(),
            [
                WireEvent::Reset(false),
                WireEvent::DelayNs(100_000_000),
                WireEvent::Reset(true),
                WireEvent::DelayNs(50_000_000),
            ]
        );
    }

    #[test]
    fn init_runs_power_on_sequence_in_order() {
        let wire = Wire::default();
        driver(&wire).init(Config::default()).unwrap();
        let transfers = wire.transfers();

        assert_eq!(
            commands(&transfers),
            [
                0x11, 0xB1, 0xB2, 0xB3, 0xB4, 0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0x36, 0xE0,
                0xE1, 0x3A, 0x29, 0x36, 0x2A, 0x2B, 0x2C, 0x2A, 0x2B, 0x2C,
            ]
        );
        assert_eq!(params(&transfers, 0xB3, 0), [0x05, 0x3C, 0x3C, 0x05, 0x3C, 0x3C]);
        assert_eq!(params(&transfers, 0x3A, 0), [0x05]);
        assert_eq!(params(&transfers, 0xE0, 0).len(), 16);
        assert_eq!(params(&transfers, 0x36, 1), [0xC0]);
        assert_eq!(params(&transfers, 0x2A, 0), [0, 0, 0, 127]);
        assert_eq!(params(&transfers, 0x2B, 0), [0, 0, 0, 159]);

        // parameters go out one byte per transaction
        let gamma = transfers
            .iter()
            .position(|t| *t == Transfer::command(0xE0))
            .unwrap();
        assert!(transfers[gamma + 1..gamma + 17]
            .iter()
            .all(|t| t.dc_high && t.bytes.len() == 1));
    }

    #[test]
    fn sleep_out_waits_before_configuring() {
        let wire = Wire::default();
        driver(&wire).init(Config::default()).unwrap();
        let events = wire.events();
        let sleep_out = events
            .iter()
            .position(|e| *e == WireEvent::Transfer(Transfer::command(0x11)))
            .unwrap();
        assert_eq!(events[sleep_out + 1], WireEvent::DelayNs(120_000_000));
        assert_eq!(events.first(), Some(&WireEvent::Reset(false)));
    }

    #[test]
    fn init_clears_to_background() {
        let wire = Wire::default();
        let config = Config {
            orientation: Orientation::Deg0,
            background: Color::BLUE,
        };
        driver(&wire).init(config).unwrap();
        let pixels = params(&wire.transfers(), 0x2C, 0);
        assert_eq!(pixels.len(), 128 * 160 * 2);
        assert!(pixels.chunks(2).all(|px| px == [0x00, 0x1F]));
    }

    #[test]
    fn init_applies_orientation_after_display_on() {
        let wire = Wire::default();
        let mut driver = driver(&wire);
        driver
            .init(Config {
                orientation: Orientation::Deg270,
                background: Color::BLACK,
            })
            .unwrap();
        assert_eq!((driver.lcd().width(), driver.lcd().height()), (160, 128));
        assert_eq!(driver.lcd().orientation(), Orientation::Deg270);

        let transfers = wire.transfers();
        assert_eq!(params(&transfers, 0x36, 1), [Orientation::Deg270.madctl()]);
        assert_eq!(params(&transfers, 0x2A, 0), [0, 0, 0, 159]);
        assert_eq!(params(&transfers, 0x2B, 0), [0, 0, 0, 127]);
    }

    #[test]
    fn init_stops_on_bus_fault() {
        let wire = Wire::default();
        wire.fail_spi_after(5);
        assert_eq!(
            driver(&wire).init(Config::default()),
            Err(Error::Transport(TransportFault::Spi(ErrorKind::Other)))
        );
        assert_eq!(wire.transfers().len(), 5);
    }

    #[test]
    fn drawing_through_the_driver() {
        let wire = Wire::default();
        let mut driver = driver(&wire);
        driver.lcd_mut().draw_point(1, 2, Color::RED).unwrap();
        let transfers = wire.transfers();
        assert_eq!(transfers[10], Transfer::command(0x2C));
        assert_eq!(transfers[11], Transfer::data(&[0xF8, 0x00]));

        let (_spi, _dc, _reset, _delay) = driver.release();
    }
}
