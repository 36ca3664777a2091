//! Two-device status screen driven by the buttons and by a remote control surface.
//!
//! All rendering goes through one [`StatusPanel`]; concurrent users share it as a
//! [`SharedPanel`] and lock it for the whole update.

use core::convert::Infallible;
use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::{self, Error as _, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::display::{Lcd, Orientation};
use crate::font::FontSize;
use crate::input::{ButtonEvent, ButtonId, ButtonLevels, ButtonTask};
use crate::interface::Bus;
use crate::text::TextStyle;
use crate::{Color, Error};

const LOADING: &str = "Loading...";
const NETWORK_LINE: &str = "Net: Connected";
/// Left edge of the ON/OFF word
const STATE_X: u16 = 110;
const LABEL_X: u16 = 30;
const PANEL_FILL: Color = Color::SKIN;
const LINE_COLORS: [Color; 2] = [Color(0xDE79), Color(0xA732)];

/// One of the two switched outputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Device {
    One,
    Two,
}

impl Device {
    const fn index(self) -> usize {
        match self {
            Device::One => 0,
            Device::Two => 1,
        }
    }

    /// Key used in status reports
    pub const fn key(self) -> &'static str {
        match self {
            Device::One => "led1",
            Device::Two => "led2",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Device::One => "Device 1 is ",
            Device::Two => "Device 2 is ",
        }
    }

    const fn row(self) -> u16 {
        match self {
            Device::One => 60,
            Device::Two => 80,
        }
    }
}

impl From<ButtonId> for Device {
    fn from(id: ButtonId) -> Self {
        match id {
            ButtonId::Back => Device::One,
            ButtonId::Next => Device::Two,
        }
    }
}

/// A full-screen picture shown behind the status panel
#[derive(Clone, Copy, Debug)]
pub struct Image<'a> {
    pub width: u16,
    pub height: u16,
    /// RGB565, row-major
    pub pixels: &'a [u16],
}

/// Errors from the status panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusError {
    /// Drawing failed
    Display(Error),
    /// A device output could not be switched
    Output(digital::ErrorKind),
}

impl From<Error> for StatusError {
    fn from(e: Error) -> Self {
        StatusError::Display(e)
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusError::Display(e) => write!(f, "display: {e}"),
            StatusError::Output(kind) => write!(f, "device output: {kind:?}"),
        }
    }
}

/// Snapshot of both devices, rendered as `{"led1": <bool>, "led2": <bool>}`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub led1: bool,
    pub led2: bool,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"led1\": {}, \"led2\": {}}}", self.led1, self.led2)
    }
}

/// Result of a toggle, rendered as `{"led1": <bool>}`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToggleReport {
    pub device: Device,
    pub on: bool,
}

impl fmt::Display for ToggleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"{}\": {}}}", self.device.key(), self.on)
    }
}

/// Owner of the draw surface and of the two device outputs
pub struct StatusPanel<B, LED> {
    lcd: Lcd<B>,
    leds: [LED; 2],
    on: [bool; 2],
}

/// The panel behind a mutex, for the button task and the control surface to share
pub type SharedPanel<M, B, LED> = Mutex<M, StatusPanel<B, LED>>;

impl<B, LED> StatusPanel<B, LED>
where
    B: Bus,
    LED: OutputPin,
{
    /// Take over an initialised display and switch both devices off
    pub fn new(lcd: Lcd<B>, mut leds: [LED; 2]) -> Result<Self, StatusError> {
        for led in leds.iter_mut() {
            led.set_low().map_err(|e| StatusError::Output(e.kind()))?;
        }
        Ok(Self {
            lcd,
            leds,
            on: [false; 2],
        })
    }

    pub fn is_on(&self, device: Device) -> bool {
        self.on[device.index()]
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            led1: self.on[0],
            led2: self.on[1],
        }
    }

    /// Draw the home screen from scratch.
    ///
    /// The screen is turned to landscape, cleared to black with a loading message, the
    /// optional image is drawn from the top-left corner, then the framed panel with the
    /// network line and both device lines goes on top.
    pub fn render_home(&mut self, image: Option<Image<'_>>) -> Result<(), StatusError> {
        let lcd = &mut self.lcd;
        lcd.set_orientation(Orientation::Deg270)?;
        lcd.fill_screen(Color::BLACK)?;
        lcd.draw_centered_string(
            LOADING,
            &TextStyle::new(Color::WHITE, Color::BLACK, FontSize::Size16).overlay(),
        )?;

        if let Some(image) = image {
            lcd.blit_image(0, 0, image.width, image.height, image.pixels)?;
        }

        lcd.draw_box(20, 15, 120, 90, PANEL_FILL, true)?;
        lcd.draw_box(20, 15, 120, 90, Color::WHITE, false)?;
        lcd.draw_box(25, 20, 110, 80, Color::WHITE, false)?;

        let label = |background| TextStyle::new(Color::BLACK, background, FontSize::Size12).overlay();
        lcd.draw_string(LABEL_X, 25, NETWORK_LINE, &label(LINE_COLORS[0]))?;
        for device in [Device::One, Device::Two] {
            self.lcd.draw_string(
                LABEL_X,
                device.row(),
                device.label(),
                &label(LINE_COLORS[device.index()]),
            )?;
            self.draw_state(device)?;
        }
        Ok(())
    }

    /// Flip a device, switch its output and redraw its state word
    pub fn toggle(&mut self, device: Device) -> Result<ToggleReport, StatusError> {
        let on = !self.is_on(device);
        let led = &mut self.leds[device.index()];
        let switched = if on { led.set_high() } else { led.set_low() };
        switched.map_err(|e| StatusError::Output(e.kind()))?;
        self.on[device.index()] = on;

        #[cfg(feature = "defmt")]
        defmt::info!("{} switched {}", device, if on { "on" } else { "off" });

        self.draw_state(device)?;
        Ok(ToggleReport { device, on })
    }

    /// Back toggles device one, Next toggles device two
    pub fn handle(&mut self, event: ButtonEvent) -> Result<ToggleReport, StatusError> {
        self.toggle(event.id.into())
    }

    fn draw_state(&mut self, device: Device) -> Result<(), Error> {
        let (word, color) = if self.is_on(device) {
            ("ON ", Color::BLUE)
        } else {
            ("OFF", Color::RED)
        };
        let style = TextStyle::new(color, LINE_COLORS[device.index()], FontSize::Size12);
        self.lcd.draw_string(STATE_X, device.row(), word, &style)
    }

    /// Direct access to the draw surface
    pub fn lcd_mut(&mut self) -> &mut Lcd<B> {
        &mut self.lcd
    }

    /// Give back the draw surface and the outputs
    pub fn release(self) -> (Lcd<B>, [LED; 2]) {
        (self.lcd, self.leds)
    }
}

/// Apply every confirmed button press to the shared panel.
///
/// Runs until an update fails and returns that error.
pub async fn serve_buttons<MP, MQ, B, LED, L, D>(
    buttons: &mut ButtonTask<'_, MQ, L, D>,
    panel: &SharedPanel<MP, B, LED>,
) -> Result<Infallible, StatusError>
where
    MP: RawMutex,
    MQ: RawMutex,
    B: Bus,
    LED: OutputPin,
    L: ButtonLevels,
    D: DelayNs,
{
    loop {
        let event = buttons.next_press().await;
        let result = panel.lock().await.handle(event);
        if let Err(e) = result {
            #[cfg(feature = "defmt")]
            defmt::warn!("button {} not applied: {}", event.id, e);
            return Err(e);
        }
    }
}

/// Toggle a device on behalf of a remote caller, under the panel lock
pub async fn remote_toggle<M, B, LED>(
    panel: &SharedPanel<M, B, LED>,
    device: Device,
) -> Result<ToggleReport, StatusError>
where
    M: RawMutex,
    B: Bus,
    LED: OutputPin,
{
    panel.lock().await.toggle(device)
}
