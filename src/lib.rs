//! Driver and rasterizer for the Sitronix ST7735S 128x160 TFT controller, driven over a
//! 4-wire SPI bus (clock, data, chip-select, command/data-select).
//!
//! The crate is split the way the hardware is used:
//!
//! * [`interface`]: command/data framing onto the bus ([`Bus`], [`SpiBus`]).
//! * [`Lcd`]: display state and addressing window management.
//! * The drawing primitives (point, line, rectangle, circle, triangle, text, images) are
//!   implemented on [`Lcd`] for any [`Bus`].
//! * [`blocking`]: reset and controller bring-up for a real panel.
//! * [`input`] and [`status`]: debounced button events and the status screen they update.
//!
//! Rust [embedded-graphics](https://github.com/embedded-graphics/embedded-graphics) support is
//! enabled with the `graphics` feature, which is enabled by default.
#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod blocking;
mod color;
pub mod constants;
mod display;
pub mod font;
pub mod input;
pub mod interface;
mod raster;
pub mod status;
mod text;

#[cfg(test)]
mod mock;

pub use color::Color;
pub use display::{DisplayDescriptor, DrawWindow, FillPath, Lcd, Orientation};
pub use font::FontSize;
pub use interface::{Bus, SpiBus};
pub use text::{TextMode, TextStyle};

use core::fmt;

/// Native panel width in pixels (0° orientation)
pub const WIDTH: u16 = 128;
/// Native panel height in pixels (0° orientation)
pub const HEIGHT: u16 = 160;

/// Controller configuration applied by [`blocking::St7735s::init`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Orientation programmed after the power-on sequence
    pub orientation: Orientation,
    /// Color the whole screen is cleared to once the panel is on
    pub background: Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orientation: Orientation::Deg0,
            background: Color::WHITE,
        }
    }
}

/// Why a bus transaction failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportFault {
    /// The SPI device rejected the write
    Spi(embedded_hal::spi::ErrorKind),
    /// The command/data-select line could not be driven
    Pin(embedded_hal::digital::ErrorKind),
}

/// Errors returned by the driver and the rasterizer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A bus transaction failed. The controller may be left mid-window; the next
    /// primitive reprograms the window before writing pixels.
    Transport(TransportFault),
    /// The window is inverted or reaches outside the current screen. Nothing was sent.
    InvalidWindow(DrawWindow),
    /// Glyphs only exist in 12 and 16 row heights
    UnsupportedGlyphSize(u8),
    /// Only printable ASCII (0x20..=0x7E) has glyphs
    UnsupportedCharacter(u8),
    /// The pixel slice is shorter than the image it is supposed to describe
    ImageTooSmall { expected: usize, actual: usize },
    /// Each side must be 1 to 256 pixels so every coordinate fits the low address byte
    UnsupportedGeometry { width: u16, height: u16 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(TransportFault::Spi(kind)) => write!(f, "spi transfer failed: {kind:?}"),
            Error::Transport(TransportFault::Pin(kind)) => {
                write!(f, "command/data select failed: {kind:?}")
            }
            Error::InvalidWindow(w) => write!(
                f,
                "invalid window ({}, {})..=({}, {})",
                w.x_start, w.y_start, w.x_end, w.y_end
            ),
            Error::UnsupportedGlyphSize(size) => write!(f, "no {size} row font"),
            Error::UnsupportedCharacter(code) => write!(f, "no glyph for byte {code:#04x}"),
            Error::ImageTooSmall { expected, actual } => {
                write!(f, "image needs {expected} elements, got {actual}")
            }
            Error::UnsupportedGeometry { width, height } => {
                write!(f, "cannot address a {width}x{height} panel")
            }
        }
    }
}
