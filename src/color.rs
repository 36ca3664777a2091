#[cfg(feature = "graphics")]
use embedded_graphics_core::pixelcolor::{
    raw::{RawData, RawU16},
    Rgb565,
};

/// A 16-bit RGB565 color, exactly as it is sent to the controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color(pub u16);

impl Color {
    pub const WHITE: Color = Color(0xFFFF);
    pub const BLACK: Color = Color(0x0000);
    pub const BLUE: Color = Color(0x001F);
    pub const RED: Color = Color(0xF800);
    pub const GREEN: Color = Color(0x07E0);
    pub const CYAN: Color = Color(0x7FFF);
    pub const YELLOW: Color = Color(0xFFE0);
    pub const BROWN: Color = Color(0xBC40);
    pub const SKIN: Color = Color(0xFC07);
    pub const GRAY: Color = Color(0x8430);

    /// Pack 8-bit channels, dropping the low bits of each
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3))
    }

    /// The packed value
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// 5-bit red channel
    pub const fn r(self) -> u8 {
        (self.0 >> 11) as u8
    }

    /// 6-bit green channel
    pub const fn g(self) -> u8 {
        ((self.0 >> 5) & 0x3F) as u8
    }

    /// 5-bit blue channel
    pub const fn b(self) -> u8 {
        (self.0 & 0x1F) as u8
    }
}

impl From<u16> for Color {
    fn from(raw: u16) -> Self {
        Color(raw)
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.0
    }
}

#[cfg(feature = "graphics")]
impl From<Rgb565> for Color {
    fn from(color: Rgb565) -> Self {
        Color(RawU16::from(color).into_inner())
    }
}

#[cfg(feature = "graphics")]
impl From<Color> for Rgb565 {
    fn from(color: Color) -> Self {
        RawU16::new(color.0).into()
    }
}
