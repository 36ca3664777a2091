use crate::constants::{madctl_flags, Instruction, CONTROLLER_ID};
use crate::interface::Bus;
use crate::{Color, Error, HEIGHT, WIDTH};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "graphics")]
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::Rgb565,
    primitives::Rectangle,
    Pixel,
};

/// Longest side the window protocol can address with a `0x00` high byte
const MAX_SIDE: u16 = 256;

/// Geometry and opcodes of the attached controller.
///
/// `width` and `height` always describe the current orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayDescriptor {
    pub width: u16,
    pub height: u16,
    pub controller_id: u16,
    pub ram_write_opcode: u8,
    pub set_column_opcode: u8,
    pub set_row_opcode: u8,
}

impl DisplayDescriptor {
    /// The 128x160 ST7735S panel in its native orientation
    pub const fn st7735s() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            controller_id: CONTROLLER_ID,
            ram_write_opcode: Instruction::RAMWR as u8,
            set_column_opcode: Instruction::CASET as u8,
            set_row_opcode: Instruction::RASET as u8,
        }
    }

    /// Window covering the whole screen.
    ///
    /// For a zero-sized side the window degenerates to that side's origin and does not
    /// [`fit`](DrawWindow::fits).
    pub const fn full_window(&self) -> DrawWindow {
        DrawWindow::new(0, 0, self.width.saturating_sub(1), self.height.saturating_sub(1))
    }

    /// True if both sides are non-zero and every coordinate has a zero high byte
    pub const fn is_addressable(&self) -> bool {
        self.width >= 1 && self.width <= MAX_SIDE && self.height >= 1 && self.height <= MAX_SIDE
    }

    /// True if the pixel is on screen
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    /// Number of pixels on screen
    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

impl Default for DisplayDescriptor {
    fn default() -> Self {
        Self::st7735s()
    }
}

/// A rectangular controller write region, both corners inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrawWindow {
    pub x_start: u16,
    pub y_start: u16,
    pub x_end: u16,
    pub y_end: u16,
}

impl DrawWindow {
    pub const fn new(x_start: u16, y_start: u16, x_end: u16, y_end: u16) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
        }
    }

    /// 1x1 window on a single pixel
    pub const fn point(x: u16, y: u16) -> Self {
        Self::new(x, y, x, y)
    }

    /// Window on a single row, `x0` and `x1` in any order
    pub fn span(x0: u16, x1: u16, y: u16) -> Self {
        Self::new(x0.min(x1), y, x0.max(x1), y)
    }

    pub const fn width(&self) -> u32 {
        self.x_end as u32 - self.x_start as u32 + 1
    }

    pub const fn height(&self) -> u32 {
        self.y_end as u32 - self.y_start as u32 + 1
    }

    /// Pixel writes needed to fill the window exactly once
    pub const fn pixel_count(&self) -> u32 {
        self.width() * self.height()
    }

    /// True if the window is ordered and lies entirely on the described screen
    pub fn fits(&self, display: &DisplayDescriptor) -> bool {
        self.x_start <= self.x_end
            && self.y_start <= self.y_end
            && self.x_end < display.width
            && self.y_end < display.height
    }
}

/// Screen rotation, applied through the memory access control register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    /// MADCTL data byte for this rotation
    pub const fn madctl(self) -> u8 {
        use madctl_flags::*;
        match self {
            Orientation::Deg0 => ROW_ORDER | COLUMN_ORDER,
            Orientation::Deg90 => ROW_ORDER | ROW_COLUMN_EXCHANGE,
            Orientation::Deg180 => 0,
            Orientation::Deg270 => COLUMN_ORDER | ROW_COLUMN_EXCHANGE,
        }
    }

    /// True if rows and columns are exchanged, so width and height swap
    pub const fn is_landscape(self) -> bool {
        matches!(self, Orientation::Deg90 | Orientation::Deg270)
    }
}

/// How a full-screen fill reached the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FillPath {
    /// One transaction from a pre-filled buffer
    Bulk,
    /// One transaction per pixel
    Streamed,
}

/// Draw surface: the bus, the controller geometry and the current orientation.
///
/// Every drawing primitive programs the addressing window it needs, streams its pixels
/// and programs the full-screen window again before returning, so primitives never see
/// each other's windows.
pub struct Lcd<B> {
    bus: B,
    descriptor: DisplayDescriptor,
    orientation: Orientation,
}

impl<B> Lcd<B>
where
    B: Bus,
{
    /// Create new draw surface for a 128x160 panel in its native orientation.
    ///
    /// No bytes are sent; the controller is assumed to be initialised already.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            descriptor: DisplayDescriptor::st7735s(),
            orientation: Orientation::Deg0,
        }
    }

    /// Create new draw surface for a panel with a different geometry or opcodes.
    ///
    /// Fails with [`Error::UnsupportedGeometry`] unless both sides are 1 to 256 pixels.
    pub fn with_descriptor(bus: B, descriptor: DisplayDescriptor) -> Result<Self, Error> {
        if !descriptor.is_addressable() {
            return Err(Error::UnsupportedGeometry {
                width: descriptor.width,
                height: descriptor.height,
            });
        }
        Ok(Self {
            bus,
            descriptor,
            orientation: Orientation::Deg0,
        })
    }

    /// Current geometry and opcodes
    pub fn descriptor(&self) -> &DisplayDescriptor {
        &self.descriptor
    }

    /// Screen width in the current orientation
    pub fn width(&self) -> u16 {
        self.descriptor.width
    }

    /// Screen height in the current orientation
    pub fn height(&self) -> u16 {
        self.descriptor.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Direct access to the transport
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give back the transport
    pub fn release(self) -> B {
        self.bus
    }

    /// Send a command followed by its parameter bytes, one byte per transaction
    pub fn command(&mut self, reg: Instruction, data: &[u8]) -> Result<(), Error> {
        self.bus.write_command(reg as u8)?;
        for &byte in data {
            self.bus.write_data8(byte)?;
        }
        Ok(())
    }

    /// Program the controller write window and prime it for a pixel stream.
    ///
    /// Sends column-set + `[0, x_start, 0, x_end]`, row-set + `[0, y_start, 0, y_end]`
    /// and RAM-write. Subsequent pixel writes fill the window row by row.
    pub fn set_window(&mut self, window: DrawWindow) -> Result<(), Error> {
        if !window.fits(&self.descriptor) {
            return Err(Error::InvalidWindow(window));
        }
        let DisplayDescriptor {
            set_column_opcode,
            set_row_opcode,
            ram_write_opcode,
            ..
        } = self.descriptor;

        self.bus.write_command(set_column_opcode)?;
        self.write_coordinate(window.x_start)?;
        self.write_coordinate(window.x_end)?;

        self.bus.write_command(set_row_opcode)?;
        self.write_coordinate(window.y_start)?;
        self.write_coordinate(window.y_end)?;

        self.bus.write_command(ram_write_opcode)
    }

    fn write_coordinate(&mut self, value: u16) -> Result<(), Error> {
        let [hi, lo] = value.to_be_bytes();
        self.bus.write_data8(hi)?;
        self.bus.write_data8(lo)
    }

    /// Program the full-screen window
    pub fn reset_window(&mut self) -> Result<(), Error> {
        self.set_window(self.descriptor.full_window())
    }

    /// Write one pixel at the controller's current window position
    pub fn write_color(&mut self, color: Color) -> Result<(), Error> {
        self.bus.write_data16(color.0)
    }

    /// Write `count` copies of one color
    pub(crate) fn write_repeated(&mut self, color: Color, count: u32) -> Result<(), Error> {
        for _ in 0..count {
            self.bus.write_data16(color.0)?;
        }
        Ok(())
    }

    /// Set a 1x1 window and write one pixel, leaving the window in place
    pub(crate) fn plot(&mut self, x: u16, y: u16, color: Color) -> Result<(), Error> {
        self.set_window(DrawWindow::point(x, y))?;
        self.write_color(color)
    }

    /// Plot a pixel given in signed coordinates, skipping it if it is off screen
    pub(crate) fn plot_clipped(&mut self, x: i32, y: i32, color: Color) -> Result<(), Error> {
        if self.descriptor.contains(x, y) {
            self.plot(x as u16, y as u16, color)
        } else {
            Ok(())
        }
    }

    /// Set `window` and flood it with one color, leaving the window in place
    pub(crate) fn fill_window(&mut self, window: DrawWindow, color: Color) -> Result<(), Error> {
        self.set_window(window)?;
        self.write_repeated(color, window.pixel_count())
    }

    /// Rotate the screen.
    ///
    /// Rewrites the memory access control register and swaps width and height for 90° and
    /// 270°. The screen contents are left as they are; clear explicitly after rotating.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<(), Error> {
        self.command(Instruction::MADCTL, &[orientation.madctl()])?;

        if orientation.is_landscape() != self.orientation.is_landscape() {
            core::mem::swap(&mut self.descriptor.width, &mut self.descriptor.height);
        }
        self.orientation = orientation;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "orientation {} -> {}x{}",
            orientation,
            self.descriptor.width,
            self.descriptor.height
        );
        Ok(())
    }

    /// Fill the whole screen with one color, one pixel per transaction
    pub fn fill_screen(&mut self, color: Color) -> Result<(), Error> {
        self.fill_window(self.descriptor.full_window(), color)?;
        self.reset_window()
    }

    /// Fill the whole screen with one color from a heap buffer in a single transaction.
    ///
    /// Falls back to [`fill_screen`](Self::fill_screen) when the buffer cannot be
    /// allocated; the returned [`FillPath`] tells which one ran.
    #[cfg(feature = "alloc")]
    pub fn fill_screen_bulk(&mut self, color: Color) -> Result<FillPath, Error> {
        let frame = fill_buffer(self.descriptor.pixel_count() * 2);
        self.fill_screen_from(color, frame)
    }

    /// Bulk fill into `frame`, or a streamed fill when there is no buffer
    #[cfg(feature = "alloc")]
    fn fill_screen_from(
        &mut self,
        color: Color,
        frame: Option<Vec<u8>>,
    ) -> Result<FillPath, Error> {
        let Some(mut frame) = frame else {
            #[cfg(feature = "defmt")]
            defmt::warn!("no memory for the fill buffer, streaming instead");
            self.fill_screen(color)?;
            return Ok(FillPath::Streamed);
        };
        let [hi, lo] = color.0.to_be_bytes();
        for _ in 0..self.descriptor.pixel_count() {
            frame.push(hi);
            frame.push(lo);
        }

        self.set_window(self.descriptor.full_window())?;
        self.bus.write_data(&frame)?;
        drop(frame);
        self.reset_window()?;
        Ok(FillPath::Bulk)
    }

    /// Without a heap the bulk path is unavailable and the fill is always streamed
    #[cfg(not(feature = "alloc"))]
    pub fn fill_screen_bulk(&mut self, color: Color) -> Result<FillPath, Error> {
        self.fill_screen(color)?;
        Ok(FillPath::Streamed)
    }
}

/// Empty buffer with room for `len` bytes, or `None` if the heap cannot provide it
#[cfg(feature = "alloc")]
fn fill_buffer(len: usize) -> Option<Vec<u8>> {
    let mut frame = Vec::new();
    frame.try_reserve_exact(len).ok()?;
    Some(frame)
}

#[cfg(feature = "graphics")]
impl<B> DrawTarget for Lcd<B>
where
    B: Bus,
{
    type Color = Rgb565;
    type Error = Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bb = self.bounding_box();

        for Pixel(pos, color) in pixels.into_iter().filter(|Pixel(pos, _)| bb.contains(*pos)) {
            self.plot(pos.x as u16, pos.y as u16, color.into())?;
        }
        self.reset_window()
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        let window = DrawWindow::new(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        );
        self.fill_window(window, color.into())?;
        self.reset_window()
    }
}

#[cfg(feature = "graphics")]
impl<B> OriginDimensions for Lcd<B>
where
    B: Bus,
{
    fn size(&self) -> Size {
        Size::new(self.descriptor.width.into(), self.descriptor.height.into())
    }
}
