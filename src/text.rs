//! Bitmap text rendering.

use crate::display::{DrawWindow, Lcd};
use crate::font::{self, FontSize};
use crate::interface::Bus;
use crate::{Color, Error};

/// How glyph background pixels are treated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextMode {
    /// The whole glyph cell is written, unset pixels in the background color
    #[default]
    Opaque,
    /// Only set pixels are written, the screen shows through the rest
    Overlay,
}

/// Colors, size and mode for one text call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextStyle {
    pub foreground: Color,
    pub background: Color,
    pub size: FontSize,
    pub mode: TextMode,
}

impl TextStyle {
    /// Opaque text
    pub const fn new(foreground: Color, background: Color, size: FontSize) -> Self {
        Self {
            foreground,
            background,
            size,
            mode: TextMode::Opaque,
        }
    }

    /// Same style, drawing only the set pixels
    pub const fn overlay(mut self) -> Self {
        self.mode = TextMode::Overlay;
        self
    }
}

impl<B> Lcd<B>
where
    B: Bus,
{
    /// Draw one printable ASCII character with its top-left corner at `(x, y)`
    pub fn draw_char(&mut self, x: u16, y: u16, code: u8, style: &TextStyle) -> Result<(), Error> {
        let rows = font::glyph(code, style.size)?;
        let cell = self.text_window(x, y, 1, style.size)?;
        self.glyph_at(cell, rows, style)?;
        self.reset_window()
    }

    /// Draw a string on one line, left to right.
    ///
    /// Bytes outside printable ASCII are skipped and take no space. The whole line must
    /// fit on screen, otherwise nothing is drawn.
    pub fn draw_string(&mut self, x: u16, y: u16, text: &str, style: &TextStyle) -> Result<(), Error> {
        let count = printable_len(text);
        if count == 0 {
            return Ok(());
        }
        self.text_window(x, y, count, style.size)?;

        let advance = style.size.width();
        let mut cursor = x;
        for code in text.bytes().filter(|&c| font::is_printable(c)) {
            let rows = font::glyph(code, style.size)?;
            let cell = self.text_window(cursor, y, 1, style.size)?;
            self.glyph_at(cell, rows, style)?;
            cursor += advance;
        }
        self.reset_window()
    }

    /// Draw a string centered on the screen, horizontally by its printable length
    pub fn draw_centered_string(&mut self, text: &str, style: &TextStyle) -> Result<(), Error> {
        let (x, y) = self.centered_origin(text, style.size);
        self.draw_string(x, y, text, style)
    }

    /// Top-left corner that centers `text` on the current screen
    pub fn centered_origin(&self, text: &str, size: FontSize) -> (u16, u16) {
        let span = u32::from(printable_len(text)) * u32::from(size.width());
        let x = u32::from(self.width()).saturating_sub(span) / 2;
        let y = self.height().saturating_sub(size.rows()) / 2;
        (x as u16, y)
    }

    /// Draw the low `digits` decimal digits of `value`, right aligned in `digits` cells.
    ///
    /// Leading zeros are drawn as spaces, except in the last cell so 0 still shows.
    /// Higher digits that do not fit are dropped. `digits == 0` draws nothing.
    pub fn draw_number(
        &mut self,
        x: u16,
        y: u16,
        value: u32,
        digits: u8,
        style: &TextStyle,
    ) -> Result<(), Error> {
        if digits == 0 {
            return Ok(());
        }
        self.text_window(x, y, u16::from(digits), style.size)?;

        let advance = style.size.width();
        let mut leading = true;
        for t in 0..digits {
            let place = u32::from(digits - t - 1);
            let digit = match 10u64.checked_pow(place) {
                Some(divisor) => (u64::from(value) / divisor % 10) as u8,
                None => 0,
            };
            let code = if leading && digit == 0 && t + 1 < digits {
                b' '
            } else {
                leading = false;
                b'0' + digit
            };

            let rows = font::glyph(code, style.size)?;
            let cell = self.text_window(x + advance * u16::from(t), y, 1, style.size)?;
            self.glyph_at(cell, rows, style)?;
        }
        self.reset_window()
    }

    /// Window covering `count` glyph cells from `(x, y)`, if it is on screen
    fn text_window(&self, x: u16, y: u16, count: u16, size: FontSize) -> Result<DrawWindow, Error> {
        let clamp = |v: u32| u16::try_from(v).unwrap_or(u16::MAX);
        let x_end = u32::from(x) + u32::from(count) * u32::from(size.width()) - 1;
        let y_end = u32::from(y) + u32::from(size.rows()) - 1;
        let window = DrawWindow::new(x, y, clamp(x_end), clamp(y_end));
        if window.fits(self.descriptor()) {
            Ok(window)
        } else {
            Err(Error::InvalidWindow(window))
        }
    }

    /// Render one glyph into `cell`, leaving the window wherever the glyph left it
    fn glyph_at(&mut self, cell: DrawWindow, rows: &[u8], style: &TextStyle) -> Result<(), Error> {
        let width = style.size.width();
        match style.mode {
            TextMode::Opaque => {
                self.set_window(cell)?;
                for &row in rows {
                    for column in 0..width {
                        let color = if row >> column & 1 == 1 {
                            style.foreground
                        } else {
                            style.background
                        };
                        self.write_color(color)?;
                    }
                }
            }
            TextMode::Overlay => {
                for (dy, &row) in (0u16..).zip(rows) {
                    for column in (0..width).filter(|c| row >> c & 1 == 1) {
                        self.plot(cell.x_start + column, cell.y_start + dy, style.foreground)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn printable_len(text: &str) -> u16 {
    let count = text.bytes().filter(|&c| font::is_printable(c)).count();
    u16::try_from(count).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{RecordingBus, Screen};
    use std::collections::BTreeSet;
    use std::vec::Vec;

    const FULL: DrawWindow = DrawWindow::new(0, 0, 127, 159);
    const STYLE16: TextStyle = TextStyle::new(Color::WHITE, Color::BLACK, FontSize::Size16);
    const STYLE12: TextStyle = TextStyle::new(Color::WHITE, Color::BLACK, FontSize::Size12);

    fn lcd() -> Lcd<RecordingBus> {
        Lcd::new(RecordingBus::default())
    }

    fn screen(lcd: &Lcd<RecordingBus>) -> Screen {
        lcd.bus().screen(lcd.width(), lcd.height())
    }

    fn set_bits(code: u8, size: FontSize, x: u16, y: u16) -> BTreeSet<(u16, u16)> {
        let rows = font::glyph(code, size).unwrap();
        let mut set = BTreeSet::new();
        for (dy, &row) in (0u16..).zip(rows) {
            for c in 0..size.width() {
                if row >> c & 1 == 1 {
                    set.insert((x + c, y + dy));
                }
            }
        }
        set
    }

    #[test]
    fn opaque_char_fills_its_cell() {
        let mut lcd = lcd();
        lcd.draw_char(10, 20, b'O', &STYLE16).unwrap();
        assert_eq!(lcd.bus().windows(), [DrawWindow::new(10, 20, 17, 35), FULL]);
        assert_eq!(lcd.bus().data16_count(), 8 * 16);

        let screen = screen(&lcd);
        assert_eq!(screen.painted().len(), 8 * 16);
        assert_eq!(
            screen.painted_with(Color::WHITE.0),
            set_bits(b'O', FontSize::Size16, 10, 20)
        );
    }

    #[test]
    fn overlay_char_only_writes_set_pixels() {
        let mut lcd = lcd();
        let style = STYLE12.overlay();
        lcd.draw_char(0, 0, b'A', &style).unwrap();
        let expected = set_bits(b'A', FontSize::Size12, 0, 0);
        assert_eq!(lcd.bus().data16_count(), expected.len());
        assert!(lcd.bus().data16().all(|v| v == Color::WHITE.0));
        assert_eq!(screen(&lcd).painted(), expected);
        assert_eq!(lcd.bus().windows().last(), Some(&FULL));
    }

    #[test]
    fn bad_characters_are_rejected_before_sending() {
        let mut lcd = lcd();
        assert_eq!(
            lcd.draw_char(0, 0, 0x7F, &STYLE16),
            Err(Error::UnsupportedCharacter(0x7F))
        );
        assert_eq!(
            lcd.draw_char(0, 150, b'A', &STYLE16),
            Err(Error::InvalidWindow(DrawWindow::new(0, 150, 7, 165)))
        );
        assert!(lcd.bus().ops.is_empty());
    }

    #[test]
    fn string_skips_non_printables_without_advancing() {
        let mut lcd = lcd();
        lcd.draw_string(4, 4, "A\nB\x07C", &STYLE12).unwrap();
        assert_eq!(
            lcd.bus().windows(),
            [
                DrawWindow::new(4, 4, 9, 15),
                DrawWindow::new(10, 4, 15, 15),
                DrawWindow::new(16, 4, 21, 15),
                FULL,
            ]
        );
    }

    #[test]
    fn string_that_runs_off_screen_draws_nothing() {
        let mut lcd = lcd();
        assert_eq!(
            lcd.draw_string(120, 0, "AB", &STYLE16),
            Err(Error::InvalidWindow(DrawWindow::new(120, 0, 135, 15)))
        );
        assert!(lcd.bus().ops.is_empty());

        lcd.draw_string(0, 0, "\n\t", &STYLE16).unwrap();
        assert!(lcd.bus().ops.is_empty());
    }

    #[test]
    fn centered_string_origin() {
        let mut lcd = lcd();
        assert_eq!(lcd.centered_origin("OK", FontSize::Size16), (56, 72));
        lcd.draw_centered_string("OK", &STYLE16).unwrap();
        assert_eq!(
            lcd.bus().windows(),
            [
                DrawWindow::new(56, 72, 63, 87),
                DrawWindow::new(64, 72, 71, 87),
                FULL
            ]
        );
    }

    #[test]
    fn centering_counts_printable_characters_only() {
        let lcd = lcd();
        assert_eq!(
            lcd.centered_origin("O\nK", FontSize::Size16),
            lcd.centered_origin("OK", FontSize::Size16)
        );
        // wider than the screen pins to the left edge
        let long = "0123456789012345678901234567890";
        assert_eq!(lcd.centered_origin(long, FontSize::Size12).0, 0);
    }

    #[test]
    fn centered_on_landscape() {
        let mut lcd = lcd();
        lcd.set_orientation(crate::Orientation::Deg270).unwrap();
        assert_eq!(lcd.centered_origin("Loading...", FontSize::Size16), (40, 56));
    }

    #[test]
    fn number_suppresses_leading_zeros() {
        let mut number = lcd();
        number.draw_number(0, 0, 42, 4, &STYLE16).unwrap();

        let mut chars = lcd();
        for (i, code) in [b' ', b' ', b'4', b'2'].into_iter().enumerate() {
            chars.draw_char(8 * i as u16, 0, code, &STYLE16).unwrap();
        }

        let windows = number.bus().windows();
        let starts: Vec<u16> = windows.iter().map(|w| w.x_start).collect();
        assert_eq!(starts, [0, 8, 16, 24, 0]);
        assert_eq!(windows.last(), Some(&FULL));

        let (a, b) = (screen(&number), screen(&chars));
        assert_eq!(a.painted(), b.painted());
        assert_eq!(a.painted_with(Color::WHITE.0), b.painted_with(Color::WHITE.0));
    }

    #[test]
    fn number_keeps_last_zero_and_truncates() {
        let white = |lcd: &Lcd<RecordingBus>| screen(lcd).painted_with(Color::WHITE.0);
        let cases = [(0, 3, "  0"), (12345, 3, "345"), (u32::MAX, 12, "  4294967295")];
        for (value, digits, text) in cases {
            let mut number = lcd();
            number.draw_number(0, 0, value, digits, &STYLE12).unwrap();
            let mut expected = lcd();
            expected.draw_string(0, 0, text, &STYLE12).unwrap();
            assert_eq!(white(&number), white(&expected), "{value}");
        }
    }

    #[test]
    fn zero_digits_is_a_no_op() {
        let mut lcd = lcd();
        lcd.draw_number(0, 0, 7, 0, &STYLE16).unwrap();
        assert!(lcd.bus().ops.is_empty());
    }
}
