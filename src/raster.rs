//! Geometric primitives and raster blits.

use crate::display::{DrawWindow, Lcd};
use crate::interface::Bus;
use crate::{Color, Error};

impl<B> Lcd<B>
where
    B: Bus,
{
    /// Draw a single pixel
    pub fn draw_point(&mut self, x: u16, y: u16, color: Color) -> Result<(), Error> {
        self.plot(x, y, color)?;
        self.reset_window()
    }

    /// Draw a straight line between two on-screen points, both ends included.
    ///
    /// A zero-length line draws one point.
    pub fn draw_line(&mut self, x0: u16, y0: u16, x1: u16, y1: u16, color: Color) -> Result<(), Error> {
        self.check_point(x0, y0)?;
        self.check_point(x1, y1)?;
        self.line(x0, y0, x1, y1, color)?;
        self.reset_window()
    }

    /// Draw a rectangle given by two opposite corners, filled or as a one pixel outline
    pub fn draw_rect(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        color: Color,
        fill: bool,
    ) -> Result<(), Error> {
        let window = DrawWindow::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        if !window.fits(self.descriptor()) {
            return Err(Error::InvalidWindow(window));
        }

        if fill {
            self.fill_window(window, color)?;
        } else {
            let DrawWindow {
                x_start,
                y_start,
                x_end,
                y_end,
            } = window;
            self.line(x_start, y_start, x_end, y_start, color)?; // top
            self.line(x_start, y_end, x_end, y_end, color)?; // bottom
            self.line(x_start, y_start, x_start, y_end, color)?; // left
            self.line(x_end, y_start, x_end, y_end, color)?; // right
        }
        self.reset_window()
    }

    /// Draw a rectangle given by its top-left corner and size. An empty box draws nothing.
    pub fn draw_box(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        color: Color,
        fill: bool,
    ) -> Result<(), Error> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        let (x1, y1) = far_corner(x, y, w, h)?;
        self.draw_rect(x, y, x1, y1, color, fill)
    }

    /// Draw a circle with the midpoint algorithm.
    ///
    /// Parts of the circle that fall off screen are skipped. A radius of 0 draws the
    /// center pixel only.
    pub fn draw_circle(&mut self, xc: u16, yc: u16, r: u16, color: Color, fill: bool) -> Result<(), Error> {
        let (xc, yc) = (i32::from(xc), i32::from(yc));
        if r == 0 {
            self.plot_clipped(xc, yc, color)?;
            return self.reset_window();
        }

        let mut x = 0;
        let mut y = i32::from(r);
        let mut d = 3 - 2 * i32::from(r);

        while x <= y {
            if fill {
                for yi in x..=y {
                    self.circle_octants(xc, yc, x, yi, color)?;
                }
            } else {
                self.circle_octants(xc, yc, x, y, color)?;
            }

            if d < 0 {
                d += 4 * x + 6;
            } else {
                d += 4 * (x - y) + 10;
                y -= 1;
            }
            x += 1;
        }
        self.reset_window()
    }

    /// Draw a triangle, filled with a scanline sweep or as three lines.
    ///
    /// The vertices can be given in any order.
    pub fn draw_triangle(
        &mut self,
        p0: (u16, u16),
        p1: (u16, u16),
        p2: (u16, u16),
        color: Color,
        fill: bool,
    ) -> Result<(), Error> {
        for (x, y) in [p0, p1, p2] {
            self.check_point(x, y)?;
        }

        if fill {
            self.fill_triangle(p0, p1, p2, color)?;
        } else {
            self.line(p0.0, p0.1, p1.0, p1.1, color)?;
            self.line(p1.0, p1.1, p2.0, p2.1, color)?;
            self.line(p2.0, p2.1, p0.0, p0.1, color)?;
        }
        self.reset_window()
    }

    /// Copy a `w` x `h` RGB565 raster to the screen, row by row. No conversion is done.
    pub fn blit_image(&mut self, x: u16, y: u16, w: u16, h: u16, pixels: &[u16]) -> Result<(), Error> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        let window = self.image_window(x, y, w, h)?;
        let expected = usize::from(w) * usize::from(h);
        if pixels.len() < expected {
            return Err(Error::ImageTooSmall {
                expected,
                actual: pixels.len(),
            });
        }

        self.set_window(window)?;
        for &px in &pixels[..expected] {
            self.write_color(Color(px))?;
        }
        self.reset_window()
    }

    /// Copy a `w` x `h` raster stored as little-endian byte pairs (low byte first)
    pub fn blit_le_bytes(&mut self, x: u16, y: u16, w: u16, h: u16, bytes: &[u8]) -> Result<(), Error> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        let window = self.image_window(x, y, w, h)?;
        let expected = usize::from(w) * usize::from(h) * 2;
        if bytes.len() < expected {
            return Err(Error::ImageTooSmall {
                expected,
                actual: bytes.len(),
            });
        }

        self.set_window(window)?;
        for px in bytes[..expected].chunks_exact(2) {
            self.write_color(Color(u16::from_le_bytes([px[0], px[1]])))?;
        }
        self.reset_window()
    }

    fn image_window(&self, x: u16, y: u16, w: u16, h: u16) -> Result<DrawWindow, Error> {
        let (x1, y1) = far_corner(x, y, w, h)?;
        let window = DrawWindow::new(x, y, x1, y1);
        if window.fits(self.descriptor()) {
            Ok(window)
        } else {
            Err(Error::InvalidWindow(window))
        }
    }

    pub(crate) fn check_point(&self, x: u16, y: u16) -> Result<(), Error> {
        let window = DrawWindow::point(x, y);
        if window.fits(self.descriptor()) {
            Ok(())
        } else {
            Err(Error::InvalidWindow(window))
        }
    }

    /// Bresenham walk along the major axis; both endpoints must be on screen
    fn line(&mut self, x0: u16, y0: u16, x1: u16, y1: u16, color: Color) -> Result<(), Error> {
        let (mut x, mut y) = (i32::from(x0), i32::from(y0));
        let dx = i32::from(x1) - x;
        let dy = i32::from(y1) - y;
        let (step_x, step_y) = (dx.signum(), dy.signum());
        let (dx, dy) = (dx.abs(), dy.abs());
        let distance = dx.max(dy);

        let mut x_err = distance / 2;
        let mut y_err = distance / 2;
        for _ in 0..=distance {
            self.plot(x as u16, y as u16, color)?;

            x_err += dx;
            if x_err >= distance {
                x_err -= distance;
                x += step_x;
            }
            y_err += dy;
            if y_err >= distance {
                y_err -= distance;
                y += step_y;
            }
        }
        Ok(())
    }

    fn circle_octants(&mut self, xc: i32, yc: i32, x: i32, y: i32, color: Color) -> Result<(), Error> {
        self.plot_clipped(xc + x, yc + y, color)?;
        self.plot_clipped(xc - x, yc + y, color)?;
        self.plot_clipped(xc + x, yc - y, color)?;
        self.plot_clipped(xc - x, yc - y, color)?;
        self.plot_clipped(xc + y, yc + x, color)?;
        self.plot_clipped(xc - y, yc + x, color)?;
        self.plot_clipped(xc + y, yc - x, color)?;
        self.plot_clipped(xc - y, yc - x, color)
    }

    fn fill_triangle(
        &mut self,
        p0: (u16, u16),
        p1: (u16, u16),
        p2: (u16, u16),
        color: Color,
    ) -> Result<(), Error> {
        let mut v = [p0, p1, p2].map(|(x, y)| (i32::from(x), i32::from(y)));
        v.sort_unstable_by_key(|&(_, y)| y);
        let [(x0, y0), (x1, y1), (x2, y2)] = v;

        // all on one row
        if y0 == y2 {
            let a = x0.min(x1).min(x2);
            let b = x0.max(x1).max(x2);
            return self.span(a, b, y0, color);
        }

        let (dx01, dy01) = (x1 - x0, y1 - y0);
        let (dx02, dy02) = (x2 - x0, y2 - y0);
        let (dx12, dy12) = (x2 - x1, y2 - y1);

        // upper half, including the middle row only for a flat bottom
        let last = if y1 == y2 { y1 } else { y1 - 1 };
        let mut sa = 0;
        let mut sb = 0;
        let mut y = y0;
        while y <= last {
            let a = x0 + sa / dy01;
            let b = x0 + sb / dy02;
            sa += dx01;
            sb += dx02;
            self.span(a, b, y, color)?;
            y += 1;
        }

        // lower half
        let mut sa = dx12 * (y - y1);
        let mut sb = dx02 * (y - y0);
        while y <= y2 {
            let a = x1 + sa / dy12;
            let b = x0 + sb / dy02;
            sa += dx12;
            sb += dx02;
            self.span(a, b, y, color)?;
            y += 1;
        }
        Ok(())
    }

    fn span(&mut self, a: i32, b: i32, y: i32, color: Color) -> Result<(), Error> {
        self.fill_window(DrawWindow::span(a as u16, b as u16, y as u16), color)
    }
}

/// Bottom-right corner of a non-empty box, if it is addressable at all
fn far_corner(x: u16, y: u16, w: u16, h: u16) -> Result<(u16, u16), Error> {
    match (x.checked_add(w - 1), y.checked_add(h - 1)) {
        (Some(x1), Some(y1)) => Ok((x1, y1)),
        _ => Err(Error::InvalidWindow(DrawWindow::new(
            x,
            y,
            x.saturating_add(w - 1),
            y.saturating_add(h - 1),
        ))),
    }
}
