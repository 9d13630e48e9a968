//! Animated test pattern.

use image::{Rgba, RgbaImage};
use vsdl::Size;

const BAR_WIDTH: u32 = 16;

/// Diagonal color bars that scroll one pixel per frame, with a cursor marker.
pub struct Pattern {
    frame: RgbaImage,
    tick: u32,
    cursor: Option<(i32, i32)>,
}

impl Pattern {
    pub fn new(size: Size) -> Self {
        Self {
            frame: RgbaImage::new(size.width, size.height),
            tick: 0,
            cursor: None,
        }
    }

    /// Pointer position in back-buffer coordinates.
    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Some((x, y));
    }

    /// Advance one frame and return it.
    pub fn paint(&mut self) -> &RgbaImage {
        let tick = self.tick;
        for (x, y, pixel) in self.frame.enumerate_pixels_mut() {
            *pixel = bar_color((x + y + tick) / BAR_WIDTH);
        }
        if let Some((cx, cy)) = self.cursor {
            self.mark(cx, cy);
        }
        self.tick = self.tick.wrapping_add(1);
        &self.frame
    }

    fn mark(&mut self, cx: i32, cy: i32) {
        let (width, height) = self.frame.dimensions();
        for d in -4..=4 {
            for (x, y) in [(cx + d, cy), (cx, cy + d)] {
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    self.frame.put_pixel(x as u32, y as u32, Rgba([255, 255, 255, 255]));
                }
            }
        }
    }
}

fn bar_color(index: u32) -> Rgba<u8> {
    match index % 4 {
        0 => Rgba([200, 40, 40, 255]),
        1 => Rgba([40, 200, 40, 255]),
        2 => Rgba([40, 40, 200, 255]),
        _ => Rgba([20, 20, 20, 255]),
    }
}
