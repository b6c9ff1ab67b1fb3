use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::config::{
    SCREEN_ACC_Y, SCREEN_LAT_Y, SCREEN_LINES_MAX, SCREEN_LINE_MAX, SCREEN_LNG_Y, SCREEN_TITLE_Y,
};
use crate::types::LocationState;

pub const BOOT_SPLASH: &str = "WiFi Location - Wait!";
pub const WAITING_TITLE: &str = "WiFi Location - Wait...";
pub const LOCATION_TITLE: &str = "WiFi Location";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenLine {
    pub y: i32,
    pub text: String<SCREEN_LINE_MAX>,
}

/// Text content of one full screen, top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScreenText {
    lines: Vec<ScreenLine, SCREEN_LINES_MAX>,
}

impl ScreenText {
    pub fn boot_splash() -> Self {
        let mut screen = Self::default();
        screen.push(SCREEN_TITLE_Y, format_args!("{BOOT_SPLASH}"));
        screen
    }

    pub fn for_state(state: LocationState) -> Self {
        let mut screen = Self::default();
        let Some(location) = state.location() else {
            screen.push(SCREEN_TITLE_Y, format_args!("{WAITING_TITLE}"));
            return screen;
        };

        screen.push(SCREEN_TITLE_Y, format_args!("{LOCATION_TITLE}"));
        screen.push(SCREEN_LAT_Y, format_args!("Lat: {:.7}", location.latitude));
        screen.push(SCREEN_LNG_Y, format_args!("Lng: {:.7}", location.longitude));
        screen.push(SCREEN_ACC_Y, format_args!("Acc: {:.2}m", location.accuracy));
        screen
    }

    pub fn lines(&self) -> &[ScreenLine] {
        &self.lines
    }

    // Overlong text is cut at the line capacity.
    fn push(&mut self, y: i32, args: core::fmt::Arguments<'_>) {
        let mut text = String::new();
        let _ = text.write_fmt(args);
        let _ = self.lines.push(ScreenLine { y, text });
    }
}

#[cfg(feature = "graphics")]
pub use self::render::{draw_screen, MonoFrameBuffer, OledFrameBuffer};

#[cfg(feature = "graphics")]
mod render {
    use core::convert::Infallible;

    use embedded_graphics::{
        pixelcolor::BinaryColor,
        prelude::{DrawTarget, OriginDimensions, Pixel, Point, Size},
    };
    use u8g2_fonts::types::{FontColor, VerticalPosition};

    use super::ScreenText;
    use crate::config::{SCREEN_FONT, SCREEN_PAGES, SCREEN_WIDTH};

    /// Clears `target` and draws every line left-aligned at its row.
    ///
    /// Glyphs missing from the font are skipped; only target errors are
    /// returned.
    pub fn draw_screen<T>(target: &mut T, screen: &ScreenText) -> Result<(), T::Error>
    where
        T: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        for line in screen.lines() {
            let rendered = SCREEN_FONT.render(
                line.text.as_str(),
                Point::new(0, line.y),
                VerticalPosition::Top,
                FontColor::Transparent(BinaryColor::On),
                target,
            );
            if let Err(u8g2_fonts::Error::DisplayError(err)) = rendered {
                return Err(err);
            }
        }
        Ok(())
    }

    /// 1-bit framebuffer in page layout: each byte covers 8 vertical pixels
    /// of one column, least significant bit on top.
    pub struct MonoFrameBuffer<const W: usize, const PAGES: usize> {
        pages: [[u8; W]; PAGES],
    }

    pub type OledFrameBuffer = MonoFrameBuffer<SCREEN_WIDTH, SCREEN_PAGES>;

    impl<const W: usize, const PAGES: usize> MonoFrameBuffer<W, PAGES> {
        pub const HEIGHT: usize = PAGES * 8;

        pub const fn new() -> Self {
            Self {
                pages: [[0; W]; PAGES],
            }
        }

        pub fn pages(&self) -> &[[u8; W]; PAGES] {
            &self.pages
        }

        pub fn pixel(&self, x: usize, y: usize) -> bool {
            if x >= W || y >= Self::HEIGHT {
                return false;
            }
            self.pages[y / 8][x] & (1 << (y % 8)) != 0
        }

        pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
            if x >= W || y >= Self::HEIGHT {
                return;
            }
            let cell = &mut self.pages[y / 8][x];
            let mask = 1 << (y % 8);
            if on {
                *cell |= mask;
            } else {
                *cell &= !mask;
            }
        }
    }

    impl<const W: usize, const PAGES: usize> Default for MonoFrameBuffer<W, PAGES> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<const W: usize, const PAGES: usize> OriginDimensions for MonoFrameBuffer<W, PAGES> {
        fn size(&self) -> Size {
            Size::new(W as u32, Self::HEIGHT as u32)
        }
    }

    impl<const W: usize, const PAGES: usize> DrawTarget for MonoFrameBuffer<W, PAGES> {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<It>(&mut self, pixels: It) -> Result<(), Self::Error>
        where
            It: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if point.x < 0 || point.y < 0 {
                    continue;
                }
                self.set_pixel(point.x as usize, point.y as usize, color == BinaryColor::On);
            }
            Ok(())
        }

        fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
            let fill = if color == BinaryColor::On { 0xFF } else { 0x00 };
            for page in self.pages.iter_mut() {
                page.fill(fill);
            }
            Ok(())
        }
    }
}
