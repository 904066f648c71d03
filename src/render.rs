//! Screen layouts for the 128x64 panel
//!
//! Layout follows a 6x8 base character cell multiplied by the text scale.

use core::fmt::Write;

use arraystring::{
    typenum::{U32, U8},
    ArrayString,
};
use embedded_graphics::{
    mono_font::{ascii::FONT_5X7, MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

use crate::battery::{fill_width, BatteryEstimate};
use crate::bsp::Screen;
use crate::depth::{MAX_DEPTH_M, MIN_DEPTH_M};
use crate::dive_timer::ElapsedTime;

pub const WIDTH: i32 = 128;
/// Base character cell advance at scale 1
pub const CHAR_WIDTH: i32 = 6;

const DEPTH_SCALE: u8 = 5;
const TIME_SCALE: u8 = 2;
const VOLTAGE_SCALE: u8 = 1;
const BANNER_SCALE: u8 = 2;

const GLYPH_X: i32 = 106;
const GLYPH_Y: i32 = 56;

/// Depth as a four character field with one decimal, `" 5.0"` or `"42.7"`
pub fn format_depth(depth: f32) -> ArrayString<U8> {
    let mut buf = ArrayString::new();
    let depth = if depth.is_nan() { MIN_DEPTH_M } else { depth.clamp(MIN_DEPTH_M, MAX_DEPTH_M) };
    // Clamped depth always fits
    let _ = write!(buf, "{:4.1}", depth);
    buf
}

/// Elapsed time as minutes padded to three columns and two digit seconds
pub fn format_time(elapsed: ElapsedTime) -> ArrayString<U32> {
    let mut buf = ArrayString::new();
    let _ = write!(buf, "{:3}:{:0>2}", elapsed.minutes, elapsed.seconds);
    buf
}

/// Battery voltage with one decimal and a unit, `"3.9V"`
pub fn format_voltage(volts: f32) -> ArrayString<U8> {
    let mut buf = ArrayString::new();
    let volts = if volts.is_nan() { 0.0 } else { volts.clamp(0.0, 9.9) };
    let _ = write!(buf, "{:.1}V", volts);
    buf
}

/// Left edge that puts `text` against the right border at `scale`
pub fn right_aligned_x(text: &str, scale: u8) -> i32 {
    WIDTH - CHAR_WIDTH * i32::from(scale) * text.len() as i32
}

pub fn centered_x(text: &str, scale: u8) -> i32 {
    (WIDTH - CHAR_WIDTH * i32::from(scale) * text.len() as i32) / 2
}

fn draw_at<S: Screen>(screen: &mut S, scale: u8, x: i32, y: i32, text: &str) -> Result<(), S::Error> {
    screen.set_scale(scale);
    screen.set_cursor(x, y);
    screen.draw_text(text)
}

/// Outline, terminal nub and a fill bar proportional to the percentage
pub fn battery_glyph<S: Screen>(screen: &mut S, percentage: u8) -> Result<(), S::Error> {
    screen.draw_rect(GLYPH_X, GLYPH_Y, 20, 8)?;
    screen.fill_rect(GLYPH_X + 20, GLYPH_Y + 3, 2, 2)?;
    let fill = fill_width(percentage);
    if fill > 0 {
        screen.fill_rect(GLYPH_X + 2, GLYPH_Y + 2, fill, 4)?;
    }
    Ok(())
}

/// Main screen: depth on top, dive time bottom left, battery bottom right
pub fn dashboard<S: Screen>(
    screen: &mut S,
    depth: f32,
    elapsed: ElapsedTime,
    battery: &BatteryEstimate,
) -> Result<(), S::Error> {
    screen.clear()?;

    draw_at(screen, DEPTH_SCALE, 6, 0, &format_depth(depth))?;
    draw_at(screen, TIME_SCALE, 0, 48, &format_time(elapsed))?;

    let voltage = format_voltage(battery.smoothed_voltage);
    draw_at(screen, VOLTAGE_SCALE, right_aligned_x(&voltage, VOLTAGE_SCALE), 47, &voltage)?;

    battery_glyph(screen, battery.percentage)?;

    screen.present()
}

pub fn splash<S: Screen>(screen: &mut S) -> Result<(), S::Error> {
    banner(screen, "Bottom", "Timer")?;
    screen.present()
}

/// Shown once before the device stops for good on a flat battery
pub fn low_battery<S: Screen>(screen: &mut S, battery: &BatteryEstimate) -> Result<(), S::Error> {
    banner(screen, "LOW", "BATTERY")?;

    let voltage = format_voltage(battery.smoothed_voltage);
    draw_at(screen, VOLTAGE_SCALE, right_aligned_x(&voltage, VOLTAGE_SCALE), 47, &voltage)?;
    battery_glyph(screen, battery.percentage)?;

    screen.present()
}

fn banner<S: Screen>(screen: &mut S, top: &str, bottom: &str) -> Result<(), S::Error> {
    screen.clear()?;
    draw_at(screen, BANNER_SCALE, centered_x(top, BANNER_SCALE), 12, top)?;
    draw_at(screen, BANNER_SCALE, centered_x(bottom, BANNER_SCALE), 36, bottom)
}

/// Displays that buffer frames and need an explicit flush
pub trait Present: DrawTarget<Color = BinaryColor> {
    fn present(&mut self) -> Result<(), Self::Error>;
}

#[cfg(feature = "firmware")]
impl<DI, SIZE> Present for ssd1306::Ssd1306<DI, SIZE, ssd1306::mode::BufferedGraphicsMode<SIZE>>
where
    DI: ssd1306::prelude::WriteOnlyDataCommand,
    SIZE: ssd1306::size::DisplaySize,
{
    fn present(&mut self) -> Result<(), Self::Error> {
        self.flush()
    }
}

/// 5x7 glyphs advancing by the 6 pixel base cell
const CELL_FONT: MonoFont<'static> = MonoFont {
    character_spacing: 1,
    ..FONT_5X7
};

/// Blows every pixel up into a `scale` x `scale` block, keeping `origin` fixed
struct Scaled<'a, D> {
    target: &'a mut D,
    origin: Point,
    scale: u32,
}

impl<D> Scaled<'_, D> {
    fn to_target(&self, point: Point) -> Point {
        self.origin + (point - self.origin) * self.scale as i32
    }
}

impl<D> OriginDimensions for Scaled<'_, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    fn size(&self) -> Size {
        self.target.bounding_box().size
    }
}

impl<D> DrawTarget for Scaled<'_, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    type Color = BinaryColor;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let block = Rectangle::new(self.to_target(point), Size::new_equal(self.scale));
            self.target.fill_solid(&block, color)?;
        }
        Ok(())
    }
}

/// [`Screen`] on top of an `embedded-graphics` draw target
///
/// Text uses a 5x7 font in the 6x8 base cell, scaled up pixel by pixel so the
/// layouts keep their cell geometry at every scale.
pub struct GraphicsScreen<D> {
    target: D,
    cursor: Point,
    scale: u8,
}

impl<D> GraphicsScreen<D>
where
    D: Present,
{
    pub fn new(target: D) -> Self {
        GraphicsScreen {
            target,
            cursor: Point::zero(),
            scale: 1,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    fn rectangle(x: i32, y: i32, width: u32, height: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(width, height))
    }
}

impl<D> Screen for GraphicsScreen<D>
where
    D: Present,
{
    type Error = D::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cursor = Point::zero();
        self.target.clear(BinaryColor::Off)
    }

    fn set_scale(&mut self, scale: u8) {
        self.scale = scale;
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn draw_text(&mut self, text: &str) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(&CELL_FONT, BinaryColor::On);
        let mut scaled = Scaled {
            target: &mut self.target,
            origin: self.cursor,
            scale: u32::from(self.scale.max(1)),
        };
        let next = Text::with_baseline(text, self.cursor, style, Baseline::Top).draw(&mut scaled)?;
        self.cursor = scaled.to_target(next);
        Ok(())
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<(), Self::Error> {
        Self::rectangle(x, y, width, height)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.target)
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<(), Self::Error> {
        Self::rectangle(x, y, width, height)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.target)
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.target.present()
    }
}
