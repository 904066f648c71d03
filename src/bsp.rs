//! Hardware the control loop talks to
//!
//! Board support implements these for the real peripherals, tests implement
//! them with plain structs.

use crate::{Duration, Instant};

/// Pressure sensor that reports depth in meters
pub trait DepthSensor {
    type Error;

    /// Trigger a conversion and latch the result
    fn read(&mut self) -> Result<(), Self::Error>;

    /// Depth of the last successful [`read`](DepthSensor::read), may be
    /// slightly negative at the surface
    fn depth(&self) -> f32;
}

/// ADC channel wired to the battery through a divider
pub trait BatteryAdc {
    fn read_raw(&mut self) -> u16;

    /// Connect the divider to the ADC, for boards that switch it off between
    /// measurements
    fn enable_measurement(&mut self) {}

    fn disable_measurement(&mut self) {}
}

/// Text and rectangle drawing on the monochrome display
///
/// Coordinates are pixels from the top left corner, `scale` picks the text
/// size in multiples of the 6x8 base cell.
pub trait Screen {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;
    fn set_scale(&mut self, scale: u8);
    fn set_cursor(&mut self, x: i32, y: i32);
    fn draw_text(&mut self, text: &str) -> Result<(), Self::Error>;
    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<(), Self::Error>;
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<(), Self::Error>;
    /// Push the frame to the panel
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Suspends the whole device
pub trait Sleeper {
    /// Sleep with the core clock running, waking after `duration`
    fn sleep_light(&mut self, duration: Duration);

    /// Deepest available sleep, `None` means no wake source at all
    fn sleep_deep(&mut self, duration: Option<Duration>);
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now(&self) -> Instant;
}
