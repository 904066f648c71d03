#![cfg_attr(not(test), no_std)]

//! Bottom timer for a recreational dive instrument
//!
//! Reads a pressure sensor, tracks time since the diver first went below
//! [`dive_timer::START_DEPTH_M`], estimates battery charge and renders it all
//! on a small monochrome display. Everything hardware specific sits behind
//! the traits in [`bsp`] so the loop in [`control`] runs on the host in tests.

pub mod battery;
pub mod bsp;
pub mod config;
pub mod control;
pub mod depth;
pub mod dive_timer;
pub mod error;
pub mod ms5837;
pub mod power;
pub mod render;

#[cfg(not(any(feature = "log", feature = "defmt")))]
compile_error!("enable the `log` or the `defmt` feature");

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, info, warn};
#[cfg(all(feature = "log", not(feature = "defmt")))]
pub(crate) use log::{debug, info, warn};

/// Millisecond resolution monotonic time point
pub type Instant = fugit::TimerInstantU64<1_000>;
/// Millisecond resolution span of time
pub type Duration = fugit::MillisDurationU64;

pub use config::Profile;
pub use control::{LoopState, Peripherals, Step};
pub use error::Error;
