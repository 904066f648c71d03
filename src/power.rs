use crate::battery::BatteryEstimate;
use crate::bsp::Sleeper;
use crate::{info, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    ActiveSample,
    SleepBetweenSamples,
    LowBatteryShutdown,
}

/// How the device suspends between samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepDepth {
    /// Wait for interrupt with the clocks running
    Light,
    /// Deep sleep with a timer wake
    Deep,
}

/// What happens once the battery runs low
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Keep sampling and show the low percentage
    Disabled,
    /// Show the low battery screen and sleep until the device is power cycled
    Absorbing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LowBatteryTrigger {
    /// Smoothed voltage strictly below this many volts
    Voltage(f32),
    /// Percentage strictly below this value
    Percentage(u8),
}

impl LowBatteryTrigger {
    pub fn fires(&self, battery: &BatteryEstimate) -> bool {
        match *self {
            LowBatteryTrigger::Voltage(volts) => battery.smoothed_voltage < volts,
            LowBatteryTrigger::Percentage(percentage) => battery.percentage < percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepRequest {
    /// The iteration overran its cycle, start the next one right away
    None,
    Light(Duration),
    Deep(Duration),
    DeepForever,
}

impl SleepRequest {
    pub fn dispatch<S: Sleeper>(&self, sleeper: &mut S) {
        match *self {
            SleepRequest::None => {}
            SleepRequest::Light(duration) => sleeper.sleep_light(duration),
            SleepRequest::Deep(duration) => sleeper.sleep_deep(Some(duration)),
            SleepRequest::DeepForever => sleeper.sleep_deep(None),
        }
    }

    pub fn duration(&self) -> Duration {
        match *self {
            SleepRequest::Light(duration) | SleepRequest::Deep(duration) => duration,
            SleepRequest::None | SleepRequest::DeepForever => Duration::millis(0),
        }
    }
}

/// Decides how long and how deep to sleep after each sample, and when to
/// give up on a flat battery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerController {
    mode: PowerMode,
    cycle: Duration,
    depth: SleepDepth,
    policy: ShutdownPolicy,
    trigger: LowBatteryTrigger,
}

impl PowerController {
    pub fn new(cycle: Duration, depth: SleepDepth, policy: ShutdownPolicy, trigger: LowBatteryTrigger) -> Self {
        PowerController {
            mode: PowerMode::ActiveSample,
            cycle,
            depth,
            policy,
            trigger,
        }
    }

    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    pub fn is_shut_down(&self) -> bool {
        self.mode == PowerMode::LowBatteryShutdown
    }

    /// Woken up for the next sample
    pub fn begin_sample(&mut self) {
        if self.mode == PowerMode::SleepBetweenSamples {
            self.mode = PowerMode::ActiveSample;
        }
    }

    /// Returns true when this estimate moves the device into shutdown
    pub fn observe_battery(&mut self, battery: &BatteryEstimate) -> bool {
        if self.policy == ShutdownPolicy::Disabled || self.is_shut_down() {
            return false;
        }

        if self.trigger.fires(battery) {
            info!("Low battery at {} V, shutting down", battery.smoothed_voltage);
            self.mode = PowerMode::LowBatteryShutdown;
            return true;
        }

        false
    }

    /// Sleep for whatever is left of the cycle after `active` was spent
    /// sampling and drawing
    pub fn plan_sleep(&mut self, active: Duration) -> SleepRequest {
        if self.is_shut_down() {
            return SleepRequest::DeepForever;
        }

        self.mode = PowerMode::SleepBetweenSamples;

        let remaining = self.cycle.checked_sub(active).unwrap_or(Duration::millis(0));
        if remaining.ticks() == 0 {
            return SleepRequest::None;
        }

        match self.depth {
            SleepDepth::Light => SleepRequest::Light(remaining),
            SleepDepth::Deep => SleepRequest::Deep(remaining),
        }
    }
}
