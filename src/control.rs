use crate::battery::{BatteryEstimate, BatteryEstimator};
use crate::bsp::{BatteryAdc, Clock, DepthSensor, Screen, Sleeper};
use crate::config::{Profile, SPLASH_DURATION};
use crate::depth;
use crate::dive_timer::{DiveTimer, ElapsedTime};
use crate::error::Error;
use crate::power::{PowerController, PowerMode, SleepRequest};
use crate::render;
use crate::{debug, warn, Duration};

/// Everything the loop drives, borrowed for one iteration
pub struct Peripherals<'a, P, A, S, Z, C> {
    pub sensor: &'a mut P,
    pub adc: &'a mut A,
    pub screen: &'a mut S,
    pub sleeper: &'a mut Z,
    pub clock: &'a C,
}

/// Values shown by the last iteration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub depth: f32,
    pub elapsed: ElapsedTime,
    pub battery: BatteryEstimate,
}

/// Outcome of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sampled, rendered and slept for the given time
    Slept(Duration),
    /// Low battery shutdown, nothing was sampled
    Halted,
}

/// State that lives across iterations: the dive clock latch, the battery
/// filter and the power mode
///
/// Built once before the first iteration; there is no way to reinitialize it
/// short of constructing a new one at power on.
pub struct LoopState {
    sea_level_offset: f32,
    timer: DiveTimer,
    battery: BatteryEstimator,
    power: PowerController,
    last: Reading,
}

impl LoopState {
    pub fn new(profile: &Profile) -> Result<Self, Error> {
        profile.validate()?;

        Ok(LoopState {
            sea_level_offset: profile.sea_level_offset,
            timer: DiveTimer::new(),
            battery: profile.battery_estimator()?,
            power: profile.power_controller(),
            last: Reading::default(),
        })
    }

    pub fn timer(&self) -> &DiveTimer {
        &self.timer
    }

    pub fn mode(&self) -> PowerMode {
        self.power.mode()
    }

    pub fn last_reading(&self) -> &Reading {
        &self.last
    }

    /// Show the splash screen before the first iteration
    pub fn start<P, A, S, Z, C>(&mut self, hw: &mut Peripherals<'_, P, A, S, Z, C>) -> Result<(), S::Error>
    where
        S: Screen,
        Z: Sleeper,
    {
        render::splash(hw.screen)?;
        hw.sleeper.sleep_light(SPLASH_DURATION);
        Ok(())
    }

    /// Acquire, compute, render and sleep once
    pub fn iterate<P, A, S, Z, C>(&mut self, hw: &mut Peripherals<'_, P, A, S, Z, C>) -> Result<Step, S::Error>
    where
        P: DepthSensor,
        A: BatteryAdc,
        S: Screen,
        Z: Sleeper,
        C: Clock,
    {
        if self.power.is_shut_down() {
            SleepRequest::DeepForever.dispatch(hw.sleeper);
            return Ok(Step::Halted);
        }

        let started = hw.clock.now();
        self.power.begin_sample();

        let depth = match hw.sensor.read() {
            Ok(()) => depth::normalize(hw.sensor.depth(), self.sea_level_offset),
            Err(_) => {
                warn!("Depth sensor read failed, holding {} m", self.last.depth);
                self.last.depth
            }
        };

        self.timer.update(depth, started);
        let elapsed = self.timer.elapsed(started);

        let battery = self.battery.estimate(hw.adc);
        self.last = Reading {
            depth,
            elapsed,
            battery,
        };

        if self.power.observe_battery(&battery) {
            render::low_battery(hw.screen, &battery)?;
            SleepRequest::DeepForever.dispatch(hw.sleeper);
            return Ok(Step::Halted);
        }

        render::dashboard(hw.screen, depth, elapsed, &battery)?;

        let active = hw
            .clock
            .now()
            .checked_duration_since(started)
            .unwrap_or(Duration::millis(0));
        let request = self.power.plan_sleep(active);
        debug!("Active {} ms, sleeping {} ms", active.to_millis(), request.duration().to_millis());
        request.dispatch(hw.sleeper);

        Ok(Step::Slept(request.duration()))
    }
}
