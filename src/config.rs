//! Deployment profiles
//!
//! The boards differ in ADC, sleep hardware and battery calibration. Each one
//! is described by a [`Profile`] constant, there is no runtime configuration.

use crate::battery::{
    AdcScale, BatteryEstimator, BurstSampler, CalibrationTable, Curve, KalmanParams, SigmoidCurve, Smoothing,
    LIPO_TABLE,
};
use crate::error::Error;
use crate::power::{LowBatteryTrigger, PowerController, ShutdownPolicy, SleepDepth};
use crate::Duration;

/// EN13319 reference density of sea water, kg/m3
pub const FLUID_DENSITY: f32 = 1020.0;

/// How long the splash screen stays up at power on
pub const SPLASH_DURATION: Duration = Duration::millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveKind {
    Table(&'static [(f32, u8)]),
    Sigmoid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    /// Subtracted from every sensor depth, meters
    pub sea_level_offset: f32,
    /// ADC readings averaged per battery estimate
    pub burst: u16,
    /// Throw away the first reading after switching the divider in
    pub discard_first: bool,
    pub adc_scale: AdcScale,
    pub smoothing: Option<KalmanParams>,
    pub curve: CurveKind,
    /// Target length of one acquire, render, sleep iteration
    pub cycle: Duration,
    pub sleep_depth: SleepDepth,
    pub shutdown: ShutdownPolicy,
    pub low_battery: LowBatteryTrigger,
}

impl Profile {
    /// 12-bit ADC read directly, closed form charge curve, light sleep and no
    /// low battery shutdown
    pub const fn basic() -> Self {
        Profile {
            sea_level_offset: 0.0,
            burst: 16,
            discard_first: false,
            adc_scale: AdcScale::Counts {
                full_scale: 4095,
                reference_volts: 3.3,
                divider: 2.0,
            },
            smoothing: None,
            curve: CurveKind::Sigmoid,
            cycle: Duration::millis(500),
            sleep_depth: SleepDepth::Light,
            shutdown: ShutdownPolicy::Disabled,
            low_battery: LowBatteryTrigger::Voltage(3.3),
        }
    }

    /// Calibrated millivolt ADC behind a switched divider, LiPo table and a
    /// sensor zero point correction
    pub const fn calibrated() -> Self {
        Profile {
            sea_level_offset: 0.3,
            burst: 32,
            discard_first: true,
            adc_scale: AdcScale::Millivolts { divider: 2.0 },
            smoothing: None,
            curve: CurveKind::Table(LIPO_TABLE),
            cycle: Duration::millis(1000),
            sleep_depth: SleepDepth::Light,
            shutdown: ShutdownPolicy::Disabled,
            low_battery: LowBatteryTrigger::Voltage(3.3),
        }
    }

    /// Kalman smoothed LiPo table, timer woken deep sleep and a terminal low
    /// battery shutdown below 3.3 V
    pub const fn low_power() -> Self {
        Profile {
            sea_level_offset: 0.0,
            burst: 16,
            discard_first: false,
            adc_scale: AdcScale::Millivolts { divider: 2.0 },
            smoothing: Some(KalmanParams::new(0.05, 0.1, 0.01)),
            curve: CurveKind::Table(LIPO_TABLE),
            cycle: Duration::millis(1000),
            sleep_depth: SleepDepth::Deep,
            shutdown: ShutdownPolicy::Absorbing,
            low_battery: LowBatteryTrigger::Voltage(3.3),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.burst == 0 {
            return Err(Error::EmptyBurst);
        }

        if self.cycle.ticks() == 0 {
            return Err(Error::ZeroCycle);
        }

        if !self.sea_level_offset.is_finite() {
            return Err(Error::InvalidParameter("sea level offset"));
        }

        if let AdcScale::Counts { full_scale: 0, .. } = self.adc_scale {
            return Err(Error::InvalidParameter("ADC full scale"));
        }

        if let Some(params) = self.smoothing {
            if !(params.measurement_noise > 0.0) {
                return Err(Error::InvalidParameter("measurement noise"));
            }
            // Zero initial uncertainty pins the filter to its initial voltage
            if !(params.estimate_error > 0.0) {
                return Err(Error::InvalidParameter("estimate error"));
            }
            if !(params.process_noise >= 0.0) {
                return Err(Error::InvalidParameter("process noise"));
            }
        }

        self.charge_curve().map(|_| ())
    }

    pub fn charge_curve(&self) -> Result<Curve, Error> {
        match self.curve {
            CurveKind::Table(points) => CalibrationTable::new(points).map(Curve::Table),
            CurveKind::Sigmoid => Ok(Curve::Sigmoid(SigmoidCurve)),
        }
    }

    pub fn battery_estimator(&self) -> Result<BatteryEstimator, Error> {
        let sampler = BurstSampler::new(self.burst, self.discard_first, self.adc_scale);
        Ok(BatteryEstimator::new(sampler, Smoothing::from(self.smoothing), self.charge_curve()?))
    }

    pub fn power_controller(&self) -> PowerController {
        PowerController::new(self.cycle, self.sleep_depth, self.shutdown, self.low_battery)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::basic()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        for profile in [Profile::basic(), Profile::calibrated(), Profile::low_power()] {
            assert_eq!(profile.validate(), Ok(()));
        }
    }

    #[test]
    fn rejects_empty_burst() {
        let profile = Profile {
            burst: 0,
            ..Profile::basic()
        };
        assert_eq!(profile.validate(), Err(Error::EmptyBurst));
    }

    #[test]
    fn rejects_zero_cycle() {
        let profile = Profile {
            cycle: Duration::millis(0),
            ..Profile::basic()
        };
        assert_eq!(profile.validate(), Err(Error::ZeroCycle));
    }

    #[test]
    fn rejects_zero_measurement_noise() {
        let profile = Profile {
            smoothing: Some(KalmanParams::new(0.0, 0.0, 0.01)),
            ..Profile::low_power()
        };
        assert_eq!(profile.validate(), Err(Error::InvalidParameter("measurement noise")));
    }

    #[test]
    fn rejects_zero_estimate_error() {
        let profile = Profile {
            smoothing: Some(KalmanParams::new(0.05, 0.0, 0.01)),
            ..Profile::low_power()
        };
        assert_eq!(profile.validate(), Err(Error::InvalidParameter("estimate error")));

        let profile = Profile {
            smoothing: Some(KalmanParams::new(0.05, f32::NAN, 0.01)),
            ..Profile::low_power()
        };
        assert_eq!(profile.validate(), Err(Error::InvalidParameter("estimate error")));
    }

    #[test]
    fn rejects_bad_table() {
        static BAD: [(f32, u8); 2] = [(4.2, 100), (3.3, 0)];
        let profile = Profile {
            curve: CurveKind::Table(&BAD),
            ..Profile::calibrated()
        };
        assert_eq!(profile.validate(), Err(Error::TableNotIncreasing { index: 1 }));
    }

    #[test]
    fn low_power_profile_shuts_down() {
        let profile = Profile::low_power();
        assert_eq!(profile.shutdown, ShutdownPolicy::Absorbing);
        assert_eq!(profile.sleep_depth, SleepDepth::Deep);
        assert!(matches!(
            profile.battery_estimator().unwrap().smoothing(),
            Smoothing::Kalman(_)
        ));
    }
}
