//! Battery charge estimation
//!
//! A burst of raw ADC readings is averaged into a voltage, optionally run
//! through a Kalman filter and mapped onto a percentage by a charge curve.

pub mod curve;
pub mod sampling;
pub mod smoothing;

pub use curve::{fill_width, CalibrationTable, ChargeCurve, Curve, SigmoidCurve, LIPO_TABLE};
pub use sampling::{AdcScale, BurstSampler};
pub use smoothing::{KalmanFilter, KalmanParams, Smoothing};

use crate::bsp::BatteryAdc;
use crate::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryEstimate {
    /// Mean of this iteration's burst
    pub raw_voltage: f32,
    /// Filter output, same as `raw_voltage` without smoothing
    pub smoothed_voltage: f32,
    /// 0..=100
    pub percentage: u8,
}

pub struct BatteryEstimator {
    sampler: BurstSampler,
    smoothing: Smoothing,
    curve: Curve,
}

impl BatteryEstimator {
    pub fn new(sampler: BurstSampler, smoothing: Smoothing, curve: Curve) -> Self {
        BatteryEstimator {
            sampler,
            smoothing,
            curve,
        }
    }

    pub fn estimate<A: BatteryAdc>(&mut self, adc: &mut A) -> BatteryEstimate {
        let raw_voltage = self.sampler.sample(adc);
        self.estimate_from(raw_voltage)
    }

    /// Run an already sampled voltage through smoothing and the charge curve
    pub fn estimate_from(&mut self, raw_voltage: f32) -> BatteryEstimate {
        let smoothed_voltage = self.smoothing.apply(raw_voltage);
        let percentage = self.curve.percentage(smoothed_voltage).min(100);

        debug!("Battery {} V raw, {} V smoothed, {}%", raw_voltage, smoothed_voltage, percentage);

        BatteryEstimate {
            raw_voltage,
            smoothed_voltage,
            percentage,
        }
    }

    pub fn smoothing(&self) -> &Smoothing {
        &self.smoothing
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct FixedAdc(u16);

    impl BatteryAdc for FixedAdc {
        fn read_raw(&mut self) -> u16 {
            self.0
        }
    }

    fn table_estimator(smoothing: Smoothing) -> BatteryEstimator {
        BatteryEstimator::new(
            BurstSampler::new(16, false, AdcScale::Millivolts { divider: 2.0 }),
            smoothing,
            Curve::Table(CalibrationTable::new(LIPO_TABLE).unwrap()),
        )
    }

    #[test]
    fn unsmoothed_voltages_map_to_table() {
        let mut estimator = table_estimator(Smoothing::None);
        let res: Vec<u8> = [4.20, 3.95, 3.30]
            .iter()
            .map(|v| estimator.estimate_from(*v).percentage)
            .collect();
        assert_eq!(res, [100, 75, 0]);
    }

    #[test]
    fn estimate_samples_adc() {
        let mut estimator = table_estimator(Smoothing::None);
        let estimate = estimator.estimate(&mut FixedAdc(1975));

        assert!((estimate.raw_voltage - 3.95).abs() < 1e-5);
        assert_eq!(estimate.raw_voltage, estimate.smoothed_voltage);
        assert_eq!(estimate.percentage, 75);
    }

    #[test]
    fn smoothed_estimate_lags_raw() {
        let mut estimator = table_estimator(Smoothing::from(Some(KalmanParams::new(0.1, 0.1, 0.01))));
        let estimate = estimator.estimate(&mut FixedAdc(2100));

        assert!((estimate.raw_voltage - 4.2).abs() < 1e-5);
        assert!(estimate.smoothed_voltage < estimate.raw_voltage);
        assert!(estimate.smoothed_voltage > 3.7);
    }

    #[test]
    fn sigmoid_estimator() {
        let mut estimator = BatteryEstimator::new(
            BurstSampler::new(
                1,
                false,
                AdcScale::Counts {
                    full_scale: 4095,
                    reference_volts: 3.3,
                    divider: 2.0,
                },
            ),
            Smoothing::None,
            Curve::Sigmoid(SigmoidCurve),
        );
        assert_eq!(estimator.estimate(&mut FixedAdc(4095)).percentage, 100);
        assert_eq!(estimator.estimate(&mut FixedAdc(1800)).percentage, 0);
    }
}
