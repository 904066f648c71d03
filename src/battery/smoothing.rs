use num::Float;

/// Tuning of the scalar Kalman filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanParams {
    /// How much a single burst average is expected to be off, in volts
    pub measurement_noise: f32,
    /// Uncertainty of the initial estimate, in volts
    pub estimate_error: f32,
    /// How fast the true voltage is expected to move between updates
    pub process_noise: f32,
    /// Estimate before the first measurement
    pub initial_volts: f32,
}

impl KalmanParams {
    pub const fn new(measurement_noise: f32, estimate_error: f32, process_noise: f32) -> Self {
        KalmanParams {
            measurement_noise,
            estimate_error,
            process_noise,
            initial_volts: 3.7,
        }
    }
}

/// One dimensional Kalman filter smoothing the battery voltage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanFilter {
    measurement_noise: f32,
    process_noise: f32,
    estimate_error: f32,
    estimate: f32,
}

impl KalmanFilter {
    pub fn new(params: KalmanParams) -> Self {
        KalmanFilter {
            measurement_noise: params.measurement_noise,
            process_noise: params.process_noise,
            estimate_error: params.estimate_error,
            estimate: params.initial_volts,
        }
    }

    pub fn estimate_error(&self) -> f32 {
        self.estimate_error
    }

    /// Fold a new measurement into the estimate and return the corrected value
    pub fn update(&mut self, measurement: f32) -> f32 {
        let gain = self.estimate_error / (self.estimate_error + self.measurement_noise);
        let corrected = self.estimate + gain * (measurement - self.estimate);

        self.estimate_error =
            (1.0 - gain) * self.estimate_error + Float::abs(self.estimate - corrected) * self.process_noise;
        self.estimate = corrected;

        corrected
    }
}

/// Optional smoothing stage between the burst average and the percentage curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    None,
    Kalman(KalmanFilter),
}

impl Smoothing {
    pub fn apply(&mut self, volts: f32) -> f32 {
        match self {
            Smoothing::None => volts,
            Smoothing::Kalman(filter) => filter.update(volts),
        }
    }
}

impl From<Option<KalmanParams>> for Smoothing {
    fn from(params: Option<KalmanParams>) -> Self {
        match params {
            Some(params) => Smoothing::Kalman(KalmanFilter::new(params)),
            None => Smoothing::None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn filter() -> KalmanFilter {
        KalmanFilter::new(KalmanParams::new(0.1, 0.1, 0.01))
    }

    #[test]
    fn first_update_moves_halfway_with_equal_errors() {
        let mut filter = filter();
        let out = filter.update(4.1);
        assert!((out - 3.9).abs() < 1e-5, "{}", out);
    }

    #[test]
    fn converges_on_constant_input() {
        let mut filter = filter();
        let mut out = 0.0;
        for _ in 0..200 {
            out = filter.update(4.0);
        }
        assert!((out - 4.0).abs() < 0.01, "{}", out);
    }

    #[test]
    fn uncertainty_shrinks_while_input_is_steady() {
        let mut filter = filter();
        filter.update(3.7);
        let first = filter.estimate_error();
        filter.update(3.7);
        assert!(filter.estimate_error() < first);
    }

    #[test]
    fn damps_noise() {
        let mut filter = filter();
        for _ in 0..50 {
            filter.update(3.8);
        }
        let out = filter.update(4.3);
        assert!(out < 3.9, "spike passed through: {}", out);
    }

    #[test]
    fn no_smoothing_passes_through() {
        let mut smoothing = Smoothing::from(None);
        assert_eq!(smoothing.apply(3.456), 3.456);
    }

    #[test]
    fn kalman_smoothing_keeps_state() {
        let mut smoothing = Smoothing::from(Some(KalmanParams::new(0.1, 0.1, 0.01)));
        let first = smoothing.apply(4.1);
        let second = smoothing.apply(4.1);
        assert!(second > first);
    }
}
