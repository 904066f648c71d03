use num::Float;

use crate::error::Error;

/// Maps a battery voltage onto a remaining charge percentage
pub trait ChargeCurve {
    fn percentage(&self, volts: f32) -> u8;
}

/// Single cell LiPo discharge curve, protective cutoff to full charge
pub const LIPO_TABLE: &[(f32, u8)] = &[
    (3.30, 0),
    (3.60, 10),
    (3.70, 20),
    (3.75, 30),
    (3.79, 40),
    (3.83, 50),
    (3.87, 60),
    (3.92, 70),
    (3.95, 75),
    (3.98, 80),
    (4.02, 85),
    (4.08, 90),
    (4.11, 95),
    (4.20, 100),
];

/// Calibration table of `(volts, percent)` points
///
/// Lookups snap to the nearest table point instead of interpolating, a coarse
/// table would otherwise make the last digit flicker between iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTable {
    points: &'static [(f32, u8)],
}

impl CalibrationTable {
    /// Voltages must be strictly increasing, percentages non-decreasing and at
    /// most 100.
    pub fn new(points: &'static [(f32, u8)]) -> Result<Self, Error> {
        if points.is_empty() {
            return Err(Error::EmptyTable);
        }

        for (index, &(_, percentage)) in points.iter().enumerate() {
            if percentage > 100 {
                return Err(Error::PercentageOutOfRange { index, percentage });
            }
        }

        for (index, pair) in points.windows(2).enumerate() {
            let (low, high) = (pair[0], pair[1]);
            // `!(a < b)` so that NaN voltages are rejected too
            if !(low.0 < high.0) || low.1 > high.1 {
                return Err(Error::TableNotIncreasing { index: index + 1 });
            }
        }

        Ok(CalibrationTable { points })
    }
}

impl ChargeCurve for CalibrationTable {
    fn percentage(&self, volts: f32) -> u8 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0,
        };

        if volts.is_nan() || volts <= first.0 {
            return first.1;
        }
        if volts >= last.0 {
            return last.1.min(100);
        }

        // Index of the first point above `volts`, never 0 or len here
        let upper = self.points.partition_point(|&(v, _)| v <= volts);
        let (low_v, low_pct) = self.points[upper - 1];
        let (high_v, high_pct) = self.points[upper];

        if volts - low_v < high_v - volts {
            low_pct
        } else {
            high_pct
        }
    }
}

/// Closed form approximation of a LiPo discharge curve
///
/// `round(123 - 123 / (1 + (V / 3.7)^80)^0.165)`, clamped to 0..=100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SigmoidCurve;

const SIGMOID_SCALE: f32 = 123.0;
const SIGMOID_MIDPOINT_V: f32 = 3.7;
const SIGMOID_STEEPNESS: f32 = 80.0;
const SIGMOID_EXPONENT: f32 = 0.165;

impl ChargeCurve for SigmoidCurve {
    fn percentage(&self, volts: f32) -> u8 {
        if volts.is_nan() || volts <= 0.0 {
            return 0;
        }

        let ratio = Float::powf(volts / SIGMOID_MIDPOINT_V, SIGMOID_STEEPNESS);
        let denominator = Float::powf(1.0 + ratio, SIGMOID_EXPONENT);
        let percentage = Float::round(SIGMOID_SCALE - SIGMOID_SCALE / denominator);

        percentage.clamp(0.0, 100.0) as u8
    }
}

/// Either percentage strategy, picked per deployment profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Table(CalibrationTable),
    Sigmoid(SigmoidCurve),
}

impl ChargeCurve for Curve {
    fn percentage(&self, volts: f32) -> u8 {
        match self {
            Curve::Table(table) => table.percentage(volts),
            Curve::Sigmoid(sigmoid) => sigmoid.percentage(volts),
        }
    }
}

/// Width in pixels of the battery glyph fill bar
pub const FILL_WIDTH_PX: u32 = 16;

/// Linear map of 0..=100 percent onto 0..=16 pixels, truncating
///
/// # Examples
///
/// ```
/// use bottom_timer::battery::fill_width;
/// assert_eq!(fill_width(0), 0);
/// assert_eq!(fill_width(50), 8);
/// assert_eq!(fill_width(100), 16);
/// ```
///
pub fn fill_width(percentage: u8) -> u32 {
    u32::from(percentage.min(100)) * FILL_WIDTH_PX / 100
}

#[cfg(test)]
mod test {
    use super::*;

    fn lipo() -> CalibrationTable {
        CalibrationTable::new(LIPO_TABLE).unwrap()
    }

    #[test]
    fn table_exact_points() {
        let table = lipo();
        let res: Vec<u8> = [4.20, 3.95, 3.30].iter().map(|v| table.percentage(*v)).collect();
        assert_eq!(res, [100, 75, 0]);

        for &(volts, percentage) in LIPO_TABLE {
            assert_eq!(table.percentage(volts), percentage, "at {} V", volts);
        }
    }

    #[test]
    fn table_clamps_at_both_ends() {
        let table = lipo();
        assert_eq!(table.percentage(0.0), 0);
        assert_eq!(table.percentage(-1.0), 0);
        assert_eq!(table.percentage(3.0), 0);
        assert_eq!(table.percentage(4.35), 100);
        assert_eq!(table.percentage(f32::NAN), 0);
    }

    #[test]
    fn table_snaps_to_nearest_point() {
        let table = lipo();
        // 3.30 .. 3.60 bracket
        assert_eq!(table.percentage(3.40), 0);
        assert_eq!(table.percentage(3.50), 10);
        // 3.92 .. 3.95 bracket
        assert_eq!(table.percentage(3.93), 70);
        assert_eq!(table.percentage(3.94), 75);
    }

    #[test]
    fn table_is_monotonic() {
        let table = lipo();
        let mut previous = 0;
        for mv in 3000..4400 {
            let percentage = table.percentage(mv as f32 / 1000.0);
            assert!(percentage >= previous, "dropped at {} mV", mv);
            previous = percentage;
        }
    }

    #[test]
    fn table_lookup_round_trips_through_points() {
        let table = lipo();
        for mv in 3000..4400 {
            let percentage = table.percentage(mv as f32 / 1000.0);
            let (volts, _) = LIPO_TABLE.iter().find(|(_, p)| *p == percentage).unwrap();
            assert_eq!(table.percentage(*volts), percentage);
        }
    }

    #[test]
    fn rejects_bad_tables() {
        static EMPTY: [(f32, u8); 0] = [];
        static DESCENDING: [(f32, u8); 2] = [(4.2, 100), (3.3, 0)];
        static DUPLICATE: [(f32, u8); 2] = [(3.3, 0), (3.3, 10)];
        static DROPPING: [(f32, u8); 3] = [(3.3, 0), (3.7, 50), (4.2, 40)];
        static OVERFULL: [(f32, u8); 2] = [(3.3, 0), (4.2, 101)];

        assert_eq!(CalibrationTable::new(&EMPTY), Err(Error::EmptyTable));
        assert_eq!(CalibrationTable::new(&DESCENDING), Err(Error::TableNotIncreasing { index: 1 }));
        assert_eq!(CalibrationTable::new(&DUPLICATE), Err(Error::TableNotIncreasing { index: 1 }));
        assert_eq!(CalibrationTable::new(&DROPPING), Err(Error::TableNotIncreasing { index: 2 }));
        assert_eq!(
            CalibrationTable::new(&OVERFULL),
            Err(Error::PercentageOutOfRange { index: 1, percentage: 101 })
        );
    }

    #[test]
    fn sigmoid_percentages() {
        let sigmoid = SigmoidCurve;
        assert_eq!(sigmoid.percentage(4.2), 100);
        assert_eq!(sigmoid.percentage(3.0), 0);
        assert_eq!(sigmoid.percentage(0.0), 0);

        let res: Vec<u8> = [3.6, 3.7, 3.8, 3.9, 4.0, 4.1]
            .iter()
            .map(|v| sigmoid.percentage(*v))
            .collect();
        assert_eq!(res, [2, 13, 38, 62, 79, 91]);
    }

    #[test]
    fn sigmoid_is_monotonic() {
        let sigmoid = SigmoidCurve;
        let mut previous = 0;
        for mv in 3000..4400 {
            let percentage = sigmoid.percentage(mv as f32 / 1000.0);
            assert!(percentage >= previous, "dropped at {} mV", mv);
            previous = percentage;
        }
    }

    #[test]
    fn curve_dispatches_to_strategy() {
        assert_eq!(Curve::Table(lipo()).percentage(3.95), 75);
        assert_eq!(Curve::Sigmoid(SigmoidCurve).percentage(3.95), SigmoidCurve.percentage(3.95));
    }

    #[test]
    fn fill_width_is_linear() {
        assert_eq!(fill_width(0), 0);
        assert_eq!(fill_width(6), 0);
        assert_eq!(fill_width(7), 1);
        assert_eq!(fill_width(75), 12);
        assert_eq!(fill_width(100), 16);
        assert_eq!(fill_width(255), 16);
    }
}
