use thiserror::Error;

/// Invalid deployment profile or calibration data
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("calibration table is empty")]
    EmptyTable,

    #[error("calibration table is not increasing at index {index}")]
    TableNotIncreasing { index: usize },

    #[error("calibration percentage {percentage} at index {index} exceeds 100")]
    PercentageOutOfRange { index: usize, percentage: u8 },

    #[error("battery burst size must be at least one sample")]
    EmptyBurst,

    #[error("sample cycle must be longer than zero")]
    ZeroCycle,

    #[error("invalid {0} parameter")]
    InvalidParameter(&'static str),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotIncreasing { index: 3 };
        assert_eq!(err.to_string(), "calibration table is not increasing at index 3");

        let err = Error::PercentageOutOfRange {
            index: 1,
            percentage: 120,
        };
        assert_eq!(err.to_string(), "calibration percentage 120 at index 1 exceeds 100");

        let err = Error::InvalidParameter("measurement noise");
        assert_eq!(err.to_string(), "invalid measurement noise parameter");
    }
}
