use core::fmt;

use crate::{info, Duration, Instant};

/// Depth in meters at which the dive clock starts
pub const START_DEPTH_M: f32 = 1.0;

const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running { start: Instant },
}

/// Elapsed dive time split for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElapsedTime {
    pub minutes: u64,
    pub seconds: u64,
}

impl ElapsedTime {
    pub fn from_duration(elapsed: Duration) -> Self {
        let ms = elapsed.to_millis();
        ElapsedTime {
            minutes: ms / MS_PER_MINUTE,
            seconds: (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        }
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:0>2}", self.minutes, self.seconds)
    }
}

/// One way latch from idle to running, tripped by the first reading at
/// [`START_DEPTH_M`] or deeper. There is no dive end detection: once running the
/// clock keeps counting until the device is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiveTimer {
    phase: Phase,
}

impl DiveTimer {
    pub const fn new() -> Self {
        DiveTimer { phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn update(&mut self, depth: f32, now: Instant) -> Phase {
        if self.phase == Phase::Idle && depth >= START_DEPTH_M {
            info!("Dive started at {} m", depth);
            self.phase = Phase::Running { start: now };
        }

        self.phase
    }

    pub fn elapsed(&self, now: Instant) -> ElapsedTime {
        match self.phase {
            Phase::Idle => ElapsedTime::default(),
            Phase::Running { start } => {
                // A clock reading from before the start counts as zero
                let elapsed = now.checked_duration_since(start).unwrap_or(Duration::millis(0));
                ElapsedTime::from_duration(elapsed)
            }
        }
    }
}

impl Default for DiveTimer {
    fn default() -> Self {
        Self::new()
    }
}
