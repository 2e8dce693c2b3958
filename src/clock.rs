//! Wall-clock access, injectable so hour-dependent logic can be tested.

use chrono::{Local, Timelike};

/// Source of the current local hour of day.
pub trait Clock: Send + Sync {
    /// Hour of day, 0..=23.
    fn hour(&self) -> u32;
}

/// Reads the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Always reports the same hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn hour(&self) -> u32 {
        self.0.min(23)
    }
}
