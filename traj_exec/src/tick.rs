//! # Tick source
//!
//! Fixed period cycle clock for the executive loop. Each call to `TickSource::wait` blocks until
//! the next deadline by sleeping for most of the remaining time then spinning for the rest. A
//! deadline which has already passed is reported as an overrun and the schedule restarts from
//! the current instant, so missed ticks are dropped rather than run back to back.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Time before the deadline at which sleeping stops and spinning starts.
const SPIN_MARGIN: Duration = Duration::from_micros(500);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TickSource {
    period: Duration,

    /// `None` until the first call to `wait`.
    next_deadline: Option<Instant>,

    num_ticks: u64,

    num_overruns: u64,

    num_consec_overruns: u64
}

/// Information on a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Index of this tick, starting at 0.
    pub index: u64,

    /// How late the tick was, if its deadline had already passed.
    pub overrun: Option<Duration>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum TickError {
    #[error("The tick period must be greater than zero")]
    ZeroPeriod
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickSource {
    pub fn new(period: Duration) -> Result<Self, TickError> {
        if period == Duration::from_secs(0) {
            return Err(TickError::ZeroPeriod)
        }

        Ok(Self {
            period,
            next_deadline: None,
            num_ticks: 0,
            num_overruns: 0,
            num_consec_overruns: 0
        })
    }

    pub fn from_millis(period_ms: u64) -> Result<Self, TickError> {
        Self::new(Duration::from_millis(period_ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Period in seconds, the time step of each tick.
    pub fn period_s(&self) -> f64 {
        self.period.as_secs_f64()
    }

    /// Number of ticks per second, rounded.
    pub fn frequency_hz(&self) -> u64 {
        (1.0 / self.period_s()).round().max(1.0) as u64
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    pub fn num_overruns(&self) -> u64 {
        self.num_overruns
    }

    pub fn num_consec_overruns(&self) -> u64 {
        self.num_consec_overruns
    }

    /// Block until the next tick.
    ///
    /// The first call returns immediately and starts the schedule.
    pub fn wait(&mut self) -> Tick {
        let now = Instant::now();

        let deadline = match self.next_deadline {
            Some(d) => d,
            None => now
        };

        let overrun = if now > deadline && self.next_deadline.is_some() {
            let late = now - deadline;
            self.num_overruns += 1;
            self.num_consec_overruns += 1;
            warn!(
                "Cycle overran by {:.06} s ({} consecutive)", 
                late.as_secs_f64(), 
                self.num_consec_overruns
            );
            self.next_deadline = Some(now + self.period);
            Some(late)
        }
        else {
            self.num_consec_overruns = 0;
            sleep_until(deadline);
            self.next_deadline = Some(deadline + self.period);
            None
        };

        let tick = Tick {
            index: self.num_ticks,
            overrun
        };
        self.num_ticks += 1;

        tick
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now + SPIN_MARGIN {
        thread::sleep(deadline - now - SPIN_MARGIN);
    }

    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_period() {
        assert_eq!(TickSource::from_millis(0).unwrap_err(), TickError::ZeroPeriod);
    }

    #[test]
    fn test_period() {
        let mut ts = TickSource::from_millis(5).unwrap();
        assert_eq!(ts.frequency_hz(), 200);

        let t0 = Instant::now();
        let first = ts.wait();
        assert_eq!(first, Tick { index: 0, overrun: None });

        for _ in 0..4 {
            ts.wait();
        }

        assert!(t0.elapsed() >= Duration::from_millis(20));
        assert_eq!(ts.num_ticks(), 5);
    }

    #[test]
    fn test_overrun() {
        let mut ts = TickSource::from_millis(20).unwrap();
        ts.wait();

        thread::sleep(Duration::from_millis(50));
        let late = ts.wait();

        assert_eq!(late.index, 1);
        assert!(late.overrun.is_some());
        assert_eq!(ts.num_overruns(), 1);
        assert_eq!(ts.num_consec_overruns(), 1);

        // The schedule restarts from the overrun, the next tick is on time
        let next = ts.wait();
        assert_eq!(next.overrun, None);
        assert_eq!(ts.num_consec_overruns(), 0);
    }
}
