//! Simulated time of day.

use chrono::{Duration, NaiveTime};

use crate::error::{Result, RoutingError};

/// Minutes per hour, used to convert distance at a fixed speed into time.
const MINUTES_PER_HOUR: f64 = 60.0;

/// Latest representable time of day; the clock stops here.
const LAST_SECOND: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

/// A per-vehicle simulated clock.
///
/// Travel advances the clock by `round(distance × 60 / speed)` whole
/// minutes. The clock never wraps: anything past midnight saturates at
/// 23:59:59 so late deliveries still compare as late.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::models::SimClock;
///
/// let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let mut clock = SimClock::new(start, 18.0).unwrap();
/// clock.advance_distance(3.0);
/// assert_eq!(clock.now(), NaiveTime::from_hms_opt(8, 10, 0).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    now: NaiveTime,
    speed: f64,
}

impl SimClock {
    /// Average speed (distance units per hour) used by [`SimClock::start`].
    pub const DEFAULT_SPEED: f64 = 18.0;

    /// Creates a clock at `start` for a vehicle moving at `speed` distance
    /// units per hour.
    ///
    /// Fails with [`RoutingError::InvalidSpeed`] unless `speed` is finite
    /// and positive.
    pub fn new(start: NaiveTime, speed: f64) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RoutingError::InvalidSpeed(speed));
        }
        Ok(Self { now: start, speed })
    }

    /// Creates a clock at `start` running at [`SimClock::DEFAULT_SPEED`].
    pub fn start(start: NaiveTime) -> Self {
        Self {
            now: start,
            speed: Self::DEFAULT_SPEED,
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> NaiveTime {
        self.now
    }

    /// Average speed in distance units per hour.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Travel time for `distance`, rounded to whole minutes.
    pub fn travel_time(&self, distance: f64) -> Duration {
        let minutes = (distance * MINUTES_PER_HOUR / self.speed).round();
        Duration::try_minutes(minutes as i64).unwrap_or(Duration::MAX)
    }

    /// Advances the clock by the travel time for `distance`.
    pub fn advance_distance(&mut self, distance: f64) -> Duration {
        let elapsed = self.travel_time(distance);
        self.advance(elapsed);
        elapsed
    }

    /// Advances the clock by a fixed duration, stopping at 23:59:59.
    pub fn advance(&mut self, elapsed: Duration) {
        let (next, overflow) = self.now.overflowing_add_signed(elapsed);
        self.now = match overflow {
            0 => next,
            o if o > 0 => {
                tracing::warn!(from = %self.now, ?elapsed, "simulated day overran midnight");
                LAST_SECOND
            }
            _ => NaiveTime::MIN,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn test_travel_time_rounding() {
        let clock = SimClock::new(at(8, 0), 18.0).expect("valid speed");
        assert_eq!(clock.travel_time(3.0), Duration::minutes(10));
        // 1.0 mile = 3.33 min
        assert_eq!(clock.travel_time(1.0), Duration::minutes(3));
        // 0.5 mile = 1.67 min
        assert_eq!(clock.travel_time(0.5), Duration::minutes(2));
        assert_eq!(clock.travel_time(0.0), Duration::zero());
    }

    #[test]
    fn test_advance_distance() {
        let mut clock = SimClock::new(at(9, 15), 18.0).expect("valid speed");
        let elapsed = clock.advance_distance(9.0);
        assert_eq!(elapsed, Duration::minutes(30));
        assert_eq!(clock.now(), at(9, 45));
    }

    #[test]
    fn test_saturates_at_midnight() {
        let mut clock = SimClock::new(at(23, 50), 60.0).expect("valid speed");
        clock.advance_distance(20.0);
        assert_eq!(clock.now(), LAST_SECOND);
        assert!(clock.now() > at(18, 0));

        clock.advance_distance(5.0);
        assert_eq!(clock.now(), LAST_SECOND);
    }

    #[test]
    fn test_huge_distance_does_not_panic() {
        let mut clock = SimClock::start(at(8, 0));
        clock.advance_distance(1e300);
        assert_eq!(clock.now(), LAST_SECOND);
    }

    #[test]
    fn test_rejects_invalid_speed() {
        for speed in [0.0, -18.0, f64::NAN, f64::INFINITY] {
            let err = SimClock::new(at(8, 0), speed).expect_err("invalid speed");
            assert!(matches!(err, RoutingError::InvalidSpeed(_)));
        }
        assert_eq!(SimClock::start(at(8, 0)).speed(), SimClock::DEFAULT_SPEED);
    }
}
