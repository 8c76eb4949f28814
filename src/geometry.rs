//! Immutable value types shared across the scenario: plan coordinates and
//! durations.
//!
//! Both types validate at construction and expose no setters, so an invalid
//! intermediate state is never observable.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A location on the floor plan. Both coordinates are non-negative.
///
/// # Examples
///
/// ```
/// use hospital_scenario::Point;
///
/// let p = Point::new(3, 4).unwrap();
/// assert_eq!((p.x(), p.y()), (3, 4));
/// assert!(Point::new(-1, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct Point {
    x: u32,
    y: u32,
}

#[derive(Deserialize)]
struct RawPoint {
    x: i64,
    y: i64,
}

impl TryFrom<RawPoint> for Point {
    type Error = GeometryError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y)
    }
}

impl Point {
    /// Creates a point.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidPoint` if either coordinate is negative
    /// or does not fit in 32 bits.
    pub fn new(x: i64, y: i64) -> Result<Self, GeometryError> {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) => Ok(Self { x, y }),
            _ => Err(GeometryError::InvalidPoint { x, y }),
        }
    }

    /// Creates a point from unsigned coordinates, which cannot fail.
    #[must_use]
    pub const fn at(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An interval of time: days, hours (0-23), minutes (0-59), seconds (0-59).
///
/// Serialized as a `{days, hours, minutes, seconds}` object, which is the
/// shape the simulation engine reads for every duration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTimePeriod")]
pub struct TimePeriod {
    days: u32,
    hours: u8,
    minutes: u8,
    seconds: u8,
}

#[derive(Deserialize)]
struct RawTimePeriod {
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl TryFrom<RawTimePeriod> for TimePeriod {
    type Error = GeometryError;

    fn try_from(raw: RawTimePeriod) -> Result<Self, Self::Error> {
        Self::new(raw.days, raw.hours, raw.minutes, raw.seconds)
    }
}

fn bounded(field: &'static str, value: i64, max: i64) -> Result<i64, GeometryError> {
    if (0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(GeometryError::InvalidTimePeriod { field, value, max })
    }
}

impl TimePeriod {
    /// Field names in serialization order.
    pub const FIELDS: [&'static str; 4] = ["days", "hours", "minutes", "seconds"];

    /// Creates a time period.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidTimePeriod` naming the first field that
    /// is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use hospital_scenario::TimePeriod;
    ///
    /// let t = TimePeriod::new(0, 1, 30, 0).unwrap();
    /// assert_eq!(t.total_seconds(), 5400);
    /// assert!(TimePeriod::new(0, 24, 0, 0).is_err());
    /// ```
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64) -> Result<Self, GeometryError> {
        let days = bounded("days", days, i64::from(u32::MAX))?;
        let hours = bounded("hours", hours, 23)?;
        let minutes = bounded("minutes", minutes, 59)?;
        let seconds = bounded("seconds", seconds, 59)?;

        // Every value was bounded above, the casts are lossless.
        Ok(Self {
            days: days as u32,
            hours: hours as u8,
            minutes: minutes as u8,
            seconds: seconds as u8,
        })
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    /// Splits a number of seconds into a normalized time period.
    ///
    /// # Errors
    ///
    /// Fails if the number of days does not fit in 32 bits.
    #[allow(clippy::cast_possible_wrap)]
    pub fn from_seconds(total: u64) -> Result<Self, GeometryError> {
        let days = i64::try_from(total / 86_400).unwrap_or(i64::MAX);
        // All three remainders are < 86_400.
        let rest = total % 86_400;
        Self::new(
            days,
            (rest / 3600) as i64,
            (rest % 3600 / 60) as i64,
            (rest % 60) as i64,
        )
    }

    #[must_use]
    pub const fn days(&self) -> u32 {
        self.days
    }

    #[must_use]
    pub const fn hours(&self) -> u8 {
        self.hours
    }

    #[must_use]
    pub const fn minutes(&self) -> u8 {
        self.minutes
    }

    #[must_use]
    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Total length of the period in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.days) * 86_400
            + u64::from(self.hours) * 3600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds)
    }

    /// The period as a chrono duration.
    #[must_use]
    pub fn to_duration(&self) -> Duration {
        Duration::days(i64::from(self.days))
            + Duration::hours(i64::from(self.hours))
            + Duration::minutes(i64::from(self.minutes))
            + Duration::seconds(i64::from(self.seconds))
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_rejects_negative() {
        assert_eq!(
            Point::new(-1, 3),
            Err(GeometryError::InvalidPoint { x: -1, y: 3 })
        );
        assert!(Point::new(3, -1).is_err());
        assert!(Point::new(0, 0).is_ok());
    }

    #[test]
    fn test_point_serialization() {
        let p = Point::new(5, 7).unwrap();
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json, serde_json::json!({"x": 5, "y": 7}));

        let back: Point = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_point_deserialization_validates() {
        let result: Result<Point, _> = serde_json::from_value(serde_json::json!({"x": -2, "y": 0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_time_period_bounds() {
        assert!(TimePeriod::new(0, 23, 59, 59).is_ok());
        assert_eq!(
            TimePeriod::new(0, 0, 60, 0),
            Err(GeometryError::InvalidTimePeriod {
                field: "minutes",
                value: 60,
                max: 59
            })
        );
        assert!(TimePeriod::new(-1, 0, 0, 0).is_err());
        assert!(TimePeriod::new(0, 0, 0, 60).is_err());
        assert!(TimePeriod::new(0, -1, 0, 0).is_err());
    }

    #[test]
    fn test_time_period_serialization_shape() {
        let t = TimePeriod::new(2, 14, 24, 0).unwrap();
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"days": 2, "hours": 14, "minutes": 24, "seconds": 0})
        );
    }

    #[test]
    fn test_time_period_deserialization_validates() {
        let bad = serde_json::json!({"days": 0, "hours": 25, "minutes": 0, "seconds": 0});
        assert!(serde_json::from_value::<TimePeriod>(bad).is_err());
    }

    #[test]
    fn test_time_period_conversions() {
        let t = TimePeriod::new(1, 2, 3, 4).unwrap();
        assert_eq!(t.total_seconds(), 93_784);
        assert_eq!(t.to_duration(), Duration::seconds(93_784));
        assert_eq!(TimePeriod::from_seconds(93_784).unwrap(), t);
        assert_eq!(format!("{t}"), "1d 02:03:04");
    }
}
