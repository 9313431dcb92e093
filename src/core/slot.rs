use chrono::{NaiveTime, TimeDelta, Timelike};

/// Number of 15-minute slots covering the 24-hour horizon.
pub const SLOTS_PER_DAY: usize = 96;

/// Width of a single scheduling slot.
pub const SLOT_WIDTH: TimeDelta = TimeDelta::minutes(15);

/// Fixed-length per-slot array covering the whole horizon.
pub type PerSlot<T> = [T; SLOTS_PER_DAY];

/// Slot index of the given wall-clock time.
pub fn of_time(time: NaiveTime) -> usize {
    (time.hour() * 4 + time.minute() / 15) as usize
}

/// Starting wall-clock time of the given slot.
#[expect(clippy::cast_possible_truncation)]
pub fn start_of(slot: usize) -> NaiveTime {
    NaiveTime::from_hms_opt((slot / 4) as u32, (slot % 4 * 15) as u32, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// Hour of day the slot falls in.
#[expect(clippy::cast_possible_truncation)]
pub const fn hour_of(slot: usize) -> u32 {
    (slot / 4) as u32
}

/// Daily window with a raised SOC floor.
#[derive(Copy, Clone, Debug)]
pub struct CriticalHours {
    pub start: u32,
    pub end: u32,
}

impl CriticalHours {
    /// The end hour is exclusive; `start > end` means the window crosses midnight.
    #[must_use]
    pub const fn contains(self, hour: u32) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_time() {
        assert_eq!(of_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()), 0);
        assert_eq!(of_time(NaiveTime::from_hms_opt(0, 14, 59).unwrap()), 0);
        assert_eq!(of_time(NaiveTime::from_hms_opt(17, 45, 0).unwrap()), 71);
        assert_eq!(of_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap()), 95);
    }

    #[test]
    fn test_start_of() {
        assert_eq!(start_of(0), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(start_of(71), NaiveTime::from_hms_opt(17, 45, 0).unwrap());
        assert_eq!(start_of(95), NaiveTime::from_hms_opt(23, 45, 0).unwrap());
    }

    #[test]
    fn test_hour_of() {
        assert_eq!(hour_of(0), 0);
        assert_eq!(hour_of(71), 17);
        assert_eq!(hour_of(95), 23);
    }

    #[test]
    fn test_critical_hours() {
        let evening = CriticalHours { start: 17, end: 21 };
        assert!(evening.contains(17));
        assert!(evening.contains(20));
        assert!(!evening.contains(21));
        assert!(!evening.contains(16));
    }

    #[test]
    fn test_critical_hours_wrapping() {
        let night = CriticalHours { start: 22, end: 6 };
        assert!(night.contains(22));
        assert!(night.contains(23));
        assert!(night.contains(0));
        assert!(night.contains(5));
        assert!(!night.contains(6));
        assert!(!night.contains(21));
    }
}
