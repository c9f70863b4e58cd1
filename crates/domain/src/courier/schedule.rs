use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::CourierError;

/// Working hours on one day; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, CourierError> {
        if end <= start {
            return Err(CourierError::InvalidSchedule(
                "end time must be after start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }

    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}

/// Weekly working pattern, one optional slot per weekday.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailabilitySchedule {
    /// Indexed by days from Monday.
    slots: [Option<TimeSlot>; 7],
}

impl AvailabilitySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, day: Weekday, slot: TimeSlot) -> Self {
        self.slots[day.num_days_from_monday() as usize] = Some(slot);
        self
    }

    /// The same slot every day of the week.
    pub fn every_day(slot: TimeSlot) -> Self {
        Self { slots: [Some(slot); 7] }
    }

    pub fn slot_for(&self, day: Weekday) -> Option<TimeSlot> {
        self.slots[day.num_days_from_monday() as usize]
    }

    pub fn is_available_on(&self, day: Weekday) -> bool {
        self.slot_for(day).is_some()
    }

    /// Evaluated in UTC.
    pub fn is_available_at(&self, at: DateTime<Utc>) -> bool {
        self.slot_for(at.weekday())
            .is_some_and(|slot| slot.contains(at.time()))
    }

    pub fn total_weekly_hours(&self) -> f64 {
        self.slots.iter().flatten().map(TimeSlot::hours).sum()
    }
}
