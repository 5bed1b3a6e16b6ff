use crate::error::BookingError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// How a provider's slot universe is laid out: `hours_per_day` hourly slots
/// starting at `anchor_hour` on every (week)day of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRule {
    pub window_days: u32,
    pub anchor_hour: u32,
    pub hours_per_day: u32,
    pub weekdays_only: bool,
}

impl Default for ScheduleRule {
    fn default() -> Self {
        Self {
            window_days: 30,
            anchor_hour: 13,
            hours_per_day: 4,
            weekdays_only: true,
        }
    }
}

impl ScheduleRule {
    /// Slots must not spill over into the next day.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.anchor_hour.saturating_add(self.hours_per_day) > 24 {
            return Err(BookingError::InvalidSchedule(format!(
                "{} slots starting at {}:00 exceed the day",
                self.hours_per_day, self.anchor_hour
            )));
        }
        Ok(())
    }

    pub fn includes(&self, day: NaiveDate) -> bool {
        !self.weekdays_only || !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Generates the slot universe for the window starting at `start`, in
    /// ascending order.
    pub fn slots(&self, start: NaiveDate) -> Result<Vec<NaiveDateTime>, BookingError> {
        self.validate()?;

        let times = (0..self.hours_per_day)
            .map(|offset| {
                let hour = self.anchor_hour + offset;
                NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| {
                    BookingError::InvalidSchedule(format!("{hour}:00 is not a valid time"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(start
            .iter_days()
            .take(self.window_days as usize)
            .filter(|day| self.includes(*day))
            .flat_map(|day| times.iter().map(move |time| day.and_time(*time)))
            .collect())
    }
}
