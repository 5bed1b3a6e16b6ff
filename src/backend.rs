use crate::{error::BookingError, schedule::ScheduleRule, types::Booking};
use chrono::{NaiveDate, NaiveDateTime};
use tokio_stream::wrappers::WatchStream;

/// Tracks which slots of each provider are still open.
pub trait AvailabilityLedger: Send + Sync + 'static {
    fn generate_schedule(
        &self,
        provider: &str,
        rule: &ScheduleRule,
        start: NaiveDate,
    ) -> Result<usize, BookingError>;
    fn providers(&self) -> Vec<String>;
    fn list_open_slots(&self, provider: &str) -> Result<Vec<NaiveDateTime>, BookingError>;
    fn total_slots(&self, provider: &str) -> Result<usize, BookingError>;
    /// Checks membership and removes the slot in one step.
    fn reserve(&self, provider: &str, slot: NaiveDateTime) -> Result<(), BookingError>;
    fn release(&self, provider: &str, slot: NaiveDateTime) -> Result<(), BookingError>;
    fn slot_stream(
        &self,
        provider: &str,
    ) -> Result<WatchStream<Vec<NaiveDateTime>>, BookingError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait IdentityStore: Send + Sync + 'static {
    fn register(&self, username: &str, password: &str) -> Result<(), BookingError>;
    fn authenticate(&self, username: &str, password: &str) -> bool;
    fn record_booking(&self, username: &str, booking: Booking) -> Result<(), BookingError>;
    fn list_bookings(&self, username: &str) -> Result<Vec<Booking>, BookingError>;
    fn bookings_for_provider(&self, provider: &str) -> usize;
}
