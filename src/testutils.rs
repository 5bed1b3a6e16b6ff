use crate::{
    backend::{AvailabilityLedger, IdentityStore},
    booking::BookingWorkflow,
    local_identities::LocalIdentities,
    local_ledger::LocalLedger,
    schedule::ScheduleRule,
};
use chrono::{NaiveDate, NaiveDateTime};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::timeout;
use tokio_stream::wrappers::WatchStream;

pub const DR_SMITH: &str = "Dr. Smith";

/// Monday, 2024-06-03. A 30 day window from here holds 22 weekdays.
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

/// Slot on the given day of June 2024.
pub fn slot(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Dr. Smith with the default schedule and `user1`/`pass1`.
pub fn seeded_workflow() -> BookingWorkflow<LocalLedger, LocalIdentities> {
    let ledger = LocalLedger::default();
    ledger
        .generate_schedule(DR_SMITH, &ScheduleRule::default(), start_date())
        .unwrap();
    let identities = LocalIdentities::default();
    identities.register("user1", "pass1").unwrap();
    BookingWorkflow::new(ledger, identities)
}

pub async fn read_from_slot_stream(
    slot_stream: &mut WatchStream<Vec<NaiveDateTime>>,
) -> Vec<NaiveDateTime> {
    timeout(Duration::from_secs(1), slot_stream.next())
        .await
        .expect("No slot update within a second")
        .expect("Slot stream closed")
}
