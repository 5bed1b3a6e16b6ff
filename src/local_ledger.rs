use crate::{backend::AvailabilityLedger, error::BookingError, schedule::ScheduleRule};
use chrono::{NaiveDate, NaiveDateTime};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

#[derive(Debug)]
struct ProviderSlots {
    universe: BTreeSet<NaiveDateTime>,
    open: BTreeSet<NaiveDateTime>,
    sender: Sender<Vec<NaiveDateTime>>,
}

impl ProviderSlots {
    fn snapshot(&self) -> Vec<NaiveDateTime> {
        self.open.iter().copied().collect()
    }

    fn send_open_slots(&self) {
        self.sender.send_replace(self.snapshot());
    }
}

/// In-memory ledger. All providers share one lock, so a reservation is a
/// single check-and-remove that no other caller can interleave with.
#[derive(Debug, Clone, Default)]
pub struct LocalLedger {
    providers: Arc<Mutex<HashMap<String, ProviderSlots>>>,
}

impl LocalLedger {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProviderSlots>> {
        self.providers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unknown_provider(provider: &str) -> BookingError {
    BookingError::UnknownProvider(provider.to_owned())
}

impl AvailabilityLedger for LocalLedger {
    fn generate_schedule(
        &self,
        provider: &str,
        rule: &ScheduleRule,
        start: NaiveDate,
    ) -> Result<usize, BookingError> {
        let mut providers = self.lock();
        if providers.contains_key(provider) {
            return Err(BookingError::ScheduleAlreadyGenerated(provider.to_owned()));
        }

        let universe: BTreeSet<NaiveDateTime> = rule.slots(start)?.into_iter().collect();
        let (sender, _) = watch::channel(universe.iter().copied().collect());
        let generated = universe.len();
        providers.insert(
            provider.to_owned(),
            ProviderSlots {
                open: universe.clone(),
                universe,
                sender,
            },
        );

        info!(provider, generated, %start, "Generated schedule");
        Ok(generated)
    }

    fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn list_open_slots(&self, provider: &str) -> Result<Vec<NaiveDateTime>, BookingError> {
        self.lock()
            .get(provider)
            .map(ProviderSlots::snapshot)
            .ok_or_else(|| unknown_provider(provider))
    }

    fn total_slots(&self, provider: &str) -> Result<usize, BookingError> {
        self.lock()
            .get(provider)
            .map(|slots| slots.universe.len())
            .ok_or_else(|| unknown_provider(provider))
    }

    fn reserve(&self, provider: &str, slot: NaiveDateTime) -> Result<(), BookingError> {
        let mut providers = self.lock();
        let slots = providers
            .get_mut(provider)
            .ok_or_else(|| unknown_provider(provider))?;

        if !slots.open.remove(&slot) {
            warn!(provider, %slot, "Slot is not open");
            return Err(BookingError::SlotUnavailable {
                provider: provider.to_owned(),
                slot,
            });
        }
        slots.send_open_slots();
        Ok(())
    }

    fn release(&self, provider: &str, slot: NaiveDateTime) -> Result<(), BookingError> {
        let mut providers = self.lock();
        let slots = providers
            .get_mut(provider)
            .ok_or_else(|| unknown_provider(provider))?;

        if !slots.universe.contains(&slot) || !slots.open.insert(slot) {
            warn!(provider, %slot, "Slot was not reserved");
            return Err(BookingError::SlotNotReserved {
                provider: provider.to_owned(),
                slot,
            });
        }
        slots.send_open_slots();
        Ok(())
    }

    fn slot_stream(
        &self,
        provider: &str,
    ) -> Result<WatchStream<Vec<NaiveDateTime>>, BookingError> {
        self.lock()
            .get(provider)
            .map(|slots| WatchStream::new(slots.sender.subscribe()))
            .ok_or_else(|| unknown_provider(provider))
    }
}
