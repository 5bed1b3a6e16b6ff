use crate::{
    backend::{AvailabilityLedger, IdentityStore},
    error::BookingError,
    session::SessionRegistry,
    types::{Booking, LedgerAudit, Session},
};
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Ties the ledger and the identity store together. A booking either lands
/// in both stores or in neither.
pub struct BookingWorkflow<L, I> {
    ledger: Arc<L>,
    identities: Arc<I>,
    sessions: SessionRegistry,
    commit: Arc<Mutex<()>>,
}

impl<L, I> Clone for BookingWorkflow<L, I> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            identities: self.identities.clone(),
            sessions: self.sessions.clone(),
            commit: self.commit.clone(),
        }
    }
}

impl<L: AvailabilityLedger, I: IdentityStore> BookingWorkflow<L, I> {
    pub fn new(ledger: L, identities: I) -> Self {
        Self {
            ledger: Arc::new(ledger),
            identities: Arc::new(identities),
            sessions: SessionRegistry::default(),
            commit: Arc::default(),
        }
    }

    pub fn identities(&self) -> &I {
        &self.identities
    }

    fn commit_lock(&self) -> MutexGuard<'_, ()> {
        self.commit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session, BookingError> {
        if !self.identities.authenticate(username, password) {
            return Err(BookingError::InvalidCredentials);
        }
        let session = self.sessions.open(username);
        info!(username, "Logged in");
        Ok(session)
    }

    pub fn logout(&self, session: &Session) {
        if self.sessions.close(session) {
            info!(username = %session.username, "Logged out");
        }
    }

    pub fn session(&self, token: Uuid) -> Result<Session, BookingError> {
        self.sessions.resolve(token)
    }

    fn ensure_active(&self, session: &Session) -> Result<(), BookingError> {
        match self.sessions.is_active(session) {
            true => Ok(()),
            false => Err(BookingError::Unauthenticated),
        }
    }

    pub fn providers(&self) -> Vec<String> {
        self.ledger.providers()
    }

    pub fn list_open_slots(&self, provider: &str) -> Result<Vec<NaiveDateTime>, BookingError> {
        self.ledger.list_open_slots(provider)
    }

    pub fn slot_stream(
        &self,
        provider: &str,
    ) -> Result<WatchStream<Vec<NaiveDateTime>>, BookingError> {
        self.ledger.slot_stream(provider)
    }

    pub fn list_bookings(&self, session: &Session) -> Result<Vec<Booking>, BookingError> {
        self.ensure_active(session)?;
        self.identities.list_bookings(&session.username)
    }

    /// Reserves `slot` and records it for the session's user. If recording
    /// fails the slot is released again before the error is returned.
    pub fn book_appointment(
        &self,
        session: &Session,
        provider: &str,
        slot: NaiveDateTime,
    ) -> Result<Booking, BookingError> {
        let _commit = self.commit_lock();
        self.ensure_active(session)?;

        self.ledger.reserve(provider, slot)?;

        let booking = Booking {
            provider: provider.to_owned(),
            slot,
        };
        if let Err(err) = self
            .identities
            .record_booking(&session.username, booking.clone())
        {
            error!(
                ?err,
                username = %session.username,
                provider,
                %slot,
                "Failed to record booking, releasing slot"
            );
            if let Err(release_err) = self.ledger.release(provider, slot) {
                error!(?release_err, provider, %slot, "Failed to release slot after aborted booking");
            }
            return Err(err);
        }

        info!(username = %session.username, provider, %slot, "Appointment booked");
        Ok(booking)
    }

    /// Counts open and booked slots of `provider` against its generated total.
    pub fn audit(&self, provider: &str) -> Result<LedgerAudit, BookingError> {
        let _commit = self.commit_lock();
        let audit = LedgerAudit {
            provider: provider.to_owned(),
            total: self.ledger.total_slots(provider)?,
            open: self.ledger.list_open_slots(provider)?.len(),
            booked: self.identities.bookings_for_provider(provider),
        };
        if !audit.is_balanced() {
            warn!(?audit, "Ledger out of balance");
        }
        Ok(audit)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        backend::MockIdentityStore,
        local_identities::LocalIdentities,
        local_ledger::LocalLedger,
        schedule::ScheduleRule,
        testutils::{seeded_workflow, slot, start_date, DR_SMITH},
    };
    use std::{thread, time::Duration};

    #[test]
    fn test_book_appointment() {
        let workflow = seeded_workflow();
        let session = workflow.login("user1", "pass1").unwrap();
        let target = slot(3, 13);

        let booking = workflow
            .book_appointment(&session, DR_SMITH, target)
            .unwrap();
        assert_eq!(
            booking,
            Booking {
                provider: DR_SMITH.into(),
                slot: target,
            }
        );

        assert_eq!(workflow.list_bookings(&session).unwrap(), vec![booking]);
        assert!(!workflow.list_open_slots(DR_SMITH).unwrap().contains(&target));
    }

    #[test]
    fn test_book_same_slot_twice() {
        let workflow = seeded_workflow();
        let session = workflow.login("user1", "pass1").unwrap();
        let target = slot(3, 13);

        workflow.book_appointment(&session, DR_SMITH, target).unwrap();
        assert_eq!(
            workflow.book_appointment(&session, DR_SMITH, target),
            Err(BookingError::SlotUnavailable {
                provider: DR_SMITH.into(),
                slot: target,
            })
        );
        assert_eq!(workflow.list_bookings(&session).unwrap().len(), 1);
    }

    #[test]
    fn test_login_with_wrong_password() {
        let workflow = seeded_workflow();
        assert_eq!(
            workflow.login("user1", "wrongpass"),
            Err(BookingError::InvalidCredentials)
        );
        assert_eq!(
            workflow.login("nobody", "pass1"),
            Err(BookingError::InvalidCredentials)
        );
    }

    #[test]
    fn test_logged_out_session_can_not_book() {
        let workflow = seeded_workflow();
        let session = workflow.login("user1", "pass1").unwrap();
        assert_eq!(workflow.session(session.token).unwrap(), session);

        workflow.logout(&session);
        workflow.session(session.token).unwrap_err();
        assert_eq!(
            workflow.book_appointment(&session, DR_SMITH, slot(3, 13)),
            Err(BookingError::Unauthenticated)
        );
        assert_eq!(
            workflow.list_bookings(&session),
            Err(BookingError::Unauthenticated)
        );
        assert_eq!(workflow.list_open_slots(DR_SMITH).unwrap().len(), 88);
    }

    #[test]
    fn test_logout_while_booking_waits_for_commit() {
        let workflow = seeded_workflow();
        let session = workflow.login("user1", "pass1").unwrap();

        let result = thread::scope(|scope| {
            let commit = workflow.commit_lock();
            let booking =
                scope.spawn(|| workflow.book_appointment(&session, DR_SMITH, slot(3, 13)));
            thread::sleep(Duration::from_millis(50));
            workflow.logout(&session);
            drop(commit);
            booking.join().unwrap()
        });

        assert_eq!(result, Err(BookingError::Unauthenticated));
        assert_eq!(workflow.list_open_slots(DR_SMITH).unwrap().len(), 88);
    }

    #[test]
    fn test_conservation_across_bookings() {
        let workflow = seeded_workflow();
        workflow.identities().register("user2", "pass2").unwrap();
        let first = workflow.login("user1", "pass1").unwrap();
        let second = workflow.login("user2", "pass2").unwrap();

        let attempts = [
            (&first, slot(3, 13)),
            (&second, slot(3, 13)),
            (&second, slot(3, 14)),
            (&first, slot(8, 13)),
            (&first, slot(28, 16)),
        ];
        for (session, target) in attempts {
            let _ = workflow.book_appointment(session, DR_SMITH, target);
            let audit = workflow.audit(DR_SMITH).unwrap();
            assert!(audit.is_balanced(), "{audit:?}");
        }

        let audit = workflow.audit(DR_SMITH).unwrap();
        assert_eq!(audit.total, 88);
        assert_eq!(audit.booked, 3);
        assert_eq!(audit.open, 85);
    }

    #[test]
    fn test_rollback_when_recording_fails() {
        let ledger = LocalLedger::default();
        ledger
            .generate_schedule(DR_SMITH, &ScheduleRule::default(), start_date())
            .unwrap();

        let mut identities = MockIdentityStore::new();
        identities.expect_authenticate().returning(|_, _| true);
        identities
            .expect_record_booking()
            .times(1)
            .returning(|username, _| Err(BookingError::UnknownUser(username.to_owned())));
        identities.expect_bookings_for_provider().returning(|_| 0);

        let workflow = BookingWorkflow::new(ledger, identities);
        let session = workflow.login("ghost", "anything").unwrap();
        let target = slot(3, 13);

        assert_eq!(
            workflow.book_appointment(&session, DR_SMITH, target),
            Err(BookingError::UnknownUser("ghost".into()))
        );
        assert!(workflow.list_open_slots(DR_SMITH).unwrap().contains(&target));

        let audit = workflow.audit(DR_SMITH).unwrap();
        assert_eq!(audit.open, 88);
        assert!(audit.is_balanced());
    }

    #[test]
    fn test_concurrent_bookings_of_one_slot() {
        let workflow = seeded_workflow();
        let identities: &LocalIdentities = workflow.identities();
        for user in 2..=6 {
            identities
                .register(&format!("user{user}"), "secret")
                .unwrap();
        }
        let sessions: Vec<Session> = (2..=6)
            .map(|user| workflow.login(&format!("user{user}"), "secret").unwrap())
            .collect();
        let target = slot(20, 15);

        let successes = thread::scope(|scope| {
            let handles: Vec<_> = sessions
                .iter()
                .map(|session| {
                    let workflow = workflow.clone();
                    scope.spawn(move || {
                        workflow
                            .book_appointment(session, DR_SMITH, target)
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|booked| *booked)
                .count()
        });

        assert_eq!(successes, 1);
        let audit = workflow.audit(DR_SMITH).unwrap();
        assert_eq!(audit.booked, 1);
        assert!(audit.is_balanced());
    }
}
