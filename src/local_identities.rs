use crate::{backend::IdentityStore, error::BookingError, password::PasswordHash, types::Booking};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

#[derive(Debug)]
struct UserRecord {
    credential: PasswordHash,
    bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalIdentities {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl LocalIdentities {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserRecord>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityStore for LocalIdentities {
    fn register(&self, username: &str, password: &str) -> Result<(), BookingError> {
        let credential = PasswordHash::new(password)?;
        let mut users = self.lock();
        if users.contains_key(username) {
            return Err(BookingError::UserAlreadyExists(username.to_owned()));
        }
        users.insert(
            username.to_owned(),
            UserRecord {
                credential,
                bookings: Vec::new(),
            },
        );
        info!(username, "Registered user");
        Ok(())
    }

    fn authenticate(&self, username: &str, password: &str) -> bool {
        let credential = self.lock().get(username).map(|user| user.credential.clone());
        let authenticated = credential.is_some_and(|credential| credential.verify(password));
        if !authenticated {
            warn!(username, "Authentication failed");
        }
        authenticated
    }

    fn record_booking(&self, username: &str, booking: Booking) -> Result<(), BookingError> {
        self.lock()
            .get_mut(username)
            .map(|user| user.bookings.push(booking))
            .ok_or_else(|| BookingError::UnknownUser(username.to_owned()))
    }

    fn list_bookings(&self, username: &str) -> Result<Vec<Booking>, BookingError> {
        self.lock()
            .get(username)
            .map(|user| user.bookings.clone())
            .ok_or_else(|| BookingError::UnknownUser(username.to_owned()))
    }

    fn bookings_for_provider(&self, provider: &str) -> usize {
        self.lock()
            .values()
            .flat_map(|user| &user.bookings)
            .filter(|booking| booking.provider == provider)
            .count()
    }
}
