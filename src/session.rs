use crate::{error::BookingError, types::Session};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

/// Logged-in sessions keyed by their token.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl SessionRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, String>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, username: &str) -> Session {
        let token = Uuid::new_v4();
        self.lock().insert(token, username.to_owned());
        Session {
            token,
            username: username.to_owned(),
        }
    }

    pub fn resolve(&self, token: Uuid) -> Result<Session, BookingError> {
        self.lock()
            .get(&token)
            .map(|username| Session {
                token,
                username: username.clone(),
            })
            .ok_or(BookingError::Unauthenticated)
    }

    pub fn is_active(&self, session: &Session) -> bool {
        self.lock().get(&session.token) == Some(&session.username)
    }

    pub fn close(&self, session: &Session) -> bool {
        self.lock().remove(&session.token).is_some()
    }
}
