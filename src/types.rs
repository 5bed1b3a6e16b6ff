use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub provider: String,
    pub slot: NaiveDateTime,
}

/// Proof of a successful login. Every operation acting on behalf of a user
/// takes one of these instead of a bare username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
}

/// Snapshot of a provider's slot accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub provider: String,
    pub total: usize,
    pub open: usize,
    pub booked: usize,
}

impl LedgerAudit {
    /// Every generated slot is either open or booked, never both.
    pub fn is_balanced(&self) -> bool {
        self.open + self.booked == self.total
    }
}
