use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing or unknown session")]
    Unauthenticated,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Slot {slot} with {provider} is not available")]
    SlotUnavailable {
        provider: String,
        slot: NaiveDateTime,
    },

    #[error("Slot {slot} with {provider} is not reserved")]
    SlotNotReserved {
        provider: String,
        slot: NaiveDateTime,
    },

    #[error("Schedule for {0} was already generated")]
    ScheduleAlreadyGenerated(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to hash credentials: {0}")]
    CredentialHashing(String),
}
