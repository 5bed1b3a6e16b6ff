use crate::{
    configuration::{Configuration, SeedUser},
    schedule::ScheduleRule,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Appointment booking service")]
pub struct ConfigurationHandler {
    /// Port the HTTP server listens on
    #[arg(long, env = "APPOINTMENT_PORT", default_value_t = 3000)]
    port: u16,

    /// Provider offering appointments (repeatable)
    #[arg(
        long = "provider",
        env = "APPOINTMENT_PROVIDERS",
        value_delimiter = ',',
        default_value = "Dr. Smith"
    )]
    providers: Vec<String>,

    /// Number of calendar days slots are generated for
    #[arg(long, env = "APPOINTMENT_WINDOW_DAYS", default_value_t = 30)]
    window_days: u32,

    /// Hour of the first slot of a day
    #[arg(
        long,
        env = "APPOINTMENT_ANCHOR_HOUR",
        default_value_t = 13,
        value_parser = clap::value_parser!(u32).range(0..24)
    )]
    anchor_hour: u32,

    #[arg(long, env = "APPOINTMENT_HOURS_PER_DAY", default_value_t = 4)]
    hours_per_day: u32,

    /// Offer slots on Saturdays and Sundays too
    #[arg(long, env = "APPOINTMENT_INCLUDE_WEEKENDS")]
    include_weekends: bool,

    /// User created at startup, as `name:password` (repeatable)
    #[arg(
        long = "seed-user",
        env = "APPOINTMENT_SEED_USERS",
        value_delimiter = ',',
        default_value = "user1:pass1",
        value_parser = parse_seed_user
    )]
    seed_users: Vec<SeedUser>,
}

fn parse_seed_user(value: &str) -> Result<SeedUser, String> {
    match value.split_once(':') {
        Some((username, password)) if !username.is_empty() => Ok(SeedUser {
            username: username.to_owned(),
            password: password.to_owned(),
        }),
        _ => Err(format!("expected `name:password`, got `{value}`")),
    }
}

impl ConfigurationHandler {
    /// Reads `.env` (if present) before parsing, so its values act as
    /// defaults for the environment-backed options.
    pub fn parse_arguments() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn providers(&self) -> Vec<String> {
        self.providers.clone()
    }

    fn schedule_rule(&self) -> ScheduleRule {
        ScheduleRule {
            window_days: self.window_days,
            anchor_hour: self.anchor_hour,
            hours_per_day: self.hours_per_day,
            weekdays_only: !self.include_weekends,
        }
    }

    fn seed_users(&self) -> Vec<SeedUser> {
        self.seed_users.clone()
    }
}
