use crate::schedule::ScheduleRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    fn providers(&self) -> Vec<String>;
    fn schedule_rule(&self) -> ScheduleRule;
    fn seed_users(&self) -> Vec<SeedUser>;
}
