use crate::{
    backend::{AvailabilityLedger, IdentityStore},
    booking::BookingWorkflow,
    configuration::Configuration,
    configuration_handler::ConfigurationHandler,
    error::BookingError,
    http::create_app,
    local_identities::LocalIdentities,
    local_ledger::LocalLedger,
};
use chrono::{Local, NaiveDate};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod backend;
mod booking;
mod configuration;
mod configuration_handler;
mod error;
mod http;
mod local_identities;
mod local_ledger;
mod password;
mod schedule;
mod session;
#[cfg(test)]
mod testutils;
mod types;

/// Builds the in-memory stores: one generated schedule per provider and the
/// seed users.
fn build_workflow<C: Configuration>(
    configuration: &C,
    start: NaiveDate,
) -> Result<BookingWorkflow<LocalLedger, LocalIdentities>, BookingError> {
    let ledger = LocalLedger::default();
    let rule = configuration.schedule_rule();
    for provider in configuration.providers() {
        ledger.generate_schedule(&provider, &rule, start)?;
    }

    let identities = LocalIdentities::default();
    for user in configuration.seed_users() {
        identities.register(&user.username, &user.password)?;
    }

    Ok(BookingWorkflow::new(ledger, identities))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("#######################");
    println!("# Appointment Manager #");
    println!("#######################");

    let configuration = ConfigurationHandler::parse_arguments();
    let workflow = build_workflow(&configuration, Local::now().date_naive())?;

    let address = format!("0.0.0.0:{}", configuration.port());
    println!("Accessable at:\n{}", address);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, providers = ?workflow.providers(), "Serving appointments");

    axum::serve(listener, create_app(workflow)).await?;
    Ok(())
}
