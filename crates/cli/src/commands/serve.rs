//! `deskpilot serve`: start the HTTP services.

use clap::ValueEnum;
use deskpilot_gateway::Service;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceArg {
    /// Knowledge-base Q&A (`POST /query`)
    Query,
    /// Ticket assistant (`POST /summary`, `POST /letter`)
    Tickets,
    /// Both
    All,
}

impl From<ServiceArg> for Service {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Query => Service::Query,
            ServiceArg::Tickets => Service::Tickets,
            ServiceArg::All => Service::All,
        }
    }
}

pub async fn run(
    service: ServiceArg,
    port_override: Option<u16>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path.as_deref())?;

    if let Some(port) = port_override {
        config.gateway.port = Some(port);
    }

    let service = Service::from(service);
    println!("DeskPilot");
    if service.serves_query() {
        println!("   Q&A:     {}:{}", config.gateway.host, config.query_port());
    }
    if service.serves_tickets() {
        println!("   Tickets: {}:{}", config.gateway.host, config.tickets_port());
    }
    println!("   Model:   {}", config.openai.chat_model);

    deskpilot_gateway::start(config, service).await?;

    Ok(())
}
