use std::{net::SocketAddr, process, sync::Arc};

use env_logger::Env;

use snmp_sim::{
    configuration::{Configuration, Parser},
    dispatcher::Dispatcher,
    registry::AgentRegistry,
    transport::{self, SocketOptions, TransportMode},
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let conf = Configuration::parse();
    if let Err(e) = conf.validate() {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    let registry = match AgentRegistry::load(&conf.csv) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    if registry.is_empty() {
        log::warn!("No agents defined in {}", conf.csv.display());
    }

    let agents = registry.len();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), conf.profile));
    let options = SocketOptions {
        freebind: conf.freebind,
        device: conf.iface.clone(),
    };

    log::info!(
        "Starting {} agents ({} mode, {} profile)",
        agents,
        conf.mode,
        conf.profile
    );

    let _handles = match conf.mode {
        TransportMode::PerAgent => transport::spawn_per_agent(dispatcher, conf.port, &options),
        TransportMode::Shared => {
            let addr = SocketAddr::new(conf.listen_addr, conf.port);
            match transport::spawn_shared(dispatcher, addr, &options) {
                Ok(handle) => vec![handle],
                Err(e) => {
                    eprintln!("Cannot bind to address {}: {}", addr, e);
                    process::exit(1);
                }
            }
        }
    };

    println!(
        ">> Successfully initialized {} agents on port {}",
        agents, conf.port
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error: Failed to listen for shutdown signal: {}", e);
        process::exit(1);
    }

    log::info!("Shutting down");
}
