//! Dry-run scanner.
//!
//! Builds a simulated bus from the `[[simulation.modules]]` table of the
//! configuration file given as the first argument, then discovers every
//! known module kind on it and reports the binding and status word of each.

use std::sync::Arc;

use anyhow::{Context, Result};

use interbus::config::Config;
use interbus::devices;
use interbus::sim::SimulatedBus;
use interbus::tracing::{self, prelude::*};
use interbus::{Bus, Error};

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init_journald_or_stdout();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path).with_context(|| format!("loading {path}"))?,
        None => Config::default(),
    };

    let sim = SimulatedBus::new();
    for module in &config.simulation.modules {
        sim.add_module(module.port.clone(), module.address, module.device_type);
    }
    if config.simulation.modules.is_empty() {
        warn!("No [[simulation.modules]] configured; every kind will be reported missing.");
    }

    let bus = Bus::new(Arc::new(sim), config.discovery_config());
    for kind in devices::ALL {
        let name = kind.signature.name;
        match bus.discover(kind.signature).await {
            Ok(binding) => {
                let access = bus.access(binding);
                match access.read_status(kind.status).await {
                    Ok(flags) => info!(kind = name, module = %access.binding(), status = %flags, "Found"),
                    Err(e) => warn!(kind = name, module = %access.binding(), error = %e, "Found, status unreadable"),
                }
            }
            Err(Error::Discovery(e)) => info!(kind = name, "{e}"),
            Err(e) => error!(kind = name, error = %e, "Scan failed"),
        }
    }

    Ok(())
}
