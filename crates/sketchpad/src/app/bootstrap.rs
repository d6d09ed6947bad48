use std::time::Duration;

use engine::{SessionConfig, ShellConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::demo::DemoSimulation;

const TICK_MS_ENV_VAR: &str = "SKETCHPAD_TICK_MS";

pub(crate) struct AppWiring {
    pub(crate) config: ShellConfig,
    pub(crate) boundary: DemoSimulation,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Sketchpad Startup ===");

    let config = ShellConfig {
        session: SessionConfig {
            tick_interval: tick_interval_from_env(),
            ..SessionConfig::default()
        },
        ..ShellConfig::default()
    };

    AppWiring {
        config,
        boundary: DemoSimulation::new(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn tick_interval_from_env() -> Duration {
    let default = SessionConfig::default().tick_interval;
    match std::env::var(TICK_MS_ENV_VAR) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                warn!(
                    env_var = TICK_MS_ENV_VAR,
                    value = raw.as_str(),
                    "invalid tick interval; falling back to default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
