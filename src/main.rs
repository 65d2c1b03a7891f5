use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use log::{error, info, LevelFilter};
use simplelog::{Config as LogConfig, SimpleLogger};
use std::env;
use std::sync::Arc;
use std::thread;

use visionlord::config::Config;
use visionlord::console;
use visionlord::controller::ConnectionController;
use visionlord::fixture::{FixtureManager, Registry};
use visionlord::transport::{ConnectionEvent, SerialDeviceProvider, UsbTransport};

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .context("Provide config path as first arg.")?;
    let cfg = Config::load(&config_path)?;
    let log_level = if cfg.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::init(log_level, LogConfig::default())?;

    let (send, recv) = unbounded::<ConnectionEvent>();
    thread::Builder::new()
        .name("connection-events".to_string())
        .spawn(move || {
            for event in recv {
                match event {
                    ConnectionEvent::StateChanged(state) => println!("bridge {state}"),
                    ConnectionEvent::Error(err) => println!("bridge error: {err}"),
                }
            }
        })?;

    let provider = SerialDeviceProvider::new(cfg.transport.baud_rate);
    let auto_connect = cfg.transport.auto_connect;
    let transport = UsbTransport::new(cfg.transport, Arc::new(provider), Arc::new(send));
    let fixtures = FixtureManager::new(Arc::new(Registry::builtin()));
    let mut controller = ConnectionController::new(cfg.universe, fixtures, transport);

    for fixture in cfg.fixtures {
        let id = match controller.create_fixture(
            &fixture.fixture_type,
            fixture.addr.into(),
            fixture.universe,
        ) {
            Ok(id) => id,
            Err(err) => {
                error!("Skipping {} at {}: {err}.", fixture.fixture_type, fixture.addr);
                continue;
            }
        };
        controller.update_fixture_properties(id, fixture.properties)?;
    }
    info!("Patched {} fixtures.", controller.fixtures().len());

    if auto_connect {
        match controller.connect_approved() {
            Ok(true) => (),
            Ok(false) => info!("No previously approved DMX bridge; use connect to pair."),
            Err(err) => error!("{err}."),
        }
    }

    console::run(&mut controller)?;
    controller.request_disconnect();
    Ok(())
}
