pub mod config;
pub mod console;
pub mod controller;
pub mod dmx;
pub mod fixture;
pub mod transport;
pub mod util;
