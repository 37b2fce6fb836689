pub mod config;
pub mod logging;

pub mod delay;
pub mod engine;
pub mod sim;
pub mod state;
pub mod transport;
