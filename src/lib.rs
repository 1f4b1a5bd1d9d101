pub mod camera;
pub mod cli;
pub mod command;
pub mod config;
pub mod drone;
pub mod flight_log;
pub mod radio;
pub mod util;

pub use drone::DroneController;
