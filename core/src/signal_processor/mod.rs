pub mod bus;
pub mod handler;
pub mod processor;
pub mod signal;


pub use bus::SignalBus;
pub use handler::SignalHandler;
pub use processor::{EventProcessor, NpcSide};
pub use signal::GameSignal;
