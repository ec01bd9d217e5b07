mod combat_event;

pub use combat_event::*;
