mod config;
mod error;
mod session;

pub use config::{AppConfig, AppConfigExt, OverlaySettings};
pub use error::ConfigError;
pub use session::ParsingSession;
