pub mod config;
pub mod logging;

pub use self::config::Config;
pub use logging::{init_logging, LogFormat};
