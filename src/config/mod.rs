//! Controller settings, read once at startup from the environment.
mod env;
mod options;

pub use options::ConfigError;
pub use options::ControllerConfig;
pub use options::ControllerOptions;
